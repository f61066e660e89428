// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Project CRUD routes.

use crate::error::{AppError, Result};
use crate::models::{NewProject, Project, ProjectPatch, RepoFailure};
use crate::routes::auth::normalize_urls;
use crate::routes::ValidatedJson;
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Path, State},
    http::request::Parts,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/api/projects/{id}/refresh-stats", post(refresh_stats))
}

// ─── Responses ───────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProjectListResponse {
    pub projects: Vec<Project>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProjectResponse {
    pub project: Project,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteProjectResponse {
    pub success: bool,
    /// False when no project had this id.
    pub deleted: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RefreshStatsResponse {
    pub project: Project,
    pub failures: Vec<RepoFailure>,
    pub partial: bool,
    pub maybe_private: bool,
}

/// `{id}` path segment. A non-numeric id is rejected with the JSON error body
/// rather than axum's plain-text rejection.
pub struct ProjectId(pub i64);

impl<S> FromRequestParts<S> for ProjectId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        raw.parse()
            .map(ProjectId)
            .map_err(|_| AppError::Validation(format!("Invalid project id: {}", raw)))
    }
}

// ─── Handlers ────────────────────────────────────────────────

async fn list_projects(State(state): State<Arc<AppState>>) -> Result<Json<ProjectListResponse>> {
    let projects = state.db.list_projects().await?;
    Ok(Json(ProjectListResponse { projects }))
}

async fn get_project(
    State(state): State<Arc<AppState>>,
    ProjectId(id): ProjectId,
) -> Result<Json<ProjectResponse>> {
    let project = state
        .db
        .get_project(id)
        .await?
        .ok_or_else(|| project_not_found(id))?;
    Ok(Json(ProjectResponse { project }))
}

async fn create_project(
    State(state): State<Arc<AppState>>,
    ValidatedJson(patch): ValidatedJson<ProjectPatch>,
) -> Result<Json<ProjectResponse>> {
    let project = state.db.create_project(NewProject::new(patch)?).await?;
    tracing::info!(project_id = project.id, name = %project.name, "Project created");
    Ok(Json(ProjectResponse { project }))
}

/// Partial update: only the fields present in the body are written.
async fn update_project(
    State(state): State<Arc<AppState>>,
    ProjectId(id): ProjectId,
    ValidatedJson(patch): ValidatedJson<ProjectPatch>,
) -> Result<Json<ProjectResponse>> {
    if patch.is_empty() {
        tracing::debug!(project_id = id, "Empty update, touching updatedAt only");
    }

    let project = state
        .db
        .update_project(id, patch)
        .await?
        .ok_or_else(|| project_not_found(id))?;
    tracing::info!(project_id = id, "Project updated");
    Ok(Json(ProjectResponse { project }))
}

/// Hard delete. Deleting an unknown id succeeds with `deleted: false`.
async fn delete_project(
    State(state): State<Arc<AppState>>,
    ProjectId(id): ProjectId,
) -> Result<Json<DeleteProjectResponse>> {
    let deleted = state.db.delete_project(id).await?;
    if deleted {
        tracing::info!(project_id = id, "Project deleted");
    } else {
        tracing::debug!(project_id = id, "Delete of unknown project");
    }
    Ok(Json(DeleteProjectResponse {
        success: true,
        deleted,
    }))
}

/// Re-fetch the project's linked repositories and cache the aggregate.
///
/// Stored stats are left untouched when every repository fails.
async fn refresh_stats(
    State(state): State<Arc<AppState>>,
    ProjectId(id): ProjectId,
) -> Result<Json<RefreshStatsResponse>> {
    let project = state
        .db
        .get_project(id)
        .await?
        .ok_or_else(|| project_not_found(id))?;

    let urls = normalize_urls(project.github_repos.clone().unwrap_or_default());
    if urls.is_empty() {
        return Err(AppError::Validation(
            "Project has no linked GitHub repositories".to_string(),
        ));
    }

    let report = state.github.fetch_repositories(&urls).await?;

    let project = match report.stats {
        Some(stats) => {
            let patch = ProjectPatch {
                github_stats: Some(stats),
                ..Default::default()
            };
            state
                .db
                .update_project(id, patch)
                .await?
                .ok_or_else(|| project_not_found(id))?
        }
        None => project,
    };

    tracing::info!(
        project_id = id,
        repos = urls.len(),
        failed = report.failures.len(),
        "Repository stats refreshed"
    );

    Ok(Json(RefreshStatsResponse {
        project,
        failures: report.failures,
        partial: report.partial,
        maybe_private: report.maybe_private,
    }))
}

fn project_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Project {} not found", id))
}
