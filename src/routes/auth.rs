// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub OAuth and repository metadata routes.

use axum::{
    extract::{Query, State},
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{AggregateReport, RepoDetail, RepoSummary};
use crate::routes::pages;
use crate::routes::ValidatedJson;
use crate::services::AuthStatus;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/url", get(auth_url))
        .route("/api/auth/callback", get(auth_callback))
        .route("/api/auth/status", get(auth_status))
        .route("/api/auth/disconnect", delete(disconnect))
        .route("/api/auth/search-repos", get(search_repos))
        .route("/api/auth/fetch-repo", post(fetch_repo))
        .route("/api/auth/fetch-repos", post(fetch_repos))
}

// ─── OAuth Flow ──────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthUrlResponse {
    pub url: String,
}

/// Consent-screen URL for the UI to open in a popup.
async fn auth_url(State(state): State<Arc<AppState>>) -> Result<Json<AuthUrlResponse>> {
    let url = state.github.authorization_url()?;
    Ok(Json(AuthUrlResponse { url }))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange the code and render a page for the popup.
///
/// Always answers with HTML; failures are rendered, never propagated.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    if let Some(error) = params.error.filter(|e| !e.is_empty()) {
        tracing::warn!(error = %error, "OAuth error from GitHub");
        return pages::failure(&format!("Authorization failed: {}", error));
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        tracing::warn!("OAuth callback without a code");
        return pages::failure("Invalid request: No code");
    };

    match state.github.handle_oauth_callback(&code).await {
        Ok(profile) => pages::success(profile.display_name()),
        Err(AppError::Config(msg)) => {
            tracing::error!(error = %msg, "OAuth callback without configured credentials");
            pages::failure("Server configuration error")
        }
        Err(e) => {
            tracing::error!(error = %e, "OAuth code exchange failed");
            pages::connection_error(&e)
        }
    }
}

/// Whether a GitHub account is connected, and which one.
async fn auth_status(State(state): State<Arc<AppState>>) -> Result<Json<AuthStatus>> {
    Ok(Json(state.github.status().await?))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DisconnectResponse {
    pub success: bool,
    pub message: String,
}

/// Forget the stored token and profile.
async fn disconnect(State(state): State<Arc<AppState>>) -> Result<Json<DisconnectResponse>> {
    state.github.disconnect().await?;
    Ok(Json(DisconnectResponse {
        success: true,
        message: "GitHub disconnected".to_string(),
    }))
}

// ─── Repository Metadata ─────────────────────────────────────

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SearchReposResponse {
    pub repos: Vec<RepoSummary>,
}

/// The connected user's repositories matching `q`.
async fn search_repos(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchReposResponse>> {
    let repos = state.github.search_repositories(params.q.as_deref()).await?;
    Ok(Json(SearchReposResponse { repos }))
}

#[derive(Deserialize, Validate)]
pub struct FetchRepoRequest {
    #[validate(length(min = 1, message = "url is required"))]
    url: String,
}

/// Metadata and commit statistics for one repository.
async fn fetch_repo(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<FetchRepoRequest>,
) -> Result<Json<RepoDetail>> {
    Ok(Json(state.github.fetch_repository(body.url.trim()).await?))
}

#[derive(Deserialize, Validate)]
pub struct FetchReposRequest {
    #[validate(length(min = 1, message = "urls must not be empty"))]
    urls: Vec<String>,
}

/// Fetch several repositories and aggregate their statistics.
///
/// Individual failures are reported in the body; the request itself only
/// fails on bad input or a store error.
async fn fetch_repos(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<FetchReposRequest>,
) -> Result<Json<AggregateReport>> {
    let urls = normalize_urls(body.urls);
    if urls.is_empty() {
        return Err(AppError::Validation("urls must not be empty".to_string()));
    }
    Ok(Json(state.github.fetch_repositories(&urls).await?))
}

/// Trim each URL and drop blanks.
pub(crate) fn normalize_urls(urls: Vec<String>) -> Vec<String> {
    urls.into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect()
}
