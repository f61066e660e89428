// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Projects (CRUD with partial-patch updates)
//! - Settings (opaque key/value rows)

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteExecutor, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::SqlitePool;

use crate::db::tables;
use crate::error::AppError;
use crate::models::{NewProject, Project, ProjectPatch};
use crate::time_utils::{now_timestamp, timestamp_after};

const SCHEMA: &str = include_str!("schema.sql");

const PROJECT_COLUMNS: &str = "id, name, description, icon_light, icon_dark, images, tech_stack, \
     github_repos, project_link, github_stats, start_date, created_at, updated_at";

/// SQLite database client.
#[derive(Clone)]
pub struct SqliteDb {
    pool: SqlitePool,
}

impl SqliteDb {
    /// Open (creating if needed) the database file and apply the schema.
    ///
    /// `:memory:` opens a private in-memory database instead.
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if path.as_os_str() == ":memory:" {
            return Self::new_in_memory().await;
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::Database(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        tracing::info!(path = %path.display(), "Connected to SQLite");

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Private in-memory database for tests.
    ///
    /// A single connection that never expires, since each SQLite in-memory
    /// connection is its own database.
    pub async fn new_in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(db_err)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(db_err)?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Apply the embedded schema. Safe to run repeatedly.
    pub async fn migrate(&self) -> Result<(), AppError> {
        for statement in SCHEMA.split(';') {
            let sql: String = statement
                .lines()
                .filter(|line| !line.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n");
            let sql = sql.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql).execute(&self.pool).await.map_err(db_err)?;
        }
        Ok(())
    }

    // ─── Project Operations ──────────────────────────────────────

    /// All projects, oldest first.
    pub async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY id",
            PROJECT_COLUMNS,
            tables::PROJECTS
        );
        let rows: Vec<ProjectRow> = sqlx::query_as::<_, ProjectRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.into_iter().map(Project::try_from).collect()
    }

    /// Get a project by ID.
    pub async fn get_project(&self, id: i64) -> Result<Option<Project>, AppError> {
        fetch_project(&self.pool, id).await
    }

    /// Insert a project; the store assigns the ID.
    pub async fn create_project(&self, input: NewProject) -> Result<Project, AppError> {
        let now = now_timestamp();
        let mut project = input.into_project(&now)?;
        let json = JsonColumns::encode(&project)?;

        let sql = format!(
            "INSERT INTO {} (name, description, icon_light, icon_dark, images, tech_stack, \
             github_repos, project_link, github_stats, start_date, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            tables::PROJECTS
        );
        let result = sqlx::query(&sql)
            .bind(&project.name)
            .bind(&project.description)
            .bind(&project.icon_light)
            .bind(&project.icon_dark)
            .bind(&json.images)
            .bind(&json.tech_stack)
            .bind(&json.github_repos)
            .bind(&project.project_link)
            .bind(&json.github_stats)
            .bind(&project.start_date)
            .bind(&project.created_at)
            .bind(&project.updated_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        project.id = result.last_insert_rowid();
        tracing::debug!(project_id = project.id, name = %project.name, "Project created");
        Ok(project)
    }

    /// Apply a partial update. Returns `None` if the project does not exist.
    ///
    /// The read, merge and write happen in one transaction, and the new
    /// `updated_at` is always strictly later than the stored one.
    pub async fn update_project(
        &self,
        id: i64,
        patch: ProjectPatch,
    ) -> Result<Option<Project>, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let Some(mut project) = fetch_project(&mut *tx, id).await? else {
            return Ok(None);
        };

        patch.apply_to(&mut project)?;
        project.updated_at = timestamp_after(&project.updated_at);
        let json = JsonColumns::encode(&project)?;

        let sql = format!(
            "UPDATE {} SET name = ?, description = ?, icon_light = ?, icon_dark = ?, \
             images = ?, tech_stack = ?, github_repos = ?, project_link = ?, \
             github_stats = ?, start_date = ?, updated_at = ? WHERE id = ?",
            tables::PROJECTS
        );
        sqlx::query(&sql)
            .bind(&project.name)
            .bind(&project.description)
            .bind(&project.icon_light)
            .bind(&project.icon_dark)
            .bind(&json.images)
            .bind(&json.tech_stack)
            .bind(&json.github_repos)
            .bind(&project.project_link)
            .bind(&json.github_stats)
            .bind(&project.start_date)
            .bind(&project.updated_at)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        tracing::debug!(project_id = id, "Project updated");
        Ok(Some(project))
    }

    /// Hard delete. Returns whether a row was removed.
    pub async fn delete_project(&self, id: i64) -> Result<bool, AppError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", tables::PROJECTS);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    // ─── Setting Operations ──────────────────────────────────────

    /// Get a setting value by key.
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>, AppError> {
        let sql = format!("SELECT value FROM {} WHERE key = ?", tables::SETTINGS);
        sqlx::query_scalar::<_, String>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    /// Insert or overwrite a setting.
    pub async fn upsert_setting(&self, key: &str, value: &str) -> Result<(), AppError> {
        upsert_setting_with(&self.pool, key, value, &now_timestamp()).await
    }

    /// Insert or overwrite several settings atomically.
    pub async fn upsert_settings(&self, entries: &[(&str, &str)]) -> Result<(), AppError> {
        let now = now_timestamp();
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for (key, value) in entries {
            upsert_setting_with(&mut *tx, key, value, &now).await?;
        }
        tx.commit().await.map_err(db_err)
    }

    /// Delete a setting. Missing keys are not an error.
    pub async fn delete_setting(&self, key: &str) -> Result<(), AppError> {
        delete_setting_with(&self.pool, key).await
    }

    /// Delete several settings atomically.
    pub async fn delete_settings(&self, keys: &[&str]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for key in keys {
            delete_setting_with(&mut *tx, key).await?;
        }
        tx.commit().await.map_err(db_err)
    }
}

async fn fetch_project<'e, E>(executor: E, id: i64) -> Result<Option<Project>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ?",
        PROJECT_COLUMNS,
        tables::PROJECTS
    );
    let row: Option<ProjectRow> = sqlx::query_as::<_, ProjectRow>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(db_err)?;

    row.map(Project::try_from).transpose()
}

async fn upsert_setting_with<'e, E>(
    executor: E,
    key: &str,
    value: &str,
    now: &str,
) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        "INSERT INTO {} (key, value, created_at, updated_at) VALUES (?, ?, ?, ?) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        tables::SETTINGS
    );
    sqlx::query(&sql)
        .bind(key)
        .bind(value)
        .bind(now)
        .bind(now)
        .execute(executor)
        .await
        .map_err(db_err)?;
    Ok(())
}

async fn delete_setting_with<'e, E>(executor: E, key: &str) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("DELETE FROM {} WHERE key = ?", tables::SETTINGS);
    sqlx::query(&sql)
        .bind(key)
        .execute(executor)
        .await
        .map_err(db_err)?;
    Ok(())
}

fn db_err(e: sqlx::Error) -> AppError {
    AppError::Database(e.to_string())
}

/// Raw `projects` row; list and object columns hold JSON text.
#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: i64,
    name: String,
    description: Option<String>,
    icon_light: Option<String>,
    icon_dark: Option<String>,
    images: Option<String>,
    tech_stack: Option<String>,
    github_repos: Option<String>,
    project_link: Option<String>,
    github_stats: Option<String>,
    start_date: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ProjectRow> for Project {
    type Error = AppError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(Project {
            id: row.id,
            name: row.name,
            description: row.description,
            icon_light: row.icon_light,
            icon_dark: row.icon_dark,
            images: decode_json("images", row.images)?,
            tech_stack: decode_json("tech_stack", row.tech_stack)?,
            github_repos: decode_json("github_repos", row.github_repos)?,
            project_link: row.project_link,
            github_stats: decode_json("github_stats", row.github_stats)?,
            start_date: row.start_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// JSON-encoded values for the non-scalar project columns.
struct JsonColumns {
    images: Option<String>,
    tech_stack: Option<String>,
    github_repos: Option<String>,
    github_stats: Option<String>,
}

impl JsonColumns {
    fn encode(project: &Project) -> Result<Self, AppError> {
        Ok(Self {
            images: encode_json(&project.images)?,
            tech_stack: encode_json(&project.tech_stack)?,
            github_repos: encode_json(&project.github_repos)?,
            github_stats: encode_json(&project.github_stats)?,
        })
    }
}

fn encode_json<T: Serialize>(value: &Option<T>) -> Result<Option<String>, AppError> {
    value
        .as_ref()
        .map(|v| {
            serde_json::to_string(v)
                .map_err(|e| AppError::Internal(anyhow::anyhow!("JSON encode failed: {}", e)))
        })
        .transpose()
}

fn decode_json<T: DeserializeOwned>(
    column: &str,
    raw: Option<String>,
) -> Result<Option<T>, AppError> {
    raw.map(|text| {
        serde_json::from_str(&text)
            .map_err(|e| AppError::Database(format!("Corrupt {} column: {}", column, e)))
    })
    .transpose()
}
