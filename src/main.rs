// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Project Tracker API Server
//!
//! Stores personal projects in a local SQLite file and enriches them with
//! repository metadata from GitHub.

use project_tracker::{config::Config, db::SqliteDb, services::GitHubService, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Structured JSON logging unless LOG_FORMAT=pretty
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Project Tracker API");

    if config.github_client_id.is_none() || config.github_client_secret.is_none() {
        tracing::warn!("GitHub OAuth credentials not set; GitHub connection is unavailable");
    }

    let db = SqliteDb::connect(&config.database_path).await?;
    tracing::info!(path = %config.database_path.display(), "Database ready");

    let github = GitHubService::new(&config, db.clone())?;

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        github,
    });

    let app = project_tracker::routes::create_router(state);

    // Local desktop backend: loopback only
    let addr = format!("127.0.0.1:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

/// Initialize logging: JSON by default, human-readable with LOG_FORMAT=pretty.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        .add_directive("project_tracker=debug".parse()?);

    let pretty = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("pretty"));

    if pretty {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .init();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
