// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use project_tracker::config::Config;
use project_tracker::db::SqliteDb;
use project_tracker::models::GitHubProfile;
use project_tracker::routes::create_router;
use project_tracker::services::{AuthStore, GitHubService};
use project_tracker::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Config with OAuth credentials, GitHub pointed at a mock server.
#[allow(dead_code)]
pub fn github_config(base_url: &str) -> Config {
    let mut config = Config::test_default();
    config.github_client_id = Some("test_client_id".to_string());
    config.github_client_secret = Some("test_client_secret".to_string());
    config.github_api_url = base_url.to_string();
    config.github_oauth_url = base_url.to_string();
    config
}

/// Create a test app backed by a fresh in-memory database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with(Config::test_default()).await
}

#[allow(dead_code)]
pub async fn create_test_app_with(config: Config) -> (Router, Arc<AppState>) {
    let db = SqliteDb::new_in_memory()
        .await
        .expect("Failed to open in-memory database");
    let github = GitHubService::new(&config, db.clone()).expect("Failed to build GitHub client");

    let state = Arc::new(AppState { config, db, github });

    (create_router(state.clone()), state)
}

/// Store a GitHub authorization as if the OAuth flow had completed.
#[allow(dead_code)]
pub async fn connect_github(state: &AppState, token: &str) {
    let profile = GitHubProfile {
        login: "octocat".to_string(),
        name: Some("The Octocat".to_string()),
        avatar_url: None,
        email: None,
    };
    AuthStore::new(state.db.clone())
        .save(token, &profile)
        .await
        .expect("Failed to store authorization");
}

#[allow(dead_code)]
pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Send a request and decode the JSON response body.
#[allow(dead_code)]
pub async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Send a request and return the response body as text.
#[allow(dead_code)]
pub async fn send_text(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Repository body as returned by `GET /repos/{owner}/{repo}`.
#[allow(dead_code)]
pub fn repo_json(name: &str, language: Option<&str>, stars: u32) -> Value {
    serde_json::json!({
        "name": name,
        "description": format!("{} description", name),
        "stargazers_count": stars,
        "forks_count": 2,
        "open_issues_count": 1,
        "language": language,
        "default_branch": "main",
        "updated_at": "2025-06-01T12:00:00Z",
        "html_url": format!("https://github.com/acme/{}", name),
        "private": false
    })
}

/// Single-item commit listing.
#[allow(dead_code)]
pub fn commits_json(date: &str) -> Value {
    serde_json::json!([{
        "sha": "0123456789abcdef",
        "commit": {
            "author": { "name": "Octo", "date": date },
            "committer": { "name": "Octo", "date": date }
        }
    }])
}
