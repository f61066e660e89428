// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub OAuth flow tests.
//!
//! GitHub's authorize, token and user endpoints are served by wiremock.

use axum::http::{header, Method, StatusCode};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

use common::{empty_request, send_json, send_text};

async fn mount_user(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header_eq("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": "octocat",
            "id": 1,
            "name": "The Octocat",
            "avatar_url": "https://avatars.example/octocat",
            "email": null
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_auth_url_requires_client_id() {
    let (app, _) = common::create_test_app().await;

    let (status, body) = send_json(&app, empty_request(Method::GET, "/api/auth/url")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "config_error");
    assert!(body["error"].as_str().unwrap().contains("GITHUB_CLIENT_ID"));
}

#[tokio::test]
async fn test_auth_url_contents() {
    let (app, _) =
        common::create_test_app_with(common::github_config("https://github.example")).await;

    let (status, body) = send_json(&app, empty_request(Method::GET, "/api/auth/url")).await;
    assert_eq!(status, StatusCode::OK);

    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("https://github.example/login/oauth/authorize?"));
    assert!(url.contains("client_id=test_client_id"));
    assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fapi%2Fauth%2Fcallback"));
    assert!(url.contains("scope=repo%20user"));
}

#[tokio::test]
async fn test_callback_with_error_param_never_exchanges() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (app, _) = common::create_test_app_with(common::github_config(&server.uri())).await;

    let (status, html) = send_text(
        &app,
        empty_request(
            Method::GET,
            "/api/auth/callback?error=access_denied&code=abc",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Authorization failed: access_denied"));

    let (_, auth) = send_json(&app, empty_request(Method::GET, "/api/auth/status")).await;
    assert_eq!(auth, json!({ "connected": false, "user": null }));
}

#[tokio::test]
async fn test_callback_empty_error_param_is_ignored() {
    let (app, _) = common::create_test_app().await;

    let (status, html) =
        send_text(&app, empty_request(Method::GET, "/api/auth/callback?error=")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Invalid request: No code"));
    assert!(!html.contains("Authorization failed"));
}

#[tokio::test]
async fn test_callback_empty_error_param_still_exchanges_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .and(body_partial_json(json!({ "code": "good_code" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "gho_abc" })))
        .expect(1)
        .mount(&server)
        .await;
    mount_user(&server, "gho_abc").await;

    let (app, _) = common::create_test_app_with(common::github_config(&server.uri())).await;

    let (status, html) = send_text(
        &app,
        empty_request(Method::GET, "/api/auth/callback?error=&code=good_code"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Welcome, The Octocat!"));
}

#[tokio::test]
async fn test_callback_escapes_error_param() {
    let (app, _) = common::create_test_app().await;

    let (_, html) = send_text(
        &app,
        empty_request(
            Method::GET,
            "/api/auth/callback?error=%3Cscript%3Ealert(1)%3C%2Fscript%3E",
        ),
    )
    .await;

    assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(!html.contains("<script>alert(1)"));
}

#[tokio::test]
async fn test_callback_without_code() {
    let (app, _) = common::create_test_app().await;

    let response_html = send_text(&app, empty_request(Method::GET, "/api/auth/callback")).await;
    assert_eq!(response_html.0, StatusCode::OK);
    assert!(response_html.1.contains("Invalid request: No code"));
}

#[tokio::test]
async fn test_callback_without_secret() {
    let mut config = common::github_config("http://127.0.0.1:9");
    config.github_client_secret = None;
    let (app, _) = common::create_test_app_with(config).await;

    let (_, html) = send_text(
        &app,
        empty_request(Method::GET, "/api/auth/callback?code=abc"),
    )
    .await;
    assert!(html.contains("Server configuration error"));
}

#[tokio::test]
async fn test_successful_authorization() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .and(header_eq("accept", "application/json"))
        .and(body_partial_json(json!({
            "client_id": "test_client_id",
            "client_secret": "test_client_secret",
            "code": "good_code",
            "redirect_uri": "http://localhost:3000/api/auth/callback"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "gho_abc",
            "token_type": "bearer",
            "scope": "repo,user"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_user(&server, "gho_abc").await;

    let (app, _) = common::create_test_app_with(common::github_config(&server.uri())).await;

    let response = tower::ServiceExt::oneshot(
        app.clone(),
        empty_request(Method::GET, "/api/auth/callback?code=good_code"),
    )
    .await
    .unwrap();
    let csp = response
        .headers()
        .get(header::CONTENT_SECURITY_POLICY)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(csp.contains("script-src 'unsafe-inline'"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Welcome, The Octocat!"));
    assert!(html.contains("2000"));

    let (status, auth) = send_json(&app, empty_request(Method::GET, "/api/auth/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(auth["connected"], true);
    assert_eq!(auth["user"]["login"], "octocat");
    assert_eq!(auth["user"]["avatar_url"], "https://avatars.example/octocat");
    assert!(auth.get("access_token").is_none());
}

#[tokio::test]
async fn test_reauthorization_overwrites() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "gho_new" })))
        .mount(&server)
        .await;
    mount_user(&server, "gho_new").await;

    let (app, state) = common::create_test_app_with(common::github_config(&server.uri())).await;
    common::connect_github(&state, "gho_old").await;

    send_text(&app, empty_request(Method::GET, "/api/auth/callback?code=x")).await;

    let auth = state.github.auth_state().await.unwrap();
    assert_eq!(auth.token(), Some("gho_new"));
}

#[tokio::test]
async fn test_token_endpoint_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired."
        })))
        .mount(&server)
        .await;

    let (app, _) = common::create_test_app_with(common::github_config(&server.uri())).await;

    let (status, html) = send_text(
        &app,
        empty_request(Method::GET, "/api/auth/callback?code=stale"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Connection Error"));
    assert!(html.contains("The code passed is incorrect or expired."));

    let (_, auth) = send_json(&app, empty_request(Method::GET, "/api/auth/status")).await;
    assert_eq!(auth["connected"], false);
}

#[tokio::test]
async fn test_token_response_without_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token_type": "bearer" })))
        .mount(&server)
        .await;

    let (app, _) = common::create_test_app_with(common::github_config(&server.uri())).await;

    let (_, html) = send_text(&app, empty_request(Method::GET, "/api/auth/callback?code=x")).await;
    assert!(html.contains("No access token received"));
}

#[tokio::test]
async fn test_unreachable_github_renders_network_error() {
    // Nothing listens on port 1
    let (app, _) =
        common::create_test_app_with(common::github_config("http://127.0.0.1:1")).await;

    let (status, html) = send_text(
        &app,
        empty_request(Method::GET, "/api/auth/callback?code=abc"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Connection Error"));
    assert!(html.contains("Possible solutions"));
    assert!(html.contains("10000"));
}

#[tokio::test]
async fn test_slow_token_endpoint_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "gho_late" }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let mut config = common::github_config(&server.uri());
    config.http_timeout = Duration::from_millis(300);
    let (app, state) = common::create_test_app_with(config).await;

    let (_, html) = send_text(&app, empty_request(Method::GET, "/api/auth/callback?code=abc")).await;
    assert!(html.contains("Request timed out"));
    assert!(!state.github.auth_state().await.unwrap().is_connected());
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let (app, state) = common::create_test_app().await;
    common::connect_github(&state, "gho_abc").await;

    let (_, auth) = send_json(&app, empty_request(Method::GET, "/api/auth/status")).await;
    assert_eq!(auth["connected"], true);

    for _ in 0..2 {
        let (status, body) =
            send_json(&app, empty_request(Method::DELETE, "/api/auth/disconnect")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    let (_, auth) = send_json(&app, empty_request(Method::GET, "/api/auth/status")).await;
    assert_eq!(auth, json!({ "connected": false, "user": null }));
}
