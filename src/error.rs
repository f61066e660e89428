// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Config(String),

    #[error("Not authenticated. Please connect your GitHub account first.")]
    Unauthenticated,

    #[error("GitHub API error {status}: {message}")]
    RemoteApi { status: u16, message: String },

    #[error("GitHub authorization failed: {0}")]
    AuthorizationRejected(String),

    #[error("Malformed GitHub response: {0}")]
    MalformedResponse(String),

    #[error("{}: {message}", kind.title())]
    Network {
        kind: NetworkErrorKind,
        message: String,
    },

    #[error("Invalid GitHub URL: {0}")]
    InvalidUrl(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Coarse cause of a transport failure while talking to GitHub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    RequestTimeout,
    ConnectionTimeout,
    Network,
}

impl NetworkErrorKind {
    pub fn title(self) -> &'static str {
        match self {
            NetworkErrorKind::RequestTimeout => "Request timed out",
            NetworkErrorKind::ConnectionTimeout => "Connection timeout",
            NetworkErrorKind::Network => "Network error",
        }
    }

    /// Remediation hint shown to the user.
    pub fn help(self) -> &'static str {
        match self {
            NetworkErrorKind::RequestTimeout => {
                "Could not connect to GitHub. This might be due to network/firewall issues."
            }
            NetworkErrorKind::ConnectionTimeout => {
                "Cannot reach GitHub servers. Please check your network connection and firewall settings."
            }
            NetworkErrorKind::Network => {
                "Cannot connect to GitHub. If you're behind a proxy, you may need to configure the HTTP_PROXY environment variable."
            }
        }
    }
}

impl AppError {
    /// Map a reqwest failure onto the error taxonomy.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return AppError::MalformedResponse(err.to_string());
        }

        let kind = if err.is_connect() && err.is_timeout() {
            NetworkErrorKind::ConnectionTimeout
        } else if err.is_timeout() {
            NetworkErrorKind::RequestTimeout
        } else {
            NetworkErrorKind::Network
        };

        AppError::Network {
            kind,
            message: err.without_url().to_string(),
        }
    }

    /// True if GitHub answered 404, which for anonymous requests usually
    /// means the repository is private.
    pub fn is_remote_not_found(&self) -> bool {
        matches!(self, AppError::RemoteApi { status: 404, .. })
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Config(_) => "config_error",
            AppError::Unauthenticated => "unauthenticated",
            AppError::RemoteApi { .. } => "remote_api_error",
            AppError::AuthorizationRejected(_) => "authorization_rejected",
            AppError::MalformedResponse(_) => "malformed_response",
            AppError::Network { .. } => "network_error",
            AppError::InvalidUrl(_) => "invalid_url",
            AppError::Database(_) => "database_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::RemoteApi { .. }
            | AppError::AuthorizationRejected(_)
            | AppError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            AppError::Network { kind, .. } => match kind {
                NetworkErrorKind::Network => StatusCode::BAD_GATEWAY,
                _ => StatusCode::GATEWAY_TIMEOUT,
            },
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error = match &self {
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                "Internal server error".to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                "Internal server error".to_string()
            }
            AppError::RemoteApi { .. } | AppError::Network { .. } => {
                tracing::warn!(error = %self, "GitHub request failed");
                self.to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error,
            code: self.code(),
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
