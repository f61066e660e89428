//! Application configuration loaded from environment variables.
//!
//! GitHub OAuth credentials are optional: without them the app still manages
//! projects, and the authorization endpoints report a configuration error.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

/// Callback address registered with the GitHub OAuth app.
pub const OAUTH_CALLBACK_URL: &str = "http://localhost:3000/api/auth/callback";

/// Scopes requested during authorization (repos incl. private, user profile).
pub const OAUTH_SCOPE: &str = "repo user";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GitHub OAuth client ID (public)
    pub github_client_id: Option<String>,
    /// GitHub OAuth client secret
    pub github_client_secret: Option<String>,
    /// Base URL of the GitHub REST API
    pub github_api_url: String,
    /// Base URL for the OAuth authorize and token endpoints
    pub github_oauth_url: String,
    /// SQLite database file
    pub database_path: PathBuf,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Overall timeout for each outbound HTTP request
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            Err(_) => DEFAULT_PORT,
        };

        let http_timeout_secs = match env::var("HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("HTTP_TIMEOUT_SECS", raw))?,
            Err(_) => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            github_client_id: non_empty_var("GITHUB_CLIENT_ID"),
            github_client_secret: non_empty_var("GITHUB_CLIENT_SECRET"),
            github_api_url: env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| "https://api.github.com".to_string()),
            github_oauth_url: env::var("GITHUB_OAUTH_URL")
                .unwrap_or_else(|_| "https://github.com".to_string()),
            database_path: non_empty_var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_database_path),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port,
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }

    /// Config for tests: no OAuth credentials, GitHub pointed at localhost.
    pub fn test_default() -> Self {
        Self {
            github_client_id: None,
            github_client_secret: None,
            github_api_url: "http://127.0.0.1:9".to_string(),
            github_oauth_url: "http://127.0.0.1:9".to_string(),
            database_path: PathBuf::from(":memory:"),
            frontend_url: "http://localhost:5173".to_string(),
            port: DEFAULT_PORT,
            http_timeout: Duration::from_secs(5),
        }
    }

    /// Both OAuth credentials, or a user-visible configuration error.
    pub fn oauth_credentials(&self) -> Result<(&str, &str), AppError> {
        match (&self.github_client_id, &self.github_client_secret) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(AppError::Config(
                "GitHub OAuth is not configured. Please set GITHUB_CLIENT_ID and GITHUB_CLIENT_SECRET environment variables.".to_string(),
            )),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `<data dir>/project-tracker/projects.db`, or `data/projects.db` when the
/// platform has no data directory.
fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("project-tracker"))
        .unwrap_or_else(|| PathBuf::from("data"))
        .join("projects.db")
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1:?}")]
    Invalid(&'static str, String),
}
