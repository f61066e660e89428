// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub connection state and its persistence.
//!
//! The access token and the cached profile are stored as two settings rows.
//! Only [`AuthStore`] knows their keys; everything else works with
//! [`AuthState`].

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::SqliteDb;
use crate::error::AppError;
use crate::models::GitHubProfile;

const TOKEN_KEY: &str = "github_token";
const PROFILE_KEY: &str = "github_user";

/// Snapshot of the GitHub connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    access_token: Option<String>,
    profile: Option<GitHubProfile>,
}

impl AuthState {
    /// Connected iff a non-empty token is stored.
    pub fn is_connected(&self) -> bool {
        self.token().is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn profile(&self) -> Option<&GitHubProfile> {
        self.profile.as_ref()
    }

    /// Externally visible status; the profile is only reported when connected.
    pub fn status(&self) -> AuthStatus {
        let connected = self.is_connected();
        AuthStatus {
            connected,
            user: if connected { self.profile.clone() } else { None },
        }
    }
}

/// Response body for the connection status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthStatus {
    pub connected: bool,
    pub user: Option<GitHubProfile>,
}

/// Reads and writes [`AuthState`] through the settings table.
#[derive(Clone)]
pub struct AuthStore {
    db: SqliteDb,
}

impl AuthStore {
    pub fn new(db: SqliteDb) -> Self {
        Self { db }
    }

    /// Load the current connection state.
    ///
    /// An unreadable profile snapshot is logged and treated as absent; the
    /// token alone still counts as connected.
    pub async fn load(&self) -> Result<AuthState, AppError> {
        let access_token = self.db.get_setting(TOKEN_KEY).await?;
        let profile = match self.db.get_setting(PROFILE_KEY).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring unreadable cached GitHub profile");
                    None
                }
            },
            None => None,
        };

        Ok(AuthState {
            access_token,
            profile,
        })
    }

    /// The stored token, if connected.
    pub async fn access_token(&self) -> Result<Option<String>, AppError> {
        Ok(self
            .db
            .get_setting(TOKEN_KEY)
            .await?
            .filter(|t| !t.is_empty()))
    }

    /// Persist a fresh authorization, replacing any previous one.
    pub async fn save(&self, token: &str, profile: &GitHubProfile) -> Result<AuthState, AppError> {
        let profile_json = serde_json::to_string(profile)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Profile encode failed: {}", e)))?;

        self.db
            .upsert_settings(&[(TOKEN_KEY, token), (PROFILE_KEY, profile_json.as_str())])
            .await?;

        tracing::info!(login = %profile.login, "GitHub authorization stored");

        Ok(AuthState {
            access_token: Some(token.to_string()),
            profile: Some(profile.clone()),
        })
    }

    /// Forget the token and profile. Succeeds when nothing is stored.
    pub async fn clear(&self) -> Result<(), AppError> {
        self.db.delete_settings(&[TOKEN_KEY, PROFILE_KEY]).await?;
        tracing::info!("GitHub authorization cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> GitHubProfile {
        GitHubProfile {
            login: "octocat".to_string(),
            name: Some("The Octocat".to_string()),
            avatar_url: Some("https://avatars.example/octocat".to_string()),
            email: None,
        }
    }

    async fn store() -> AuthStore {
        AuthStore::new(SqliteDb::new_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_initially_unauthorized() {
        let state = store().await.load().await.unwrap();
        assert!(!state.is_connected());
        assert_eq!(
            state.status(),
            AuthStatus {
                connected: false,
                user: None
            }
        );
    }

    #[tokio::test]
    async fn test_save_then_clear() {
        let store = store().await;
        store.save("gho_first", &profile()).await.unwrap();
        store.save("gho_second", &profile()).await.unwrap();

        let state = store.load().await.unwrap();
        assert_eq!(state.token(), Some("gho_second"));
        assert_eq!(state.status().user, Some(profile()));

        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), AuthState::default());
    }

    #[tokio::test]
    async fn test_empty_token_is_not_connected() {
        let db = SqliteDb::new_in_memory().await.unwrap();
        db.upsert_setting(TOKEN_KEY, "").await.unwrap();
        db.upsert_setting(PROFILE_KEY, "{not json").await.unwrap();

        let store = AuthStore::new(db);
        let state = store.load().await.unwrap();
        assert!(!state.is_connected());
        assert!(state.profile().is_none());
        assert_eq!(store.access_token().await.unwrap(), None);
    }
}
