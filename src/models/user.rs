//! GitHub account snapshot cached after authorization.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Normalized profile of the authorized GitHub user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GitHubProfile {
    /// GitHub login (username)
    pub login: String,
    /// Display name, if set
    pub name: Option<String>,
    /// Avatar image URL
    pub avatar_url: Option<String>,
    /// Public email (may be None if not shared)
    pub email: Option<String>,
}

impl GitHubProfile {
    /// Name to greet the user with.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.login)
    }
}
