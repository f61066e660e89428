// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Project model, create input, and partial-update patch.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::error::AppError;

/// A tracked project as stored and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Project {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Remote URL or data URL
    pub icon_light: Option<String>,
    pub icon_dark: Option<String>,
    /// Screenshots, in display order
    pub images: Option<Vec<String>>,
    /// Technology tags; unknown tags are kept as-is
    pub tech_stack: Option<Vec<String>>,
    pub github_repos: Option<Vec<String>>,
    pub project_link: Option<String>,
    /// Cached aggregate, refreshed explicitly by the client
    pub github_stats: Option<GithubStats>,
    pub start_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Aggregated repository statistics cached on a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GithubStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_issues: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<String>,
    /// Comma-separated languages across all linked repositories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
}

/// Every project attribute, each optional.
///
/// Used as the request body for both create and update: on update only the
/// supplied fields are written.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon_light: Option<String>,
    pub icon_dark: Option<String>,
    pub images: Option<Vec<String>>,
    pub tech_stack: Option<Vec<String>>,
    pub github_repos: Option<Vec<String>>,
    /// Legacy single-repository field; ignored when `githubRepos` is present.
    pub github_repo: Option<String>,
    pub project_link: Option<String>,
    pub github_stats: Option<GithubStats>,
    pub start_date: Option<String>,
}

impl ProjectPatch {
    /// True if no field is supplied.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.icon_light.is_none()
            && self.icon_dark.is_none()
            && self.images.is_none()
            && self.tech_stack.is_none()
            && self.github_repos.is_none()
            && self.github_repo.is_none()
            && self.project_link.is_none()
            && self.github_stats.is_none()
            && self.start_date.is_none()
    }

    /// Overwrite the supplied fields of `project`; leave the rest untouched.
    pub fn apply_to(self, project: &mut Project) -> Result<(), AppError> {
        let repos = self.normalized_repos();

        if let Some(name) = self.name {
            project.name = required_name(name)?;
        }
        if let Some(description) = self.description {
            project.description = Some(description);
        }
        if let Some(icon) = self.icon_light {
            project.icon_light = Some(icon);
        }
        if let Some(icon) = self.icon_dark {
            project.icon_dark = Some(icon);
        }
        if let Some(images) = self.images {
            project.images = Some(images);
        }
        if let Some(tech_stack) = self.tech_stack {
            project.tech_stack = Some(tech_stack);
        }
        if let Some(repos) = repos {
            project.github_repos = Some(repos);
        }
        if let Some(link) = self.project_link {
            project.project_link = Some(link);
        }
        if let Some(stats) = self.github_stats {
            project.github_stats = Some(stats);
        }
        if let Some(start_date) = self.start_date {
            project.start_date = Some(start_date);
        }
        Ok(())
    }

    /// Repository list with blank entries dropped, honoring the legacy field.
    fn normalized_repos(&self) -> Option<Vec<String>> {
        let raw = match (&self.github_repos, &self.github_repo) {
            (Some(list), _) => list.clone(),
            (None, Some(single)) => vec![single.clone()],
            (None, None) => return None,
        };

        Some(
            raw.into_iter()
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .collect(),
        )
    }
}

/// Validated input for creating a project: a patch that carries a name.
#[derive(Debug, Clone)]
pub struct NewProject {
    name: String,
    fields: ProjectPatch,
}

impl NewProject {
    pub fn new(mut fields: ProjectPatch) -> Result<Self, AppError> {
        let name = fields
            .name
            .take()
            .ok_or_else(|| AppError::Validation("name is required".to_string()))?;

        Ok(Self {
            name: required_name(name)?,
            fields,
        })
    }

    /// Build the full record for insertion; the store assigns the id.
    pub fn into_project(self, now: &str) -> Result<Project, AppError> {
        let mut project = Project {
            id: 0,
            name: self.name,
            description: None,
            icon_light: None,
            icon_dark: None,
            images: None,
            tech_stack: None,
            github_repos: None,
            project_link: None,
            github_stats: None,
            start_date: None,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        };
        self.fields.apply_to(&mut project)?;
        Ok(project)
    }
}

fn required_name(name: String) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}
