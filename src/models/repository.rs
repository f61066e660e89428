// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Repository shapes returned by the GitHub endpoints, and aggregation of
//! several repositories into one [`GithubStats`].

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::GithubStats;
use crate::time_utils::parse_timestamp;

/// One entry of the repository search results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RepoSummary {
    pub name: String,
    /// `owner/name`, taken from the repository URL
    pub full_name: String,
    pub description: Option<String>,
    pub url: String,
    pub private: bool,
    pub language: Option<String>,
    pub stars: u32,
    pub updated_at: String,
}

/// Repository metadata plus commit statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RepoDetail {
    pub name: String,
    pub description: Option<String>,
    pub stars: u32,
    pub forks: u32,
    pub open_issues: u32,
    pub language: Option<String>,
    pub default_branch: String,
    pub first_commit: Option<String>,
    pub last_commit: Option<String>,
    pub commit_count: u32,
    pub url: String,
    pub private: bool,
}

/// A repository that could not be fetched during aggregation.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RepoFailure {
    pub url: String,
    pub error: String,
}

/// Outcome of fetching several repositories at once.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AggregateReport {
    /// Aggregate over the successful fetches; `None` if every fetch failed.
    pub stats: Option<GithubStats>,
    pub repositories: Vec<RepoDetail>,
    pub failures: Vec<RepoFailure>,
    /// Some repositories failed while others succeeded.
    pub partial: bool,
    /// A 404 was seen with no GitHub account connected; the repository
    /// may be private.
    pub maybe_private: bool,
}

impl GithubStats {
    /// Combine several repositories: counts are summed, the commit window is
    /// the earliest first commit to the latest last commit, and languages are
    /// unioned in first-seen order.
    pub fn from_repositories(repos: &[RepoDetail]) -> Option<Self> {
        let first = repos.first()?;

        let mut stats = GithubStats {
            stars: Some(0),
            forks: Some(0),
            open_issues: Some(0),
            commit_count: Some(0),
            first_commit: None,
            last_commit: None,
            language: None,
            default_branch: Some(first.default_branch.clone()),
        };
        let mut languages: Vec<&str> = Vec::new();

        for repo in repos {
            stats.stars = stats.stars.map(|n| n.saturating_add(repo.stars));
            stats.forks = stats.forks.map(|n| n.saturating_add(repo.forks));
            stats.open_issues = stats.open_issues.map(|n| n.saturating_add(repo.open_issues));
            stats.commit_count = stats
                .commit_count
                .map(|n| n.saturating_add(repo.commit_count));

            if let Some(candidate) = repo.first_commit.as_deref() {
                if is_earlier(candidate, stats.first_commit.as_deref()) {
                    stats.first_commit = Some(candidate.to_string());
                }
            }
            if let Some(candidate) = repo.last_commit.as_deref() {
                if is_later(candidate, stats.last_commit.as_deref()) {
                    stats.last_commit = Some(candidate.to_string());
                }
            }

            if let Some(lang) = repo.language.as_deref() {
                if !languages.contains(&lang) {
                    languages.push(lang);
                }
            }
        }

        if !languages.is_empty() {
            stats.language = Some(languages.join(", "));
        }

        Some(stats)
    }
}

fn is_earlier(candidate: &str, current: Option<&str>) -> bool {
    match current {
        None => true,
        Some(current) => match (parse_timestamp(candidate), parse_timestamp(current)) {
            (Some(a), Some(b)) => a < b,
            _ => candidate < current,
        },
    }
}

fn is_later(candidate: &str, current: Option<&str>) -> bool {
    match current {
        None => true,
        Some(current) => match (parse_timestamp(candidate), parse_timestamp(current)) {
            (Some(a), Some(b)) => a > b,
            _ => candidate > current,
        },
    }
}
