// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod project;
pub mod repository;
pub mod user;

pub use project::{GithubStats, NewProject, Project, ProjectPatch};
pub use repository::{AggregateReport, RepoDetail, RepoFailure, RepoSummary};
pub use user::GitHubProfile;
