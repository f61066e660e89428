// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Project Tracker: a local catalogue of personal projects
//!
//! This crate provides the backend API for storing projects in SQLite and
//! enriching them with repository metadata fetched from GitHub.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::SqliteDb;
use services::GitHubService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: SqliteDb,
    pub github: GitHubService,
}
