//! Database layer (local SQLite file).

pub mod sqlite;

pub use sqlite::SqliteDb;

/// Table names as constants.
pub mod tables {
    pub const PROJECTS: &str = "projects";
    /// Key/value rows; only the GitHub auth state lives here.
    pub const SETTINGS: &str = "settings";
}
