//! Error types for govee-store.

use std::path::PathBuf;

/// Result type for govee-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in govee-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Sync-state row missing for a job that should exist.
    #[error("No sync state for job: {0}")]
    JobNotFound(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
