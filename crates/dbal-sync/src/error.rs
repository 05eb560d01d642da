//! Error types for synchronization.

use std::path::PathBuf;

/// Errors that can occur while reading, comparing or writing structures.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Builder, dialect, diff or apply error.
    #[error(transparent)]
    Core(#[from] dbal_core::Error),

    /// IO error (reading/writing snapshot files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database driver error.
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Invalid information-table pattern.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A snapshot file exists but cannot be used.
    #[error("Invalid snapshot '{path}': {message}")]
    Snapshot {
        /// Path to the snapshot file.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },

    /// Missing or contradictory configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The endpoint URL names an engine without a connection adapter.
    #[error("Unsupported endpoint: {0}")]
    UnsupportedEndpoint(String),
}

/// Result type for synchronization operations.
pub type Result<T> = std::result::Result<T, SyncError>;
