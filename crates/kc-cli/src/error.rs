//! CLI error types.

use kc_import::ImportError;
use kc_storage::StorageError;
use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Import setup error.
    #[error(transparent)]
    Import(#[from] ImportError),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] StorageError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Some realms failed to import.
    #[error("{failed} of {total} realm(s) failed to import")]
    RealmsFailed {
        /// Failed realms.
        failed: usize,
        /// Realms attempted.
        total: usize,
    },
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
