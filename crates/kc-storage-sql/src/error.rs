//! SQL storage error types.

use kc_storage::StorageError;
use sqlx::Error as SqlxError;

/// Converts a `SQLx` error to a storage error.
#[allow(clippy::needless_pass_by_value)]
pub fn from_sqlx_error(err: SqlxError) -> StorageError {
    match err {
        SqlxError::RowNotFound => StorageError::Internal("Row not found".to_string()),
        SqlxError::Database(db_err) => {
            // 23505: unique violation, 23503: foreign key violation
            if db_err.code().is_some_and(|c| c == "23505") {
                StorageError::duplicate(
                    "row",
                    "constraint",
                    db_err.constraint().unwrap_or_default(),
                )
            } else if db_err.code().is_some_and(|c| c == "23503") {
                StorageError::Query(format!("Reference violation: {}", db_err.message()))
            } else {
                StorageError::Query(db_err.to_string())
            }
        }
        SqlxError::PoolTimedOut => StorageError::Connection("Connection pool timeout".to_string()),
        SqlxError::PoolClosed => StorageError::Connection("Connection pool closed".to_string()),
        _ => StorageError::Internal(err.to_string()),
    }
}

/// Converts a `SQLx` error raised while beginning, committing or rolling
/// back a transaction.
#[allow(clippy::needless_pass_by_value)]
pub fn from_transaction_error(err: SqlxError) -> StorageError {
    match err {
        SqlxError::PoolTimedOut | SqlxError::PoolClosed => from_sqlx_error(err),
        _ => StorageError::Transaction(err.to_string()),
    }
}

/// Creates a not found error for the given entity type and ID.
pub const fn not_found(entity_type: &'static str, id: uuid::Uuid) -> StorageError {
    StorageError::not_found(entity_type, id)
}
