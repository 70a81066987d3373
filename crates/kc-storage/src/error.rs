//! Storage error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Entity not found.
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity (e.g., "Role", "Realm").
        entity_type: &'static str,
        /// Entity ID.
        id: Uuid,
    },

    /// Duplicate entity (unique constraint violation).
    #[error("Duplicate {entity_type}: {field} '{value}' already exists")]
    Duplicate {
        /// Type of entity.
        entity_type: &'static str,
        /// Field that caused the conflict.
        field: &'static str,
        /// Conflicting value.
        value: String,
    },

    /// The row is still referenced by another row.
    #[error("{entity_type} {id} is still referenced by {referenced_by}")]
    Referenced {
        /// Type of the entity being deleted.
        entity_type: &'static str,
        /// Entity ID.
        id: Uuid,
        /// What still points at it.
        referenced_by: String,
    },

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Database query error.
    #[error("Database query error: {0}")]
    Query(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error.
    #[error("Internal storage error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Creates a not found error for an entity.
    #[must_use]
    pub const fn not_found(entity_type: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity_type, id }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(
        entity_type: &'static str,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::Duplicate {
            entity_type,
            field,
            value: value.into(),
        }
    }

    /// Creates a still-referenced error.
    #[must_use]
    pub fn referenced(
        entity_type: &'static str,
        id: Uuid,
        referenced_by: impl Into<String>,
    ) -> Self {
        Self::Referenced {
            entity_type,
            id,
            referenced_by: referenced_by.into(),
        }
    }

    /// Checks if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Checks if this is a duplicate error.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Checks if this is a still-referenced error.
    #[must_use]
    pub const fn is_referenced(&self) -> bool {
        matches!(self, Self::Referenced { .. })
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_error() {
        let id = Uuid::now_v7();
        let err = StorageError::not_found("Role", id);

        assert!(err.is_not_found());
        assert!(!err.is_duplicate());
        assert!(err.to_string().contains("Role"));
    }

    #[test]
    fn duplicate_error() {
        let err = StorageError::duplicate("User", "username", "john");

        assert!(err.is_duplicate());
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("john"));
    }

    #[test]
    fn referenced_error() {
        let id = Uuid::now_v7();
        let err = StorageError::referenced("Role", id, "composite_roles");

        assert!(err.is_referenced());
        assert!(err.to_string().contains("composite_roles"));
    }
}
