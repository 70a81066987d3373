//! Group domain model.
//!
//! Groups form a tree per realm. Top-level groups have no parent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier.
    pub id: Uuid,
    /// Group name (natural key).
    pub name: String,
    /// Realm this group belongs to.
    pub realm_id: Uuid,
    /// Parent group ID (None for top-level groups).
    pub parent_id: Option<Uuid>,
    /// When the group was created.
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Creates a new top-level group.
    #[must_use]
    pub fn new(realm_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            realm_id,
            parent_id: None,
            created_at: Utc::now(),
        }
    }

    /// Creates a new child group.
    #[must_use]
    pub fn new_child(realm_id: Uuid, parent_id: Uuid, name: impl Into<String>) -> Self {
        let mut group = Self::new(realm_id, name);
        group.parent_id = Some(parent_id);
        group
    }

    /// Checks if this is a top-level group.
    #[must_use]
    pub const fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Splits a group path such as `/staff/admins` into its segments.
///
/// A path without a leading slash is treated as a top-level name.
#[must_use]
pub fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}
