//! User association rows.
//!
//! Role mappings and group memberships reference roles and groups by id
//! only. They are re-pointed after a rebuild and swept when the target no
//! longer exists.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user ↔ role association row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleMapping {
    /// User holding the role.
    pub user_id: Uuid,
    /// Granted role.
    pub role_id: Uuid,
}

impl RoleMapping {
    /// Creates a new role mapping.
    #[must_use]
    pub const fn new(user_id: Uuid, role_id: Uuid) -> Self {
        Self { user_id, role_id }
    }
}

/// A user ↔ group association row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupMembership {
    /// Member user.
    pub user_id: Uuid,
    /// Group joined.
    pub group_id: Uuid,
}

impl GroupMembership {
    /// Creates a new group membership.
    #[must_use]
    pub const fn new(user_id: Uuid, group_id: Uuid) -> Self {
        Self { user_id, group_id }
    }
}
