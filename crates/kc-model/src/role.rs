//! Role domain model.
//!
//! Roles are either realm-level or owned by a client. Their generated ids
//! change on every rebuild, so roles are correlated across rebuilds by
//! [`RoleKey`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique identifier.
    pub id: Uuid,
    /// Role name (unique within realm or client).
    pub name: String,
    /// Role description.
    pub description: Option<String>,
    /// Realm this role belongs to.
    pub realm_id: Uuid,
    /// Client this role belongs to (None for realm roles).
    pub client_id: Option<Uuid>,
    /// When the role was created.
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Creates a new realm role.
    #[must_use]
    pub fn new_realm_role(realm_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            description: None,
            realm_id,
            client_id: None,
            created_at: Utc::now(),
        }
    }

    /// Creates a new client role.
    #[must_use]
    pub fn new_client_role(realm_id: Uuid, client_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id),
            ..Self::new_realm_role(realm_id, name)
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Checks if this is a realm role.
    #[must_use]
    pub const fn is_realm_role(&self) -> bool {
        self.client_id.is_none()
    }

    /// Checks if this is a client role.
    #[must_use]
    pub const fn is_client_role(&self) -> bool {
        self.client_id.is_some()
    }
}

/// Natural key of a role: its name plus the `client_id` of the owning
/// client, if any.
///
/// The owning client is identified by its OAuth client identifier rather
/// than its generated id, which does not survive a rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleKey {
    /// Role name.
    pub name: String,
    /// OAuth client identifier of the owning client.
    pub client: Option<String>,
}

impl RoleKey {
    /// Key of a realm role.
    #[must_use]
    pub fn realm(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            client: None,
        }
    }

    /// Key of a client role.
    #[must_use]
    pub fn client(client: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            client: Some(client.into()),
        }
    }
}

impl fmt::Display for RoleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.client {
            Some(client) => write!(f, "{client}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}
