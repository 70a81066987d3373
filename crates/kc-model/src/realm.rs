//! Realm domain model.
//!
//! A realm is the top-level container for all entities.
//! Its name is the business key; the generated id is what every other
//! row points at.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the administrative realm unless configured otherwise.
pub const DEFAULT_ADMIN_REALM: &str = "master";

/// An identity realm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Realm {
    /// Unique identifier.
    pub id: Uuid,
    /// Realm name (unique, immutable).
    pub name: String,
    /// Display name.
    pub display_name: Option<String>,
    /// Whether the realm is enabled.
    pub enabled: bool,
    /// When the realm was created.
    pub created_at: DateTime<Utc>,
    /// When the realm was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Realm {
    /// Creates a new enabled realm with a fresh identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            display_name: None,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Uses the given identifier instead of a generated one.
    #[must_use]
    pub const fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Sets whether the realm is enabled.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Checks if this is the administrative realm.
    #[must_use]
    pub fn is_admin_realm(&self, admin_realm: &str) -> bool {
        self.name == admin_realm
    }
}

/// A pending client-registration token issued for a realm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInitialAccess {
    /// Unique identifier.
    pub id: Uuid,
    /// Realm the token was issued for.
    pub realm_id: Uuid,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
    /// Lifetime in seconds (0 = never expires).
    pub expiration: i32,
    /// Number of registrations the token allows.
    pub count: i32,
    /// Registrations left.
    pub remaining_count: i32,
}

impl ClientInitialAccess {
    /// Creates a token allowing `count` registrations.
    #[must_use]
    pub fn new(realm_id: Uuid, expiration: i32, count: i32) -> Self {
        Self {
            id: Uuid::now_v7(),
            realm_id,
            created_at: Utc::now(),
            expiration,
            count,
            remaining_count: count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_realm_is_enabled() {
        let realm = Realm::new("acme");

        assert_eq!(realm.name, "acme");
        assert!(realm.enabled);
        assert!(realm.display_name.is_none());
    }

    #[test]
    fn admin_realm_detected() {
        let master = Realm::new(DEFAULT_ADMIN_REALM);
        let other = Realm::new("acme");

        assert!(master.is_admin_realm("master"));
        assert!(!other.is_admin_realm("master"));
    }

    #[test]
    fn preserved_id_is_kept() {
        let id = Uuid::now_v7();
        let realm = Realm::new("acme").with_id(id).with_enabled(false);

        assert_eq!(realm.id, id);
        assert!(!realm.enabled);
    }

    #[test]
    fn initial_access_starts_full() {
        let token = ClientInitialAccess::new(Uuid::now_v7(), 3600, 5);
        assert_eq!(token.remaining_count, 5);
    }
}
