//! User domain model.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user account.
///
/// Users outlive realm rebuilds: their rows are never removed by teardown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: Uuid,
    /// Realm this user belongs to.
    pub realm_id: Uuid,
    /// Username (unique within realm).
    pub username: String,
    /// Whether the user is enabled.
    pub enabled: bool,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Whether the email has been verified.
    pub email_verified: bool,
    /// Client this user is the service account of.
    pub service_account_client_link: Option<Uuid>,
    /// Custom attributes.
    pub attributes: HashMap<String, Vec<String>>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new enabled user.
    #[must_use]
    pub fn new(realm_id: Uuid, username: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            realm_id,
            username: username.into(),
            enabled: true,
            first_name: None,
            last_name: None,
            email: None,
            email_verified: false,
            service_account_client_link: None,
            attributes: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Uses the given identifier instead of a generated one.
    #[must_use]
    pub const fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Sets the email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Links the user to a client as its service account.
    #[must_use]
    pub const fn with_service_account_link(mut self, client_id: Uuid) -> Self {
        self.service_account_client_link = Some(client_id);
        self
    }

    /// Checks if this is a service account user.
    #[must_use]
    pub const fn is_service_account(&self) -> bool {
        self.service_account_client_link.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_defaults() {
        let user = User::new(Uuid::now_v7(), "alice").with_email("alice@example.com");

        assert_eq!(user.username, "alice");
        assert!(user.enabled);
        assert!(!user.is_service_account());
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn service_account_link() {
        let client_id = Uuid::now_v7();
        let user = User::new(Uuid::now_v7(), "service-account-web").with_service_account_link(client_id);

        assert!(user.is_service_account());
        assert_eq!(user.service_account_client_link, Some(client_id));
    }
}
