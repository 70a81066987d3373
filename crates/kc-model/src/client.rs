//! Client and client scope domain models.
//!
//! Clients are applications registered in a realm. Client scopes bundle
//! protocol mappers and role scope mappings shared between clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default protocol for clients and client scopes.
pub const DEFAULT_PROTOCOL: &str = "openid-connect";

/// A client application registered in a realm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Client {
    /// Generated identifier.
    pub id: Uuid,
    /// Realm this client belongs to.
    pub realm_id: Uuid,
    /// OAuth client identifier (natural key within the realm).
    pub client_id: String,
    /// Display name.
    pub name: Option<String>,
    /// Whether the client is enabled.
    pub enabled: bool,
    /// Protocol (`openid-connect` or `saml`).
    pub protocol: String,
    /// Public client (no secret).
    pub public_client: bool,
    /// Bearer-only client.
    pub bearer_only: bool,
    /// Whether the client has a service account.
    pub service_accounts_enabled: bool,
    /// When the client was created.
    pub created_at: DateTime<Utc>,
    /// When the client was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Creates a new enabled confidential client.
    #[must_use]
    pub fn new(realm_id: Uuid, client_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            realm_id,
            client_id: client_id.into(),
            name: None,
            enabled: true,
            protocol: DEFAULT_PROTOCOL.to_string(),
            public_client: false,
            bearer_only: false,
            service_accounts_enabled: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Enables the service account.
    #[must_use]
    pub const fn with_service_account(mut self) -> Self {
        self.service_accounts_enabled = true;
        self
    }

    /// Username of the service account user bound to this client.
    #[must_use]
    pub fn service_account_username(&self) -> String {
        format!("service-account-{}", self.client_id)
    }
}

/// A client scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientScope {
    /// Generated identifier.
    pub id: Uuid,
    /// Realm this scope belongs to.
    pub realm_id: Uuid,
    /// Scope name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Protocol.
    pub protocol: String,
}

impl ClientScope {
    /// Creates a new client scope.
    #[must_use]
    pub fn new(realm_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            realm_id,
            name: name.into(),
            description: None,
            protocol: DEFAULT_PROTOCOL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_client_defaults() {
        let client = Client::new(Uuid::now_v7(), "web-app");

        assert_eq!(client.client_id, "web-app");
        assert!(client.enabled);
        assert!(!client.service_accounts_enabled);
        assert_eq!(client.protocol, DEFAULT_PROTOCOL);
    }

    #[test]
    fn service_account_username() {
        let client = Client::new(Uuid::now_v7(), "backend").with_service_account();

        assert!(client.service_accounts_enabled);
        assert_eq!(client.service_account_username(), "service-account-backend");
    }

    #[test]
    fn client_scope_defaults() {
        let scope = ClientScope::new(Uuid::now_v7(), "profile");
        assert_eq!(scope.protocol, "openid-connect");
    }
}
