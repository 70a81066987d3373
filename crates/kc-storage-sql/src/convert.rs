//! Conversion between database entities and domain models.

use std::collections::HashMap;

use kc_model::{Client, ClientScope, Group, Realm, Role, User};

use crate::entities::{ClientRow, ClientScopeRow, GroupRow, RealmRow, RoleRow, UserRow};

impl From<RealmRow> for Realm {
    fn from(row: RealmRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            display_name: row.display_name,
            enabled: row.enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Self {
            id: row.id,
            realm_id: row.realm_id,
            client_id: row.client_id,
            name: row.name,
            enabled: row.enabled,
            protocol: row.protocol,
            public_client: row.public_client,
            bearer_only: row.bearer_only,
            service_accounts_enabled: row.service_accounts_enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<ClientScopeRow> for ClientScope {
    fn from(row: ClientScopeRow) -> Self {
        Self {
            id: row.id,
            realm_id: row.realm_id,
            name: row.name,
            description: row.description,
            protocol: row.protocol,
        }
    }
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            realm_id: row.realm_id,
            client_id: row.client_id,
            created_at: row.created_at,
        }
    }
}

impl From<GroupRow> for Group {
    fn from(row: GroupRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            realm_id: row.realm_id,
            parent_id: row.parent_id,
            created_at: row.created_at,
        }
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            realm_id: row.realm_id,
            username: row.username,
            enabled: row.enabled,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            email_verified: row.email_verified,
            service_account_client_link: row.service_account_client_link,
            attributes: attributes_from_json(row.attributes.0),
            created_at: row.created_at,
        }
    }
}

/// Converts user attributes to their JSONB form.
pub fn attributes_to_json(attributes: &HashMap<String, Vec<String>>) -> serde_json::Value {
    serde_json::to_value(attributes).unwrap_or_else(|_| serde_json::json!({}))
}

/// Reads user attributes from JSONB, dropping malformed content.
pub fn attributes_from_json(value: serde_json::Value) -> HashMap<String, Vec<String>> {
    serde_json::from_value(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_round_trip_through_json() {
        let mut attributes = HashMap::new();
        attributes.insert("department".to_string(), vec!["sales".to_string()]);

        let json = attributes_to_json(&attributes);
        assert_eq!(attributes_from_json(json), attributes);
    }

    #[test]
    fn malformed_attributes_are_dropped() {
        assert!(attributes_from_json(serde_json::json!(["not", "a", "map"])).is_empty());
    }
}
