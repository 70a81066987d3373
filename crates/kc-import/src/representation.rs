//! Realm and user representations as found in import files.
//!
//! Field names follow the camelCase JSON export format. Every collection
//! is optional in the file and defaults to empty.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A complete realm definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealmRepresentation {
    /// Realm id, used only when the realm is created for the first time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Realm name.
    pub realm: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Whether the realm is enabled (defaults to true).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Realm and client roles.
    #[serde(default)]
    pub roles: RolesRepresentation,
    /// Client scopes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub client_scopes: Vec<ClientScopeRepresentation>,
    /// Names of the realm default client scopes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_default_client_scopes: Vec<String>,
    /// Names of the realm optional client scopes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_optional_client_scopes: Vec<String>,
    /// Clients.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clients: Vec<ClientRepresentation>,
    /// Role mappings of client scopes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scope_mappings: Vec<ScopeMappingRepresentation>,
    /// Group tree.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupRepresentation>,
    /// Paths of groups new users join.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_groups: Vec<String>,
    /// Users created with the realm.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<UserRepresentation>,
}

impl RealmRepresentation {
    /// Creates an empty representation of the named realm.
    #[must_use]
    pub fn new(realm: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            ..Self::default()
        }
    }

    /// Returns whether the realm is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Returns the representation id if it is a valid UUID.
    #[must_use]
    pub fn parsed_id(&self) -> Option<Uuid> {
        parse_id(self.id.as_deref())
    }

    /// Iterates over every role definition with the `client_id` of its
    /// owner, realm roles first.
    pub fn all_roles(&self) -> impl Iterator<Item = (Option<&str>, &RoleRepresentation)> {
        let realm = self.roles.realm.iter().map(|r| (None, r));
        let client = self
            .roles
            .client
            .iter()
            .flat_map(|(client, roles)| roles.iter().map(move |r| (Some(client.as_str()), r)));
        realm.chain(client)
    }
}

/// Realm roles and client roles keyed by `client_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolesRepresentation {
    /// Realm roles.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub realm: Vec<RoleRepresentation>,
    /// Client roles.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub client: BTreeMap<String, Vec<RoleRepresentation>>,
}

/// A role definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRepresentation {
    /// Role id in the source system (ignored on import).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Role name.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the role is composite.
    #[serde(default)]
    pub composite: bool,
    /// Child roles of a composite role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composites: Option<CompositesRepresentation>,
    /// Custom attributes.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, Vec<String>>,
}

impl RoleRepresentation {
    /// Creates a role definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Children of a composite role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositesRepresentation {
    /// Realm role names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub realm: Vec<String>,
    /// Client role names keyed by `client_id`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub client: BTreeMap<String, Vec<String>>,
}

/// A client definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct ClientRepresentation {
    /// Client id in the source system (ignored on import).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// OAuth client identifier.
    pub client_id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Whether the client is enabled (defaults to true).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Protocol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Public client.
    #[serde(default)]
    pub public_client: bool,
    /// Bearer-only client.
    #[serde(default)]
    pub bearer_only: bool,
    /// Whether the client has a service account user.
    #[serde(default)]
    pub service_accounts_enabled: bool,
    /// Whether fine-grained authorization is enabled.
    #[serde(default)]
    pub authorization_services_enabled: bool,
    /// Names of default client scopes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_client_scopes: Vec<String>,
    /// Names of optional client scopes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional_client_scopes: Vec<String>,
    /// Authorization resources, scopes and policies, stored as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_settings: Option<Value>,
}

impl ClientRepresentation {
    /// Creates a client definition.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Self::default()
        }
    }
}

/// A client scope definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientScopeRepresentation {
    /// Scope id in the source system (ignored on import).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Scope name.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Protocol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

/// Roles granted to a client scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeMappingRepresentation {
    /// Client scope name.
    pub client_scope: String,
    /// Realm role names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

/// A group and its subgroups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRepresentation {
    /// Group id in the source system (ignored on import).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Group name.
    pub name: String,
    /// Full path, informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Realm roles granted to members.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub realm_roles: Vec<String>,
    /// Client roles granted to members, keyed by `client_id`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub client_roles: BTreeMap<String, Vec<String>>,
    /// Child groups.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_groups: Vec<GroupRepresentation>,
}

impl GroupRepresentation {
    /// Creates a group definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A user definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRepresentation {
    /// User id, kept when it is a valid UUID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Username.
    pub username: String,
    /// Whether the user is enabled (defaults to true).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// First name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Whether the email has been verified.
    #[serde(default)]
    pub email_verified: bool,
    /// Custom attributes.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, Vec<String>>,
    /// Realm role names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub realm_roles: Vec<String>,
    /// Client role names keyed by `client_id`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub client_roles: BTreeMap<String, Vec<String>>,
    /// Group paths.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    /// `client_id` of the client this user is the service account of.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_client_id: Option<String>,
}

impl UserRepresentation {
    /// Creates a user definition.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    /// Returns whether the user is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Returns the representation id if it is a valid UUID.
    #[must_use]
    pub fn parsed_id(&self) -> Option<Uuid> {
        parse_id(self.id.as_deref())
    }
}

/// Contents of a `<realm>-users-<n>.json` file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersShard {
    /// Realm the users belong to.
    pub realm: String,
    /// Users.
    #[serde(default)]
    pub users: Vec<UserRepresentation>,
}

fn parse_id(id: Option<&str>) -> Option<Uuid> {
    id.and_then(|id| Uuid::parse_str(id).ok())
}
