//! Realm structure rebuild.
//!
//! [`RealmRebuilder`] is the seam between the import engine and the code
//! that turns a [`RealmRepresentation`] into rows. [`StoreRealmRebuilder`]
//! writes everything through the store traits.

use std::collections::HashMap;

use async_trait::async_trait;
use kc_model::client::DEFAULT_PROTOCOL;
use kc_model::{Client, ClientScope, Group, Realm, Role, User};
use kc_storage::StoreTransaction;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ImportError, ImportResult};
use crate::provision::{provision_user, resolve_group_path};
use crate::representation::{ClientRepresentation, GroupRepresentation, RealmRepresentation};

/// Permissions granted to authorization setup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthorizationContext {
    /// Whether script-based policies may be stored.
    pub allow_script_policy_upload: bool,
}

impl AuthorizationContext {
    /// Context used by realm import, which trusts its input files.
    #[must_use]
    pub const fn for_import() -> Self {
        Self {
            allow_script_policy_upload: true,
        }
    }
}

/// Counts of what authorization setup changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuthorizationReport {
    /// Service account users created.
    pub service_accounts_created: usize,
    /// Existing users linked to their client as service account.
    pub service_accounts_linked: usize,
    /// Clients whose authorization settings were stored.
    pub authorization_settings: usize,
}

/// Recreates realm structure from a representation.
#[async_trait]
pub trait RealmRebuilder: Send + Sync {
    /// Creates the realm row and all of its structure.
    ///
    /// `realm_id` is the id of the realm this one replaces, if any.
    ///
    /// ## Errors
    ///
    /// Returns an error if the representation is inconsistent or a write
    /// fails. The caller must roll back.
    async fn rebuild(
        &self,
        tx: &mut dyn StoreTransaction,
        rep: &RealmRepresentation,
        realm_id: Option<Uuid>,
    ) -> ImportResult<Realm>;

    /// Creates service account users and stores authorization settings.
    ///
    /// ## Errors
    ///
    /// Returns `ImportError::ScriptPolicyRejected` for script policies when
    /// `ctx` does not allow them.
    async fn setup_authorization(
        &self,
        tx: &mut dyn StoreTransaction,
        realm: &Realm,
        rep: &RealmRepresentation,
        ctx: AuthorizationContext,
    ) -> ImportResult<AuthorizationReport>;
}

/// [`RealmRebuilder`] writing through the store traits.
///
/// Structural objects always get fresh ids. The realm keeps the id it is
/// given, falls back to the representation id when that is a UUID, and is
/// otherwise assigned a fresh one.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreRealmRebuilder;

impl StoreRealmRebuilder {
    /// Creates a rebuilder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RealmRebuilder for StoreRealmRebuilder {
    async fn rebuild(
        &self,
        tx: &mut dyn StoreTransaction,
        rep: &RealmRepresentation,
        realm_id: Option<Uuid>,
    ) -> ImportResult<Realm> {
        if rep.realm.trim().is_empty() {
            return Err(ImportError::Rebuild("realm name is missing".to_string()));
        }
        if let Some(client_id) = rep
            .roles
            .client
            .keys()
            .find(|client_id| !rep.clients.iter().any(|c| &c.client_id == *client_id))
        {
            return Err(ImportError::unknown("client", client_id));
        }

        let id = realm_id
            .or_else(|| rep.parsed_id())
            .unwrap_or_else(Uuid::now_v7);
        let mut realm = Realm::new(rep.realm.clone())
            .with_id(id)
            .with_enabled(rep.is_enabled());
        realm.display_name.clone_from(&rep.display_name);
        tx.create_realm(&realm).await?;

        let scopes = create_client_scopes(tx, &realm, rep).await?;
        let mut index = RoleIndex::default();
        create_realm_roles(tx, &realm, rep, &mut index).await?;
        for client_rep in &rep.clients {
            create_client(tx, &realm, client_rep, rep, &scopes, &mut index).await?;
        }
        link_composites(tx, rep, &index).await?;

        for mapping in &rep.scope_mappings {
            let scope_id = lookup(&scopes, "client scope", &mapping.client_scope)?;
            for name in &mapping.roles {
                tx.add_client_scope_role_mapping(scope_id, index.realm_role(name)?)
                    .await?;
            }
        }

        for group_rep in &rep.groups {
            let group = Group::new(realm.id, group_rep.name.clone());
            create_group(tx, &group, group_rep, &index).await?;
            for sub_rep in &group_rep.sub_groups {
                if !sub_rep.sub_groups.is_empty() {
                    return Err(ImportError::Rebuild(format!(
                        "group '/{}/{}' has subgroups, only two levels are supported",
                        group_rep.name, sub_rep.name
                    )));
                }
                let sub = Group::new_child(realm.id, group.id, sub_rep.name.clone());
                create_group(tx, &sub, sub_rep, &index).await?;
            }
        }

        for path in &rep.default_groups {
            let group = resolve_group_path(tx, realm.id, path)
                .await?
                .ok_or_else(|| ImportError::unknown("group", path))?;
            tx.add_default_group(realm.id, group.id).await?;
        }

        for user_rep in &rep.users {
            provision_user(tx, realm.id, user_rep).await?;
        }

        debug!(
            realm = %realm.name,
            clients = rep.clients.len(),
            scopes = scopes.len(),
            groups = rep.groups.len(),
            users = rep.users.len(),
            "Realm structure created"
        );
        Ok(realm)
    }

    async fn setup_authorization(
        &self,
        tx: &mut dyn StoreTransaction,
        realm: &Realm,
        rep: &RealmRepresentation,
        ctx: AuthorizationContext,
    ) -> ImportResult<AuthorizationReport> {
        let mut report = AuthorizationReport::default();
        for client_rep in &rep.clients {
            let client = tx
                .find_client_by_client_id(realm.id, &client_rep.client_id)
                .await?
                .ok_or_else(|| ImportError::unknown("client", &client_rep.client_id))?;

            if client.service_accounts_enabled {
                let username = client.service_account_username();
                match tx.find_user_by_username(realm.id, &username).await? {
                    Some(user) if user.service_account_client_link == Some(client.id) => {}
                    Some(user) => {
                        tx.link_service_account(user.id, client.id).await?;
                        report.service_accounts_linked += 1;
                    }
                    None => {
                        let user = User::new(realm.id, username).with_service_account_link(client.id);
                        tx.create_user(&user).await?;
                        report.service_accounts_created += 1;
                    }
                }
            }

            if let Some(settings) = &client_rep.authorization_settings {
                check_script_policies(&client.client_id, settings, ctx)?;
                tx.set_authorization_settings(client.id, settings).await?;
                report.authorization_settings += 1;
            }
        }
        Ok(report)
    }
}

/// Generated ids of the roles created so far, by name.
#[derive(Debug, Default)]
struct RoleIndex {
    realm: HashMap<String, Uuid>,
    clients: HashMap<String, (Uuid, HashMap<String, Uuid>)>,
}

impl RoleIndex {
    fn realm_role(&self, name: &str) -> ImportResult<Uuid> {
        lookup(&self.realm, "realm role", name)
    }

    fn client_role(&self, client_id: &str, name: &str) -> ImportResult<Uuid> {
        self.clients
            .get(client_id)
            .and_then(|(_, roles)| roles.get(name))
            .copied()
            .ok_or_else(|| ImportError::unknown("client role", format!("{client_id}.{name}")))
    }

    fn role(&self, client_id: Option<&str>, name: &str) -> ImportResult<Uuid> {
        match client_id {
            Some(client_id) => self.client_role(client_id, name),
            None => self.realm_role(name),
        }
    }
}

fn lookup(ids: &HashMap<String, Uuid>, kind: &'static str, name: &str) -> ImportResult<Uuid> {
    ids.get(name)
        .copied()
        .ok_or_else(|| ImportError::unknown(kind, name))
}

async fn create_client_scopes(
    tx: &mut dyn StoreTransaction,
    realm: &Realm,
    rep: &RealmRepresentation,
) -> ImportResult<HashMap<String, Uuid>> {
    let mut scopes = HashMap::new();
    for scope_rep in &rep.client_scopes {
        let mut scope = ClientScope::new(realm.id, scope_rep.name.clone());
        scope.description.clone_from(&scope_rep.description);
        if let Some(protocol) = &scope_rep.protocol {
            scope.protocol.clone_from(protocol);
        }
        tx.create_client_scope(&scope).await?;
        scopes.insert(scope.name, scope.id);
    }

    let designations = rep
        .default_default_client_scopes
        .iter()
        .map(|name| (name, true))
        .chain(rep.default_optional_client_scopes.iter().map(|name| (name, false)));
    for (name, default_scope) in designations {
        let scope_id = lookup(&scopes, "client scope", name)?;
        tx.add_realm_default_client_scope(realm.id, scope_id, default_scope)
            .await?;
    }
    Ok(scopes)
}

async fn create_realm_roles(
    tx: &mut dyn StoreTransaction,
    realm: &Realm,
    rep: &RealmRepresentation,
    index: &mut RoleIndex,
) -> ImportResult<()> {
    for role_rep in &rep.roles.realm {
        let mut role = Role::new_realm_role(realm.id, role_rep.name.clone());
        role.description.clone_from(&role_rep.description);
        tx.create_role(&role).await?;
        index.realm.insert(role.name, role.id);
    }
    Ok(())
}

async fn create_client(
    tx: &mut dyn StoreTransaction,
    realm: &Realm,
    client_rep: &ClientRepresentation,
    rep: &RealmRepresentation,
    scopes: &HashMap<String, Uuid>,
    index: &mut RoleIndex,
) -> ImportResult<()> {
    let mut client = Client::new(realm.id, client_rep.client_id.clone());
    client.name.clone_from(&client_rep.name);
    client.enabled = client_rep.enabled.unwrap_or(true);
    client.protocol = client_rep
        .protocol
        .clone()
        .unwrap_or_else(|| DEFAULT_PROTOCOL.to_string());
    client.public_client = client_rep.public_client;
    client.bearer_only = client_rep.bearer_only;
    client.service_accounts_enabled = client_rep.service_accounts_enabled;
    tx.create_client(&client).await?;

    let mut roles = HashMap::new();
    for role_rep in rep.roles.client.get(&client.client_id).into_iter().flatten() {
        let mut role = Role::new_client_role(realm.id, client.id, role_rep.name.clone());
        role.description.clone_from(&role_rep.description);
        tx.create_role(&role).await?;
        roles.insert(role.name, role.id);
    }

    let links = client_rep
        .default_client_scopes
        .iter()
        .map(|name| (name, true))
        .chain(client_rep.optional_client_scopes.iter().map(|name| (name, false)));
    for (name, default_scope) in links {
        let scope_id = lookup(scopes, "client scope", name)?;
        tx.add_client_scope_client_mapping(client.id, scope_id, default_scope)
            .await?;
    }

    index.clients.insert(client.client_id, (client.id, roles));
    Ok(())
}

async fn link_composites(
    tx: &mut dyn StoreTransaction,
    rep: &RealmRepresentation,
    index: &RoleIndex,
) -> ImportResult<()> {
    for (owner, role_rep) in rep.all_roles() {
        let Some(composites) = &role_rep.composites else {
            continue;
        };
        let parent = index.role(owner, &role_rep.name)?;
        for name in &composites.realm {
            tx.add_composite(parent, index.realm_role(name)?).await?;
        }
        for (client_id, names) in &composites.client {
            for name in names {
                tx.add_composite(parent, index.client_role(client_id, name)?)
                    .await?;
            }
        }
    }
    Ok(())
}

async fn create_group(
    tx: &mut dyn StoreTransaction,
    group: &Group,
    group_rep: &GroupRepresentation,
    index: &RoleIndex,
) -> ImportResult<()> {
    tx.create_group(group).await?;
    for name in &group_rep.realm_roles {
        tx.grant_group_role(group.id, index.realm_role(name)?).await?;
    }
    for (client_id, names) in &group_rep.client_roles {
        for name in names {
            tx.grant_group_role(group.id, index.client_role(client_id, name)?)
                .await?;
        }
    }
    Ok(())
}

/// Checks whether a policy type runs uploaded scripts.
#[must_use]
pub fn is_script_policy(policy_type: &str) -> bool {
    policy_type == "js" || policy_type.starts_with("script-")
}

fn check_script_policies(
    client_id: &str,
    settings: &Value,
    ctx: AuthorizationContext,
) -> ImportResult<()> {
    if ctx.allow_script_policy_upload {
        return Ok(());
    }
    let policies = settings
        .get("policies")
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice);
    for policy in policies {
        let policy_type = policy.get("type").and_then(Value::as_str).unwrap_or_default();
        if is_script_policy(policy_type) {
            let name = policy.get("name").and_then(Value::as_str).unwrap_or_default();
            return Err(ImportError::ScriptPolicyRejected {
                client: client_id.to_string(),
                policy: name.to_string(),
            });
        }
    }
    Ok(())
}
