//! In-memory store.
//!
//! Holds every table in a [`MemoryState`] behind a single async mutex. A
//! transaction owns the lock for its whole lifetime, works on a private
//! copy of the state, and writes it back on commit. Referential rules
//! match the `PostgreSQL` schema, so deletions in the wrong order fail here
//! the same way they fail against the database.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use kc_model::{
    Client, ClientInitialAccess, ClientScope, Group, GroupMembership, Realm, Role, RoleMapping,
    User,
};
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::client::{ClientScopeStore, ClientStore};
use crate::error::{StorageError, StorageResult};
use crate::group::GroupStore;
use crate::membership::MembershipStore;
use crate::realm::RealmStore;
use crate::role::RoleStore;
use crate::store::{Store, StoreTransaction};
use crate::user::UserStore;

/// Every table of the in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    /// Realms by id.
    pub realms: BTreeMap<Uuid, Realm>,
    /// Clients by id.
    pub clients: BTreeMap<Uuid, Client>,
    /// Authorization settings by client id.
    pub authorization: HashMap<Uuid, Value>,
    /// Client scopes by id.
    pub client_scopes: BTreeMap<Uuid, ClientScope>,
    /// `(realm, scope, default)` designations.
    pub realm_default_client_scopes: Vec<(Uuid, Uuid, bool)>,
    /// `(client, scope, default)` links.
    pub client_scope_client_mappings: Vec<(Uuid, Uuid, bool)>,
    /// Roles by id.
    pub roles: BTreeMap<Uuid, Role>,
    /// `(parent, child)` composite rows.
    pub composite_roles: BTreeSet<(Uuid, Uuid)>,
    /// `(scope, role)` rows.
    pub client_scope_role_mappings: BTreeSet<(Uuid, Uuid)>,
    /// Groups by id.
    pub groups: BTreeMap<Uuid, Group>,
    /// `(group, role)` grants.
    pub group_role_mappings: BTreeSet<(Uuid, Uuid)>,
    /// `(realm, group)` default designations.
    pub realm_default_groups: Vec<(Uuid, Uuid)>,
    /// Client registration tokens by id.
    pub client_initial_access: BTreeMap<Uuid, ClientInitialAccess>,
    /// Users by id.
    pub users: BTreeMap<Uuid, User>,
    /// User role mappings.
    pub role_mappings: BTreeSet<RoleMapping>,
    /// User group memberships.
    pub group_memberships: BTreeSet<GroupMembership>,
}

impl MemoryState {
    /// Role mappings pointing at a role that does not exist.
    #[must_use]
    pub fn dangling_role_mappings(&self) -> Vec<RoleMapping> {
        self.role_mappings
            .iter()
            .filter(|m| !self.roles.contains_key(&m.role_id))
            .copied()
            .collect()
    }

    /// Group memberships pointing at a group that does not exist.
    #[must_use]
    pub fn dangling_group_memberships(&self) -> Vec<GroupMembership> {
        self.group_memberships
            .iter()
            .filter(|m| !self.groups.contains_key(&m.group_id))
            .copied()
            .collect()
    }

    fn require_realm(&self, realm_id: Uuid) -> StorageResult<()> {
        if self.realms.contains_key(&realm_id) {
            Ok(())
        } else {
            Err(StorageError::not_found("Realm", realm_id))
        }
    }
}

/// In-memory [`Store`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the committed state.
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StorageResult<Box<dyn StoreTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }
}

/// Unit of work over a [`MemoryStore`].
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

fn removed(before: usize, after: usize) -> u64 {
    (before - after) as u64
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> StorageResult<()> {
        let Self { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        Ok(())
    }
}

#[async_trait]
impl RealmStore for MemoryTransaction {
    async fn find_realm_by_name(&mut self, name: &str) -> StorageResult<Option<Realm>> {
        Ok(self.working.realms.values().find(|r| r.name == name).cloned())
    }

    async fn lock_realm(&mut self, id: Uuid) -> StorageResult<Option<Realm>> {
        Ok(self.working.realms.get(&id).cloned())
    }

    async fn create_realm(&mut self, realm: &Realm) -> StorageResult<()> {
        let state = &mut self.working;
        if state.realms.contains_key(&realm.id)
            || state.realms.values().any(|r| r.name == realm.name)
        {
            return Err(StorageError::duplicate("Realm", "name", &realm.name));
        }
        state.realms.insert(realm.id, realm.clone());
        Ok(())
    }

    async fn delete_realm(&mut self, id: Uuid) -> StorageResult<()> {
        let state = &mut self.working;
        state.require_realm(id)?;
        let blockers = [
            ("clients", state.clients.values().any(|c| c.realm_id == id)),
            (
                "client_scopes",
                state.client_scopes.values().any(|s| s.realm_id == id),
            ),
            ("roles", state.roles.values().any(|r| r.realm_id == id)),
            ("groups", state.groups.values().any(|g| g.realm_id == id)),
            (
                "client_initial_access",
                state.client_initial_access.values().any(|a| a.realm_id == id),
            ),
            (
                "realm_default_groups",
                state.realm_default_groups.iter().any(|(r, _)| *r == id),
            ),
            (
                "realm_default_client_scopes",
                state
                    .realm_default_client_scopes
                    .iter()
                    .any(|(r, _, _)| *r == id),
            ),
        ];
        if let Some((table, _)) = blockers.iter().find(|(_, blocked)| *blocked) {
            return Err(StorageError::referenced("Realm", id, *table));
        }
        state.realms.remove(&id);
        Ok(())
    }

    async fn list_default_group_ids(&mut self, realm_id: Uuid) -> StorageResult<Vec<Uuid>> {
        Ok(self
            .working
            .realm_default_groups
            .iter()
            .filter(|(r, _)| *r == realm_id)
            .map(|(_, g)| *g)
            .collect())
    }

    async fn add_default_group(&mut self, realm_id: Uuid, group_id: Uuid) -> StorageResult<()> {
        let state = &mut self.working;
        state.require_realm(realm_id)?;
        if !state.groups.contains_key(&group_id) {
            return Err(StorageError::not_found("Group", group_id));
        }
        if !state.realm_default_groups.contains(&(realm_id, group_id)) {
            state.realm_default_groups.push((realm_id, group_id));
        }
        Ok(())
    }

    async fn remove_default_group(
        &mut self,
        realm_id: Uuid,
        group_id: Uuid,
    ) -> StorageResult<u64> {
        let rows = &mut self.working.realm_default_groups;
        let before = rows.len();
        rows.retain(|row| *row != (realm_id, group_id));
        Ok(removed(before, rows.len()))
    }

    async fn clear_default_groups(&mut self, realm_id: Uuid) -> StorageResult<u64> {
        let rows = &mut self.working.realm_default_groups;
        let before = rows.len();
        rows.retain(|(r, _)| *r != realm_id);
        Ok(removed(before, rows.len()))
    }

    async fn create_client_initial_access(
        &mut self,
        access: &ClientInitialAccess,
    ) -> StorageResult<()> {
        self.working.require_realm(access.realm_id)?;
        self.working
            .client_initial_access
            .insert(access.id, access.clone());
        Ok(())
    }

    async fn delete_client_initial_access_by_realm(
        &mut self,
        realm_id: Uuid,
    ) -> StorageResult<u64> {
        let rows = &mut self.working.client_initial_access;
        let before = rows.len();
        rows.retain(|_, a| a.realm_id != realm_id);
        Ok(removed(before, rows.len()))
    }
}

#[async_trait]
impl ClientStore for MemoryTransaction {
    async fn list_client_ids(&mut self, realm_id: Uuid) -> StorageResult<Vec<Uuid>> {
        Ok(self
            .working
            .clients
            .values()
            .filter(|c| c.realm_id == realm_id)
            .map(|c| c.id)
            .collect())
    }

    async fn list_clients(&mut self, realm_id: Uuid) -> StorageResult<Vec<Client>> {
        Ok(self
            .working
            .clients
            .values()
            .filter(|c| c.realm_id == realm_id)
            .cloned()
            .collect())
    }

    async fn find_client_by_client_id(
        &mut self,
        realm_id: Uuid,
        client_id: &str,
    ) -> StorageResult<Option<Client>> {
        Ok(self
            .working
            .clients
            .values()
            .find(|c| c.realm_id == realm_id && c.client_id == client_id)
            .cloned())
    }

    async fn lock_client(&mut self, id: Uuid) -> StorageResult<Option<Client>> {
        Ok(self.working.clients.get(&id).cloned())
    }

    async fn create_client(&mut self, client: &Client) -> StorageResult<()> {
        let state = &mut self.working;
        state.require_realm(client.realm_id)?;
        if state.clients.contains_key(&client.id)
            || state
                .clients
                .values()
                .any(|c| c.realm_id == client.realm_id && c.client_id == client.client_id)
        {
            return Err(StorageError::duplicate("Client", "client_id", &client.client_id));
        }
        state.clients.insert(client.id, client.clone());
        Ok(())
    }

    async fn delete_client(&mut self, id: Uuid) -> StorageResult<()> {
        let state = &mut self.working;
        if !state.clients.contains_key(&id) {
            return Err(StorageError::not_found("Client", id));
        }
        if state.roles.values().any(|r| r.client_id == Some(id)) {
            return Err(StorageError::referenced("Client", id, "roles"));
        }
        if state
            .client_scope_client_mappings
            .iter()
            .any(|(c, _, _)| *c == id)
        {
            return Err(StorageError::referenced(
                "Client",
                id,
                "client_scope_client_mappings",
            ));
        }
        state.authorization.remove(&id);
        state.clients.remove(&id);
        Ok(())
    }

    async fn add_client_scope_client_mapping(
        &mut self,
        client_id: Uuid,
        scope_id: Uuid,
        default_scope: bool,
    ) -> StorageResult<()> {
        let state = &mut self.working;
        if !state.clients.contains_key(&client_id) {
            return Err(StorageError::not_found("Client", client_id));
        }
        if !state.client_scopes.contains_key(&scope_id) {
            return Err(StorageError::not_found("ClientScope", scope_id));
        }
        let rows = &mut state.client_scope_client_mappings;
        if !rows.iter().any(|(c, s, _)| *c == client_id && *s == scope_id) {
            rows.push((client_id, scope_id, default_scope));
        }
        Ok(())
    }

    async fn delete_client_scope_client_mappings_by_client(
        &mut self,
        client_id: Uuid,
    ) -> StorageResult<u64> {
        let rows = &mut self.working.client_scope_client_mappings;
        let before = rows.len();
        rows.retain(|(c, _, _)| *c != client_id);
        Ok(removed(before, rows.len()))
    }

    async fn set_authorization_settings(
        &mut self,
        client_id: Uuid,
        settings: &Value,
    ) -> StorageResult<()> {
        if !self.working.clients.contains_key(&client_id) {
            return Err(StorageError::not_found("Client", client_id));
        }
        self.working
            .authorization
            .insert(client_id, settings.clone());
        Ok(())
    }

    async fn get_authorization_settings(
        &mut self,
        client_id: Uuid,
    ) -> StorageResult<Option<Value>> {
        Ok(self.working.authorization.get(&client_id).cloned())
    }
}

#[async_trait]
impl ClientScopeStore for MemoryTransaction {
    async fn list_client_scope_ids(&mut self, realm_id: Uuid) -> StorageResult<Vec<Uuid>> {
        Ok(self
            .working
            .client_scopes
            .values()
            .filter(|s| s.realm_id == realm_id)
            .map(|s| s.id)
            .collect())
    }

    async fn list_client_scopes(&mut self, realm_id: Uuid) -> StorageResult<Vec<ClientScope>> {
        Ok(self
            .working
            .client_scopes
            .values()
            .filter(|s| s.realm_id == realm_id)
            .cloned()
            .collect())
    }

    async fn lock_client_scope(&mut self, id: Uuid) -> StorageResult<Option<ClientScope>> {
        Ok(self.working.client_scopes.get(&id).cloned())
    }

    async fn create_client_scope(&mut self, scope: &ClientScope) -> StorageResult<()> {
        let state = &mut self.working;
        state.require_realm(scope.realm_id)?;
        if state.client_scopes.contains_key(&scope.id)
            || state
                .client_scopes
                .values()
                .any(|s| s.realm_id == scope.realm_id && s.name == scope.name)
        {
            return Err(StorageError::duplicate("ClientScope", "name", &scope.name));
        }
        state.client_scopes.insert(scope.id, scope.clone());
        Ok(())
    }

    async fn delete_client_scope(&mut self, id: Uuid) -> StorageResult<()> {
        let state = &mut self.working;
        if !state.client_scopes.contains_key(&id) {
            return Err(StorageError::not_found("ClientScope", id));
        }
        if state
            .realm_default_client_scopes
            .iter()
            .any(|(_, s, _)| *s == id)
        {
            return Err(StorageError::referenced(
                "ClientScope",
                id,
                "realm_default_client_scopes",
            ));
        }
        if state
            .client_scope_client_mappings
            .iter()
            .any(|(_, s, _)| *s == id)
        {
            return Err(StorageError::referenced(
                "ClientScope",
                id,
                "client_scope_client_mappings",
            ));
        }
        if state.client_scope_role_mappings.iter().any(|(s, _)| *s == id) {
            return Err(StorageError::referenced(
                "ClientScope",
                id,
                "client_scope_role_mappings",
            ));
        }
        state.client_scopes.remove(&id);
        Ok(())
    }

    async fn add_realm_default_client_scope(
        &mut self,
        realm_id: Uuid,
        scope_id: Uuid,
        default_scope: bool,
    ) -> StorageResult<()> {
        let state = &mut self.working;
        state.require_realm(realm_id)?;
        if !state.client_scopes.contains_key(&scope_id) {
            return Err(StorageError::not_found("ClientScope", scope_id));
        }
        let rows = &mut state.realm_default_client_scopes;
        if !rows.iter().any(|(r, s, _)| *r == realm_id && *s == scope_id) {
            rows.push((realm_id, scope_id, default_scope));
        }
        Ok(())
    }

    async fn remove_realm_default_client_scope(
        &mut self,
        realm_id: Uuid,
        scope_id: Uuid,
    ) -> StorageResult<u64> {
        let rows = &mut self.working.realm_default_client_scopes;
        let before = rows.len();
        rows.retain(|(r, s, _)| !(*r == realm_id && *s == scope_id));
        Ok(removed(before, rows.len()))
    }

    async fn delete_realm_default_client_scopes(&mut self, realm_id: Uuid) -> StorageResult<u64> {
        let rows = &mut self.working.realm_default_client_scopes;
        let before = rows.len();
        rows.retain(|(r, _, _)| *r != realm_id);
        Ok(removed(before, rows.len()))
    }

    async fn delete_client_scope_client_mappings_by_scope(
        &mut self,
        scope_id: Uuid,
    ) -> StorageResult<u64> {
        let rows = &mut self.working.client_scope_client_mappings;
        let before = rows.len();
        rows.retain(|(_, s, _)| *s != scope_id);
        Ok(removed(before, rows.len()))
    }

    async fn add_client_scope_role_mapping(
        &mut self,
        scope_id: Uuid,
        role_id: Uuid,
    ) -> StorageResult<()> {
        let state = &mut self.working;
        if !state.client_scopes.contains_key(&scope_id) {
            return Err(StorageError::not_found("ClientScope", scope_id));
        }
        if !state.roles.contains_key(&role_id) {
            return Err(StorageError::not_found("Role", role_id));
        }
        state.client_scope_role_mappings.insert((scope_id, role_id));
        Ok(())
    }

    async fn list_client_scope_role_ids(&mut self, scope_id: Uuid) -> StorageResult<Vec<Uuid>> {
        Ok(self
            .working
            .client_scope_role_mappings
            .iter()
            .filter(|(s, _)| *s == scope_id)
            .map(|(_, r)| *r)
            .collect())
    }

    async fn delete_client_scope_role_mappings_by_scope(
        &mut self,
        scope_id: Uuid,
    ) -> StorageResult<u64> {
        let rows = &mut self.working.client_scope_role_mappings;
        let before = rows.len();
        rows.retain(|(s, _)| *s != scope_id);
        Ok(removed(before, rows.len()))
    }
}

#[async_trait]
impl RoleStore for MemoryTransaction {
    async fn list_roles(&mut self, realm_id: Uuid) -> StorageResult<Vec<Role>> {
        Ok(self
            .working
            .roles
            .values()
            .filter(|r| r.realm_id == realm_id)
            .cloned()
            .collect())
    }

    async fn list_realm_roles(&mut self, realm_id: Uuid) -> StorageResult<Vec<Role>> {
        Ok(self
            .working
            .roles
            .values()
            .filter(|r| r.realm_id == realm_id && r.is_realm_role())
            .cloned()
            .collect())
    }

    async fn list_client_roles(&mut self, client_id: Uuid) -> StorageResult<Vec<Role>> {
        Ok(self
            .working
            .roles
            .values()
            .filter(|r| r.client_id == Some(client_id))
            .cloned()
            .collect())
    }

    async fn find_realm_role_by_name(
        &mut self,
        realm_id: Uuid,
        name: &str,
    ) -> StorageResult<Option<Role>> {
        Ok(self
            .working
            .roles
            .values()
            .find(|r| r.realm_id == realm_id && r.is_realm_role() && r.name == name)
            .cloned())
    }

    async fn find_client_role_by_name(
        &mut self,
        client_id: Uuid,
        name: &str,
    ) -> StorageResult<Option<Role>> {
        Ok(self
            .working
            .roles
            .values()
            .find(|r| r.client_id == Some(client_id) && r.name == name)
            .cloned())
    }

    async fn create_role(&mut self, role: &Role) -> StorageResult<()> {
        let state = &mut self.working;
        state.require_realm(role.realm_id)?;
        if let Some(client_id) = role.client_id {
            if !state.clients.contains_key(&client_id) {
                return Err(StorageError::not_found("Client", client_id));
            }
        }
        if state.roles.contains_key(&role.id)
            || state.roles.values().any(|r| {
                r.realm_id == role.realm_id && r.client_id == role.client_id && r.name == role.name
            })
        {
            return Err(StorageError::duplicate("Role", "name", &role.name));
        }
        state.roles.insert(role.id, role.clone());
        Ok(())
    }

    async fn delete_role(&mut self, id: Uuid) -> StorageResult<()> {
        let state = &mut self.working;
        if !state.roles.contains_key(&id) {
            return Err(StorageError::not_found("Role", id));
        }
        if state.composite_roles.iter().any(|(_, child)| *child == id) {
            return Err(StorageError::referenced("Role", id, "composite_roles"));
        }
        if state.client_scope_role_mappings.iter().any(|(_, r)| *r == id) {
            return Err(StorageError::referenced(
                "Role",
                id,
                "client_scope_role_mappings",
            ));
        }
        if state.group_role_mappings.iter().any(|(_, r)| *r == id) {
            return Err(StorageError::referenced("Role", id, "group_role_mappings"));
        }
        state.composite_roles.retain(|(parent, _)| *parent != id);
        state.roles.remove(&id);
        Ok(())
    }

    async fn add_composite(&mut self, parent_id: Uuid, child_id: Uuid) -> StorageResult<()> {
        let state = &mut self.working;
        for id in [parent_id, child_id] {
            if !state.roles.contains_key(&id) {
                return Err(StorageError::not_found("Role", id));
            }
        }
        state.composite_roles.insert((parent_id, child_id));
        Ok(())
    }

    async fn list_composite_ids(&mut self, parent_id: Uuid) -> StorageResult<Vec<Uuid>> {
        Ok(self
            .working
            .composite_roles
            .iter()
            .filter(|(p, _)| *p == parent_id)
            .map(|(_, c)| *c)
            .collect())
    }

    async fn delete_composites_by_child(&mut self, child_id: Uuid) -> StorageResult<u64> {
        let rows = &mut self.working.composite_roles;
        let before = rows.len();
        rows.retain(|(_, c)| *c != child_id);
        Ok(removed(before, rows.len()))
    }

    async fn delete_client_scope_role_mappings_by_role(
        &mut self,
        role_id: Uuid,
    ) -> StorageResult<u64> {
        let rows = &mut self.working.client_scope_role_mappings;
        let before = rows.len();
        rows.retain(|(_, r)| *r != role_id);
        Ok(removed(before, rows.len()))
    }
}

#[async_trait]
impl GroupStore for MemoryTransaction {
    async fn list_groups(&mut self, realm_id: Uuid) -> StorageResult<Vec<Group>> {
        Ok(self
            .working
            .groups
            .values()
            .filter(|g| g.realm_id == realm_id)
            .cloned()
            .collect())
    }

    async fn list_group_ids_by_parent(
        &mut self,
        realm_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> StorageResult<Vec<Uuid>> {
        Ok(self
            .working
            .groups
            .values()
            .filter(|g| g.realm_id == realm_id && g.parent_id == parent_id)
            .map(|g| g.id)
            .collect())
    }

    async fn find_group_by_name(
        &mut self,
        realm_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> StorageResult<Option<Group>> {
        Ok(self
            .working
            .groups
            .values()
            .find(|g| g.realm_id == realm_id && g.parent_id == parent_id && g.name == name)
            .cloned())
    }

    async fn get_group(&mut self, id: Uuid) -> StorageResult<Option<Group>> {
        Ok(self.working.groups.get(&id).cloned())
    }

    async fn lock_group(&mut self, id: Uuid) -> StorageResult<Option<Group>> {
        Ok(self.working.groups.get(&id).cloned())
    }

    async fn create_group(&mut self, group: &Group) -> StorageResult<()> {
        let state = &mut self.working;
        state.require_realm(group.realm_id)?;
        if state.groups.contains_key(&group.id)
            || state.groups.values().any(|g| {
                g.realm_id == group.realm_id
                    && g.parent_id == group.parent_id
                    && g.name == group.name
            })
        {
            return Err(StorageError::duplicate("Group", "name", &group.name));
        }
        state.groups.insert(group.id, group.clone());
        Ok(())
    }

    async fn delete_group(&mut self, id: Uuid) -> StorageResult<()> {
        let state = &mut self.working;
        if !state.groups.contains_key(&id) {
            return Err(StorageError::not_found("Group", id));
        }
        if state.group_role_mappings.iter().any(|(g, _)| *g == id) {
            return Err(StorageError::referenced("Group", id, "group_role_mappings"));
        }
        if state.realm_default_groups.iter().any(|(_, g)| *g == id) {
            return Err(StorageError::referenced("Group", id, "realm_default_groups"));
        }
        state.groups.remove(&id);
        Ok(())
    }

    async fn grant_group_role(&mut self, group_id: Uuid, role_id: Uuid) -> StorageResult<()> {
        let state = &mut self.working;
        if !state.groups.contains_key(&group_id) {
            return Err(StorageError::not_found("Group", group_id));
        }
        if !state.roles.contains_key(&role_id) {
            return Err(StorageError::not_found("Role", role_id));
        }
        state.group_role_mappings.insert((group_id, role_id));
        Ok(())
    }

    async fn list_group_role_ids(&mut self, group_id: Uuid) -> StorageResult<Vec<Uuid>> {
        Ok(self
            .working
            .group_role_mappings
            .iter()
            .filter(|(g, _)| *g == group_id)
            .map(|(_, r)| *r)
            .collect())
    }

    async fn delete_group_role_mappings_by_realm(&mut self, realm_id: Uuid) -> StorageResult<u64> {
        let state = &mut self.working;
        let groups = &state.groups;
        let before = state.group_role_mappings.len();
        state
            .group_role_mappings
            .retain(|(g, _)| groups.get(g).is_none_or(|group| group.realm_id != realm_id));
        Ok(removed(before, state.group_role_mappings.len()))
    }

    async fn delete_group_role_mappings_by_group(&mut self, group_id: Uuid) -> StorageResult<u64> {
        let rows = &mut self.working.group_role_mappings;
        let before = rows.len();
        rows.retain(|(g, _)| *g != group_id);
        Ok(removed(before, rows.len()))
    }
}

#[async_trait]
impl UserStore for MemoryTransaction {
    async fn find_user_by_username(
        &mut self,
        realm_id: Uuid,
        username: &str,
    ) -> StorageResult<Option<User>> {
        Ok(self
            .working
            .users
            .values()
            .find(|u| u.realm_id == realm_id && u.username == username)
            .cloned())
    }

    async fn get_user(&mut self, id: Uuid) -> StorageResult<Option<User>> {
        Ok(self.working.users.get(&id).cloned())
    }

    async fn list_users(&mut self, realm_id: Uuid) -> StorageResult<Vec<User>> {
        Ok(self
            .working
            .users
            .values()
            .filter(|u| u.realm_id == realm_id)
            .cloned()
            .collect())
    }

    async fn create_user(&mut self, user: &User) -> StorageResult<()> {
        let state = &mut self.working;
        if state.users.contains_key(&user.id)
            || state
                .users
                .values()
                .any(|u| u.realm_id == user.realm_id && u.username == user.username)
        {
            return Err(StorageError::duplicate("User", "username", &user.username));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user(&mut self, id: Uuid) -> StorageResult<()> {
        let state = &mut self.working;
        if state.users.remove(&id).is_none() {
            return Err(StorageError::not_found("User", id));
        }
        state.role_mappings.retain(|m| m.user_id != id);
        state.group_memberships.retain(|m| m.user_id != id);
        Ok(())
    }

    async fn link_service_account(
        &mut self,
        user_id: Uuid,
        client_id: Uuid,
    ) -> StorageResult<()> {
        let user = self
            .working
            .users
            .get_mut(&user_id)
            .ok_or_else(|| StorageError::not_found("User", user_id))?;
        user.service_account_client_link = Some(client_id);
        Ok(())
    }

    async fn grant_role(&mut self, user_id: Uuid, role_id: Uuid) -> StorageResult<()> {
        if !self.working.users.contains_key(&user_id) {
            return Err(StorageError::not_found("User", user_id));
        }
        self.working
            .role_mappings
            .insert(RoleMapping::new(user_id, role_id));
        Ok(())
    }

    async fn join_group(&mut self, user_id: Uuid, group_id: Uuid) -> StorageResult<()> {
        if !self.working.users.contains_key(&user_id) {
            return Err(StorageError::not_found("User", user_id));
        }
        self.working
            .group_memberships
            .insert(GroupMembership::new(user_id, group_id));
        Ok(())
    }

    async fn list_role_mappings(&mut self, user_id: Uuid) -> StorageResult<Vec<Uuid>> {
        Ok(self
            .working
            .role_mappings
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.role_id)
            .collect())
    }

    async fn list_group_memberships(&mut self, user_id: Uuid) -> StorageResult<Vec<Uuid>> {
        Ok(self
            .working
            .group_memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.group_id)
            .collect())
    }

    async fn delete_role_mappings_by_user(&mut self, user_id: Uuid) -> StorageResult<u64> {
        let rows = &mut self.working.role_mappings;
        let before = rows.len();
        rows.retain(|m| m.user_id != user_id);
        Ok(removed(before, rows.len()))
    }

    async fn delete_group_memberships_by_user(&mut self, user_id: Uuid) -> StorageResult<u64> {
        let rows = &mut self.working.group_memberships;
        let before = rows.len();
        rows.retain(|m| m.user_id != user_id);
        Ok(removed(before, rows.len()))
    }
}

#[async_trait]
impl MembershipStore for MemoryTransaction {
    async fn repoint_role_mappings(
        &mut self,
        old_role_id: Uuid,
        new_role_id: Uuid,
    ) -> StorageResult<u64> {
        let rows = &mut self.working.role_mappings;
        let movable: Vec<RoleMapping> = rows
            .iter()
            .filter(|m| {
                m.role_id == old_role_id && !rows.contains(&RoleMapping::new(m.user_id, new_role_id))
            })
            .copied()
            .collect();
        for mapping in &movable {
            rows.remove(mapping);
            rows.insert(RoleMapping::new(mapping.user_id, new_role_id));
        }
        Ok(movable.len() as u64)
    }

    async fn repoint_group_memberships(
        &mut self,
        old_group_id: Uuid,
        new_group_id: Uuid,
    ) -> StorageResult<u64> {
        let rows = &mut self.working.group_memberships;
        let movable: Vec<GroupMembership> = rows
            .iter()
            .filter(|m| {
                m.group_id == old_group_id
                    && !rows.contains(&GroupMembership::new(m.user_id, new_group_id))
            })
            .copied()
            .collect();
        for membership in &movable {
            rows.remove(membership);
            rows.insert(GroupMembership::new(membership.user_id, new_group_id));
        }
        Ok(movable.len() as u64)
    }

    async fn delete_orphan_role_mappings(&mut self) -> StorageResult<u64> {
        let state = &mut self.working;
        let roles = &state.roles;
        let before = state.role_mappings.len();
        state.role_mappings.retain(|m| roles.contains_key(&m.role_id));
        Ok(removed(before, state.role_mappings.len()))
    }

    async fn delete_orphan_group_memberships(&mut self) -> StorageResult<u64> {
        let state = &mut self.working;
        let groups = &state.groups;
        let before = state.group_memberships.len();
        state
            .group_memberships
            .retain(|m| groups.contains_key(&m.group_id));
        Ok(removed(before, state.group_memberships.len()))
    }
}
