//! Identity remapping of user association rows.
//!
//! Before teardown the realm's roles and groups are captured by natural
//! key. After rebuild the same capture is taken again, and every old id is
//! paired with the new id of the same-keyed object. User role mappings and
//! group memberships are then re-pointed from old to new ids, and rows left
//! pointing at objects that no longer exist are swept.

use std::collections::{BTreeMap, HashMap};

use kc_model::RoleKey;
use kc_storage::StoreTransaction;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ImportResult;

/// Roles of a realm keyed by [`RoleKey`].
#[derive(Debug, Clone, Default)]
pub struct RoleSnapshot {
    entries: BTreeMap<RoleKey, Vec<Uuid>>,
}

impl RoleSnapshot {
    /// Captures every realm and client role of a realm.
    ///
    /// ## Errors
    ///
    /// Returns storage errors.
    pub async fn capture(tx: &mut dyn StoreTransaction, realm_id: Uuid) -> ImportResult<Self> {
        let owners: HashMap<Uuid, String> = tx
            .list_clients(realm_id)
            .await?
            .into_iter()
            .map(|client| (client.id, client.client_id))
            .collect();

        let mut snapshot = Self::default();
        for role in tx.list_roles(realm_id).await? {
            let key = match role.client_id {
                None => RoleKey::realm(role.name),
                Some(client) => match owners.get(&client) {
                    Some(client_id) => RoleKey::client(client_id.clone(), role.name),
                    None => {
                        warn!(role = %role.id, client = %client, "Role owned by unknown client");
                        continue;
                    }
                },
            };
            snapshot.insert(key, role.id);
        }
        Ok(snapshot)
    }

    /// Adds a role.
    pub fn insert(&mut self, key: RoleKey, id: Uuid) {
        self.entries.entry(key).or_default().push(id);
    }

    /// Ids recorded under `key`.
    #[must_use]
    pub fn get(&self, key: &RoleKey) -> &[Uuid] {
        self.entries.get(key).map_or(&[], Vec::as_slice)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks if the snapshot holds no role.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pairs every role of `self` with the role of `after` holding the same
    /// key and a different id.
    ///
    /// When `after` holds several roles for one key, the first is used.
    #[must_use]
    pub fn correspondence(&self, after: &Self) -> Vec<(RoleKey, Uuid, Uuid)> {
        correspond(&self.entries, &after.entries)
    }
}

/// Groups of a realm keyed by name.
#[derive(Debug, Clone, Default)]
pub struct GroupSnapshot {
    entries: BTreeMap<String, Vec<Uuid>>,
}

impl GroupSnapshot {
    /// Captures every group of a realm.
    ///
    /// ## Errors
    ///
    /// Returns storage errors.
    pub async fn capture(tx: &mut dyn StoreTransaction, realm_id: Uuid) -> ImportResult<Self> {
        let mut snapshot = Self::default();
        for group in tx.list_groups(realm_id).await? {
            snapshot.insert(group.name, group.id);
        }
        Ok(snapshot)
    }

    /// Adds a group.
    pub fn insert(&mut self, name: impl Into<String>, id: Uuid) {
        self.entries.entry(name.into()).or_default().push(id);
    }

    /// Number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks if the snapshot holds no group.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pairs every group of `self` with the group of `after` holding the
    /// same name and a different id.
    #[must_use]
    pub fn correspondence(&self, after: &Self) -> Vec<(String, Uuid, Uuid)> {
        correspond(&self.entries, &after.entries)
    }
}

fn correspond<K>(before: &BTreeMap<K, Vec<Uuid>>, after: &BTreeMap<K, Vec<Uuid>>) -> Vec<(K, Uuid, Uuid)>
where
    K: Ord + Clone + std::fmt::Display,
{
    let mut pairs = Vec::new();
    for (key, old_ids) in before {
        let Some(new_ids) = after.get(key) else {
            continue;
        };
        if new_ids.len() > 1 {
            warn!(key = %key, candidates = new_ids.len(), "Ambiguous natural key, using first match");
        }
        for old_id in old_ids {
            if let Some(new_id) = new_ids.iter().find(|id| *id != old_id) {
                pairs.push((key.clone(), *old_id, *new_id));
            }
        }
    }
    pairs
}

/// Result of re-pointing association rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RemapReport {
    /// Objects whose id changed.
    pub objects: usize,
    /// Rows re-pointed.
    pub rows: u64,
}

/// Result of the orphan sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Role mappings deleted.
    pub role_mappings: u64,
    /// Group memberships deleted.
    pub group_memberships: u64,
}

/// Re-points user role mappings from the roles of `before` to the
/// same-keyed roles of `after`.
///
/// ## Errors
///
/// Returns storage errors.
pub async fn remap_role_mappings(
    tx: &mut dyn StoreTransaction,
    before: &RoleSnapshot,
    after: &RoleSnapshot,
) -> ImportResult<RemapReport> {
    let mut report = RemapReport::default();
    for (key, old_id, new_id) in before.correspondence(after) {
        let rows = tx.repoint_role_mappings(old_id, new_id).await?;
        debug!(role = %key, %old_id, %new_id, rows, "Role id changed");
        report.objects += 1;
        report.rows += rows;
    }
    Ok(report)
}

/// Re-points user group memberships from the groups of `before` to the
/// same-named groups of `after`.
///
/// ## Errors
///
/// Returns storage errors.
pub async fn remap_group_memberships(
    tx: &mut dyn StoreTransaction,
    before: &GroupSnapshot,
    after: &GroupSnapshot,
) -> ImportResult<RemapReport> {
    let mut report = RemapReport::default();
    for (name, old_id, new_id) in before.correspondence(after) {
        let rows = tx.repoint_group_memberships(old_id, new_id).await?;
        debug!(group = %name, %old_id, %new_id, rows, "Group id changed");
        report.objects += 1;
        report.rows += rows;
    }
    Ok(report)
}

/// Deletes role mappings and group memberships whose target no longer
/// exists, across all realms.
///
/// ## Errors
///
/// Returns storage errors.
pub async fn sweep_orphans(tx: &mut dyn StoreTransaction) -> ImportResult<SweepReport> {
    let report = SweepReport {
        role_mappings: tx.delete_orphan_role_mappings().await?,
        group_memberships: tx.delete_orphan_group_memberships().await?,
    };
    if report.role_mappings > 0 || report.group_memberships > 0 {
        debug!(?report, "Orphaned associations removed");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use kc_model::{Group, Realm, Role, User};
    use kc_storage::{MemoryStore, Store};

    use super::*;

    #[test]
    fn pairs_roles_by_name_and_owner() {
        let (old_viewer, new_viewer) = (Uuid::now_v7(), Uuid::now_v7());
        let (old_edit, new_edit) = (Uuid::now_v7(), Uuid::now_v7());
        let removed = Uuid::now_v7();

        let mut before = RoleSnapshot::default();
        before.insert(RoleKey::realm("viewer"), old_viewer);
        before.insert(RoleKey::client("web", "viewer"), old_edit);
        before.insert(RoleKey::realm("legacy"), removed);

        let mut after = RoleSnapshot::default();
        after.insert(RoleKey::realm("viewer"), new_viewer);
        after.insert(RoleKey::client("web", "viewer"), new_edit);

        let pairs = before.correspondence(&after);

        assert_eq!(pairs.len(), 2);
        assert!(pairs.contains(&(RoleKey::realm("viewer"), old_viewer, new_viewer)));
        assert!(pairs.contains(&(RoleKey::client("web", "viewer"), old_edit, new_edit)));
    }

    #[test]
    fn unchanged_ids_are_not_paired() {
        let id = Uuid::now_v7();
        let mut before = GroupSnapshot::default();
        before.insert("staff", id);

        assert!(before.correspondence(&before.clone()).is_empty());
    }

    #[test]
    fn duplicate_keys_use_first_candidate() {
        let old = Uuid::now_v7();
        let (first, second) = (Uuid::now_v7(), Uuid::now_v7());
        let mut before = GroupSnapshot::default();
        before.insert("admins", old);
        let mut after = GroupSnapshot::default();
        after.insert("admins", first);
        after.insert("admins", second);

        assert_eq!(
            before.correspondence(&after),
            vec![("admins".to_string(), old, first)]
        );
    }

    #[tokio::test]
    async fn remaps_and_sweeps_association_rows() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let realm = Realm::new("acme");
        tx.create_realm(&realm).await.unwrap();

        let old_role = Role::new_realm_role(realm.id, "viewer");
        let gone_role = Role::new_realm_role(realm.id, "legacy");
        let old_group = Group::new(realm.id, "staff");
        tx.create_role(&old_role).await.unwrap();
        tx.create_role(&gone_role).await.unwrap();
        tx.create_group(&old_group).await.unwrap();

        let alice = User::new(realm.id, "alice");
        tx.create_user(&alice).await.unwrap();
        tx.grant_role(alice.id, old_role.id).await.unwrap();
        tx.grant_role(alice.id, gone_role.id).await.unwrap();
        tx.join_group(alice.id, old_group.id).await.unwrap();

        let roles_before = RoleSnapshot::capture(tx.as_mut(), realm.id).await.unwrap();
        let groups_before = GroupSnapshot::capture(tx.as_mut(), realm.id).await.unwrap();
        assert_eq!(roles_before.len(), 2);
        assert_eq!(groups_before.len(), 1);

        for id in [old_role.id, gone_role.id] {
            tx.delete_role(id).await.unwrap();
        }
        tx.delete_group(old_group.id).await.unwrap();
        let new_role = Role::new_realm_role(realm.id, "viewer");
        let new_group = Group::new(realm.id, "staff");
        tx.create_role(&new_role).await.unwrap();
        tx.create_group(&new_group).await.unwrap();

        let roles_after = RoleSnapshot::capture(tx.as_mut(), realm.id).await.unwrap();
        let groups_after = GroupSnapshot::capture(tx.as_mut(), realm.id).await.unwrap();

        let roles = remap_role_mappings(tx.as_mut(), &roles_before, &roles_after)
            .await
            .unwrap();
        let groups = remap_group_memberships(tx.as_mut(), &groups_before, &groups_after)
            .await
            .unwrap();
        let swept = sweep_orphans(tx.as_mut()).await.unwrap();

        assert_eq!(roles, RemapReport { objects: 1, rows: 1 });
        assert_eq!(groups, RemapReport { objects: 1, rows: 1 });
        assert_eq!(swept.role_mappings, 1);
        assert_eq!(swept.group_memberships, 0);
        assert_eq!(tx.list_role_mappings(alice.id).await.unwrap(), vec![new_role.id]);
        assert_eq!(tx.list_group_memberships(alice.id).await.unwrap(), vec![new_group.id]);
    }
}
