//! Realm structure teardown.
//!
//! Deletes every structural object of a realm in dependency order inside
//! the caller's transaction. User rows and their association rows are left
//! alone; the association rows keep pointing at the deleted ids until they
//! are re-pointed or swept.

use kc_model::Group;
use kc_storage::StoreTransaction;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ImportResult;
use crate::events::RealmEventBus;

/// Counts of what a teardown deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    /// Default group designations removed.
    pub default_groups: u64,
    /// Group role grants removed.
    pub group_role_mappings: u64,
    /// Clients deleted.
    pub clients: usize,
    /// Client roles deleted.
    pub client_roles: usize,
    /// Client scopes deleted.
    pub client_scopes: usize,
    /// Realm roles deleted.
    pub realm_roles: usize,
    /// Groups deleted.
    pub groups: usize,
    /// Client registration tokens deleted.
    pub initial_access: u64,
}

/// Deletes realm structure, publishing lifecycle events on the way.
#[derive(Debug, Clone, Copy)]
pub struct RealmTeardown<'a> {
    events: &'a RealmEventBus,
}

impl<'a> RealmTeardown<'a> {
    /// Creates a teardown publishing to `events`.
    #[must_use]
    pub const fn new(events: &'a RealmEventBus) -> Self {
        Self { events }
    }

    /// Deletes the structure and the row of the realm `realm_id`.
    ///
    /// Returns `None` if the realm does not exist.
    ///
    /// ## Errors
    ///
    /// Returns storage and listener errors. The caller must roll back.
    pub async fn remove_realm(
        &self,
        tx: &mut dyn StoreTransaction,
        realm_id: Uuid,
    ) -> ImportResult<Option<TeardownReport>> {
        let Some(realm) = tx.lock_realm(realm_id).await? else {
            return Ok(None);
        };
        info!(realm = %realm.name, "Removing realm structure");
        let mut report = TeardownReport {
            default_groups: tx.clear_default_groups(realm.id).await?,
            group_role_mappings: tx.delete_group_role_mappings_by_realm(realm.id).await?,
            ..TeardownReport::default()
        };

        for client_id in tx.list_client_ids(realm.id).await? {
            report.client_roles += self.remove_client(tx, client_id).await?;
            report.clients += 1;
        }

        tx.delete_realm_default_client_scopes(realm.id).await?;
        for scope_id in tx.list_client_scope_ids(realm.id).await? {
            if remove_client_scope(tx, realm.id, scope_id).await? {
                report.client_scopes += 1;
            }
        }

        for role in tx.list_realm_roles(realm.id).await? {
            remove_role(tx, role.id).await?;
            report.realm_roles += 1;
        }

        report.groups = remove_groups(tx, realm.id).await?;
        report.initial_access = tx.delete_client_initial_access_by_realm(realm.id).await?;

        tx.delete_realm(realm.id).await?;
        self.events.realm_removed(&realm, tx).await?;

        debug!(realm = %realm.name, ?report, "Realm structure removed");
        Ok(Some(report))
    }

    /// Removes a client with its roles and scope links. Returns the number
    /// of client roles deleted.
    async fn remove_client(
        &self,
        tx: &mut dyn StoreTransaction,
        client_id: Uuid,
    ) -> ImportResult<usize> {
        let Some(client) = tx.lock_client(client_id).await? else {
            return Ok(0);
        };
        self.events.client_removed(&client, &mut *tx).await?;

        let roles = tx.list_client_roles(client.id).await?;
        for role in &roles {
            remove_role(tx, role.id).await?;
        }
        tx.delete_client_scope_client_mappings_by_client(client.id)
            .await?;
        tx.delete_client(client.id).await?;

        debug!(client_id = %client.client_id, roles = roles.len(), "Client removed");
        Ok(roles.len())
    }
}

/// Removes a role after detaching it from composites and client scopes.
pub(crate) async fn remove_role(tx: &mut dyn StoreTransaction, role_id: Uuid) -> ImportResult<()> {
    tx.delete_composites_by_child(role_id).await?;
    tx.delete_client_scope_role_mappings_by_role(role_id).await?;
    tx.delete_role(role_id).await?;
    Ok(())
}

async fn remove_client_scope(
    tx: &mut dyn StoreTransaction,
    realm_id: Uuid,
    scope_id: Uuid,
) -> ImportResult<bool> {
    let Some(scope) = tx.lock_client_scope(scope_id).await? else {
        return Ok(false);
    };
    tx.remove_realm_default_client_scope(realm_id, scope.id)
        .await?;
    tx.delete_client_scope_client_mappings_by_scope(scope.id)
        .await?;
    tx.delete_client_scope_role_mappings_by_scope(scope.id)
        .await?;
    tx.delete_client_scope(scope.id).await?;
    Ok(true)
}

/// Removes the two-level group tree, subgroups before their parent.
/// Returns the number of groups deleted.
async fn remove_groups(tx: &mut dyn StoreTransaction, realm_id: Uuid) -> ImportResult<usize> {
    let mut top_level: Vec<Group> = Vec::new();
    for id in tx.list_group_ids_by_parent(realm_id, None).await? {
        if let Some(group) = tx.get_group(id).await? {
            top_level.push(group);
        }
    }
    top_level.sort_by(|a, b| a.name.cmp(&b.name));

    let mut removed = 0;
    for group in top_level {
        tx.remove_default_group(realm_id, group.id).await?;

        for sub_id in tx.list_group_ids_by_parent(realm_id, Some(group.id)).await? {
            let Some(sub) = tx.get_group(sub_id).await? else {
                continue;
            };
            tx.remove_default_group(realm_id, sub.id).await?;
            if remove_group(tx, sub.id).await? {
                removed += 1;
            }
        }

        if remove_group(tx, group.id).await? {
            removed += 1;
        }
    }
    Ok(removed)
}

async fn remove_group(tx: &mut dyn StoreTransaction, group_id: Uuid) -> ImportResult<bool> {
    let Some(group) = tx.lock_group(group_id).await? else {
        return Ok(false);
    };
    tx.delete_group_role_mappings_by_group(group.id).await?;
    tx.delete_group(group.id).await?;
    Ok(true)
}
