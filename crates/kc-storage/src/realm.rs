//! Realm storage trait.

use async_trait::async_trait;
use kc_model::{ClientInitialAccess, Realm};
use uuid::Uuid;

use crate::error::StorageResult;

/// Realm rows and the realm-scoped rows hanging directly off them.
#[async_trait]
pub trait RealmStore: Send {
    /// Gets a realm by name.
    async fn find_realm_by_name(&mut self, name: &str) -> StorageResult<Option<Realm>>;

    /// Loads a realm and takes a pessimistic write lock on it.
    async fn lock_realm(&mut self, id: Uuid) -> StorageResult<Option<Realm>>;

    /// Creates a new realm.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if a realm with the same name or id
    /// exists.
    async fn create_realm(&mut self, realm: &Realm) -> StorageResult<()>;

    /// Deletes a realm row.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the realm doesn't exist and
    /// `StorageError::Referenced` while clients, scopes, roles, groups or
    /// registration tokens still belong to it.
    async fn delete_realm(&mut self, id: Uuid) -> StorageResult<()>;

    /// Lists the ids of the realm's default groups.
    async fn list_default_group_ids(&mut self, realm_id: Uuid) -> StorageResult<Vec<Uuid>>;

    /// Marks a group as a default group of the realm.
    async fn add_default_group(&mut self, realm_id: Uuid, group_id: Uuid) -> StorageResult<()>;

    /// Removes the default designation of a group. Returns rows removed.
    async fn remove_default_group(&mut self, realm_id: Uuid, group_id: Uuid)
    -> StorageResult<u64>;

    /// Removes every default group designation of the realm.
    async fn clear_default_groups(&mut self, realm_id: Uuid) -> StorageResult<u64>;

    /// Stores a client registration token.
    async fn create_client_initial_access(
        &mut self,
        access: &ClientInitialAccess,
    ) -> StorageResult<()>;

    /// Deletes every client registration token of the realm.
    async fn delete_client_initial_access_by_realm(&mut self, realm_id: Uuid)
    -> StorageResult<u64>;
}
