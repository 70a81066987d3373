//! Group storage trait.

use async_trait::async_trait;
use kc_model::Group;
use uuid::Uuid;

use crate::error::StorageResult;

/// Group rows and group role grants.
#[async_trait]
pub trait GroupStore: Send {
    /// Lists every group of a realm regardless of depth.
    async fn list_groups(&mut self, realm_id: Uuid) -> StorageResult<Vec<Group>>;

    /// Lists the ids of the direct children of `parent_id` (`None` lists
    /// top-level groups).
    async fn list_group_ids_by_parent(
        &mut self,
        realm_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> StorageResult<Vec<Uuid>>;

    /// Gets a group by name under `parent_id`.
    async fn find_group_by_name(
        &mut self,
        realm_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> StorageResult<Option<Group>>;

    /// Gets a group by ID.
    async fn get_group(&mut self, id: Uuid) -> StorageResult<Option<Group>>;

    /// Loads a group and takes a pessimistic write lock on it.
    async fn lock_group(&mut self, id: Uuid) -> StorageResult<Option<Group>>;

    /// Creates a new group.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if a sibling with the same name
    /// exists.
    async fn create_group(&mut self, group: &Group) -> StorageResult<()>;

    /// Deletes a group row.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Referenced` while role grants or a default
    /// designation still point at it.
    async fn delete_group(&mut self, id: Uuid) -> StorageResult<()>;

    /// Grants a role to a group.
    async fn grant_group_role(&mut self, group_id: Uuid, role_id: Uuid) -> StorageResult<()>;

    /// Lists the role ids granted to a group.
    async fn list_group_role_ids(&mut self, group_id: Uuid) -> StorageResult<Vec<Uuid>>;

    /// Deletes every group role grant within a realm.
    async fn delete_group_role_mappings_by_realm(&mut self, realm_id: Uuid) -> StorageResult<u64>;

    /// Deletes every role grant of one group.
    async fn delete_group_role_mappings_by_group(&mut self, group_id: Uuid) -> StorageResult<u64>;
}
