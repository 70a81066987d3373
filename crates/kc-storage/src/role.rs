//! Role storage trait.

use async_trait::async_trait;
use kc_model::Role;
use uuid::Uuid;

use crate::error::StorageResult;

/// Role rows and the composite relation.
#[async_trait]
pub trait RoleStore: Send {
    /// Lists every role of a realm, realm and client roles alike.
    async fn list_roles(&mut self, realm_id: Uuid) -> StorageResult<Vec<Role>>;

    /// Lists the realm roles of a realm.
    async fn list_realm_roles(&mut self, realm_id: Uuid) -> StorageResult<Vec<Role>>;

    /// Lists the roles owned by a client.
    async fn list_client_roles(&mut self, client_id: Uuid) -> StorageResult<Vec<Role>>;

    /// Gets a realm role by name.
    async fn find_realm_role_by_name(
        &mut self,
        realm_id: Uuid,
        name: &str,
    ) -> StorageResult<Option<Role>>;

    /// Gets a client role by name.
    async fn find_client_role_by_name(
        &mut self,
        client_id: Uuid,
        name: &str,
    ) -> StorageResult<Option<Role>>;

    /// Creates a new role.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if a role with the same name exists
    /// in the same scope (realm or client).
    async fn create_role(&mut self, role: &Role) -> StorageResult<()>;

    /// Deletes a role row. Composite rows where it is the parent go with it.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Referenced` while it is the child of a
    /// composite, mapped into a client scope, or granted to a group.
    async fn delete_role(&mut self, id: Uuid) -> StorageResult<()>;

    /// Adds `child_id` to the composite role `parent_id`.
    async fn add_composite(&mut self, parent_id: Uuid, child_id: Uuid) -> StorageResult<()>;

    /// Lists the children of a composite role.
    async fn list_composite_ids(&mut self, parent_id: Uuid) -> StorageResult<Vec<Uuid>>;

    /// Deletes every composite row in which the role is the child.
    async fn delete_composites_by_child(&mut self, child_id: Uuid) -> StorageResult<u64>;

    /// Deletes every client scope mapping of the role.
    async fn delete_client_scope_role_mappings_by_role(&mut self, role_id: Uuid)
    -> StorageResult<u64>;
}
