//! User storage trait.

use async_trait::async_trait;
use kc_model::User;
use uuid::Uuid;

use crate::error::StorageResult;

/// User rows and their association rows.
#[async_trait]
pub trait UserStore: Send {
    /// Gets a user by username within a realm.
    async fn find_user_by_username(
        &mut self,
        realm_id: Uuid,
        username: &str,
    ) -> StorageResult<Option<User>>;

    /// Gets a user by ID.
    async fn get_user(&mut self, id: Uuid) -> StorageResult<Option<User>>;

    /// Lists every user of a realm.
    async fn list_users(&mut self, realm_id: Uuid) -> StorageResult<Vec<User>>;

    /// Creates a new user.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if the username is taken in the
    /// realm.
    async fn create_user(&mut self, user: &User) -> StorageResult<()>;

    /// Deletes a user row.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the user doesn't exist.
    async fn delete_user(&mut self, id: Uuid) -> StorageResult<()>;

    /// Points the service account link of a user at a client.
    async fn link_service_account(&mut self, user_id: Uuid, client_id: Uuid)
    -> StorageResult<()>;

    /// Grants a role to a user.
    async fn grant_role(&mut self, user_id: Uuid, role_id: Uuid) -> StorageResult<()>;

    /// Adds a user to a group.
    async fn join_group(&mut self, user_id: Uuid, group_id: Uuid) -> StorageResult<()>;

    /// Lists the role ids mapped to a user.
    async fn list_role_mappings(&mut self, user_id: Uuid) -> StorageResult<Vec<Uuid>>;

    /// Lists the group ids a user is a member of.
    async fn list_group_memberships(&mut self, user_id: Uuid) -> StorageResult<Vec<Uuid>>;

    /// Deletes every role mapping of a user.
    async fn delete_role_mappings_by_user(&mut self, user_id: Uuid) -> StorageResult<u64>;

    /// Deletes every group membership of a user.
    async fn delete_group_memberships_by_user(&mut self, user_id: Uuid) -> StorageResult<u64>;
}
