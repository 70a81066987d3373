//! Client and client scope storage traits.

use async_trait::async_trait;
use kc_model::{Client, ClientScope};
use serde_json::Value;
use uuid::Uuid;

use crate::error::StorageResult;

/// Client rows and client-owned association rows.
#[async_trait]
pub trait ClientStore: Send {
    /// Lists the ids of all clients in a realm.
    async fn list_client_ids(&mut self, realm_id: Uuid) -> StorageResult<Vec<Uuid>>;

    /// Lists all clients in a realm.
    async fn list_clients(&mut self, realm_id: Uuid) -> StorageResult<Vec<Client>>;

    /// Gets a client by its OAuth client identifier.
    async fn find_client_by_client_id(
        &mut self,
        realm_id: Uuid,
        client_id: &str,
    ) -> StorageResult<Option<Client>>;

    /// Loads a client and takes a pessimistic write lock on it.
    async fn lock_client(&mut self, id: Uuid) -> StorageResult<Option<Client>>;

    /// Creates a new client.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if the `client_id` is taken in the
    /// realm.
    async fn create_client(&mut self, client: &Client) -> StorageResult<()>;

    /// Deletes a client row together with its authorization settings.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Referenced` while client roles or client scope
    /// links still point at it.
    async fn delete_client(&mut self, id: Uuid) -> StorageResult<()>;

    /// Links a client scope to a client (`default` or optional).
    async fn add_client_scope_client_mapping(
        &mut self,
        client_id: Uuid,
        scope_id: Uuid,
        default_scope: bool,
    ) -> StorageResult<()>;

    /// Deletes every client scope link of a client.
    async fn delete_client_scope_client_mappings_by_client(
        &mut self,
        client_id: Uuid,
    ) -> StorageResult<u64>;

    /// Stores the authorization settings of a client, replacing any previous.
    async fn set_authorization_settings(
        &mut self,
        client_id: Uuid,
        settings: &Value,
    ) -> StorageResult<()>;

    /// Gets the authorization settings of a client.
    async fn get_authorization_settings(&mut self, client_id: Uuid)
    -> StorageResult<Option<Value>>;
}

/// Client scope rows and their association rows.
#[async_trait]
pub trait ClientScopeStore: Send {
    /// Lists the ids of all client scopes in a realm.
    async fn list_client_scope_ids(&mut self, realm_id: Uuid) -> StorageResult<Vec<Uuid>>;

    /// Lists all client scopes in a realm.
    async fn list_client_scopes(&mut self, realm_id: Uuid) -> StorageResult<Vec<ClientScope>>;

    /// Loads a client scope and takes a pessimistic write lock on it.
    async fn lock_client_scope(&mut self, id: Uuid) -> StorageResult<Option<ClientScope>>;

    /// Creates a new client scope.
    async fn create_client_scope(&mut self, scope: &ClientScope) -> StorageResult<()>;

    /// Deletes a client scope row.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Referenced` while realm default designations,
    /// client links or role mappings still point at it.
    async fn delete_client_scope(&mut self, id: Uuid) -> StorageResult<()>;

    /// Makes a client scope a realm default (`default` or optional).
    async fn add_realm_default_client_scope(
        &mut self,
        realm_id: Uuid,
        scope_id: Uuid,
        default_scope: bool,
    ) -> StorageResult<()>;

    /// Removes the realm default designation of one client scope.
    async fn remove_realm_default_client_scope(
        &mut self,
        realm_id: Uuid,
        scope_id: Uuid,
    ) -> StorageResult<u64>;

    /// Removes every realm default client scope designation.
    async fn delete_realm_default_client_scopes(&mut self, realm_id: Uuid) -> StorageResult<u64>;

    /// Deletes every client link of a client scope.
    async fn delete_client_scope_client_mappings_by_scope(
        &mut self,
        scope_id: Uuid,
    ) -> StorageResult<u64>;

    /// Maps a role into a client scope.
    async fn add_client_scope_role_mapping(
        &mut self,
        scope_id: Uuid,
        role_id: Uuid,
    ) -> StorageResult<()>;

    /// Lists the role ids mapped into a client scope.
    async fn list_client_scope_role_ids(&mut self, scope_id: Uuid) -> StorageResult<Vec<Uuid>>;

    /// Deletes every role mapping of a client scope.
    async fn delete_client_scope_role_mappings_by_scope(
        &mut self,
        scope_id: Uuid,
    ) -> StorageResult<u64>;
}
