//! `PostgreSQL` implementation of the client and client scope stores.

use async_trait::async_trait;
use kc_model::{Client, ClientScope};
use kc_storage::error::StorageResult;
use kc_storage::{ClientScopeStore, ClientStore};
use serde_json::Value;
use uuid::Uuid;

use crate::entities::{ClientRow, ClientScopeRow};
use crate::error::{from_sqlx_error, not_found};
use crate::store::PgTransaction;

#[async_trait]
impl ClientStore for PgTransaction {
    async fn list_client_ids(&mut self, realm_id: Uuid) -> StorageResult<Vec<Uuid>> {
        sqlx::query_scalar("SELECT id FROM clients WHERE realm_id = $1 ORDER BY client_id")
            .bind(realm_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)
    }

    async fn list_clients(&mut self, realm_id: Uuid) -> StorageResult<Vec<Client>> {
        let rows: Vec<ClientRow> =
            sqlx::query_as("SELECT * FROM clients WHERE realm_id = $1 ORDER BY client_id")
                .bind(realm_id)
                .fetch_all(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(rows.into_iter().map(Client::from).collect())
    }

    async fn find_client_by_client_id(
        &mut self,
        realm_id: Uuid,
        client_id: &str,
    ) -> StorageResult<Option<Client>> {
        let row: Option<ClientRow> =
            sqlx::query_as("SELECT * FROM clients WHERE realm_id = $1 AND client_id = $2")
                .bind(realm_id)
                .bind(client_id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(row.map(Client::from))
    }

    async fn lock_client(&mut self, id: Uuid) -> StorageResult<Option<Client>> {
        let row: Option<ClientRow> =
            sqlx::query_as("SELECT * FROM clients WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(row.map(Client::from))
    }

    async fn create_client(&mut self, client: &Client) -> StorageResult<()> {
        sqlx::query(
            r"INSERT INTO clients (
                id, realm_id, client_id, name, enabled, protocol, public_client,
                bearer_only, service_accounts_enabled, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(client.id)
        .bind(client.realm_id)
        .bind(&client.client_id)
        .bind(&client.name)
        .bind(client.enabled)
        .bind(&client.protocol)
        .bind(client.public_client)
        .bind(client.bearer_only)
        .bind(client.service_accounts_enabled)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(())
    }

    async fn delete_client(&mut self, id: Uuid) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(not_found("Client", id));
        }

        Ok(())
    }

    async fn add_client_scope_client_mapping(
        &mut self,
        client_id: Uuid,
        scope_id: Uuid,
        default_scope: bool,
    ) -> StorageResult<()> {
        sqlx::query(
            r"INSERT INTO client_scope_client_mappings (client_id, scope_id, default_scope)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING",
        )
        .bind(client_id)
        .bind(scope_id)
        .bind(default_scope)
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(())
    }

    async fn delete_client_scope_client_mappings_by_client(
        &mut self,
        client_id: Uuid,
    ) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM client_scope_client_mappings WHERE client_id = $1")
            .bind(client_id)
            .execute(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn set_authorization_settings(
        &mut self,
        client_id: Uuid,
        settings: &Value,
    ) -> StorageResult<()> {
        sqlx::query(
            r"INSERT INTO client_authorization (client_id, settings) VALUES ($1, $2)
            ON CONFLICT (client_id) DO UPDATE SET settings = EXCLUDED.settings",
        )
        .bind(client_id)
        .bind(sqlx::types::Json(settings))
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(())
    }

    async fn get_authorization_settings(
        &mut self,
        client_id: Uuid,
    ) -> StorageResult<Option<Value>> {
        let settings: Option<sqlx::types::Json<Value>> =
            sqlx::query_scalar("SELECT settings FROM client_authorization WHERE client_id = $1")
                .bind(client_id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(settings.map(|json| json.0))
    }
}

#[async_trait]
impl ClientScopeStore for PgTransaction {
    async fn list_client_scope_ids(&mut self, realm_id: Uuid) -> StorageResult<Vec<Uuid>> {
        sqlx::query_scalar("SELECT id FROM client_scopes WHERE realm_id = $1 ORDER BY name")
            .bind(realm_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)
    }

    async fn list_client_scopes(&mut self, realm_id: Uuid) -> StorageResult<Vec<ClientScope>> {
        let rows: Vec<ClientScopeRow> =
            sqlx::query_as("SELECT * FROM client_scopes WHERE realm_id = $1 ORDER BY name")
                .bind(realm_id)
                .fetch_all(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(rows.into_iter().map(ClientScope::from).collect())
    }

    async fn lock_client_scope(&mut self, id: Uuid) -> StorageResult<Option<ClientScope>> {
        let row: Option<ClientScopeRow> =
            sqlx::query_as("SELECT * FROM client_scopes WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(row.map(ClientScope::from))
    }

    async fn create_client_scope(&mut self, scope: &ClientScope) -> StorageResult<()> {
        sqlx::query(
            r"INSERT INTO client_scopes (id, realm_id, name, description, protocol)
            VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(scope.id)
        .bind(scope.realm_id)
        .bind(&scope.name)
        .bind(&scope.description)
        .bind(&scope.protocol)
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(())
    }

    async fn delete_client_scope(&mut self, id: Uuid) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM client_scopes WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(not_found("ClientScope", id));
        }

        Ok(())
    }

    async fn add_realm_default_client_scope(
        &mut self,
        realm_id: Uuid,
        scope_id: Uuid,
        default_scope: bool,
    ) -> StorageResult<()> {
        sqlx::query(
            r"INSERT INTO realm_default_client_scopes (realm_id, scope_id, default_scope)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING",
        )
        .bind(realm_id)
        .bind(scope_id)
        .bind(default_scope)
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(())
    }

    async fn remove_realm_default_client_scope(
        &mut self,
        realm_id: Uuid,
        scope_id: Uuid,
    ) -> StorageResult<u64> {
        let result = sqlx::query(
            "DELETE FROM realm_default_client_scopes WHERE realm_id = $1 AND scope_id = $2",
        )
        .bind(realm_id)
        .bind(scope_id)
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_realm_default_client_scopes(&mut self, realm_id: Uuid) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM realm_default_client_scopes WHERE realm_id = $1")
            .bind(realm_id)
            .execute(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_client_scope_client_mappings_by_scope(
        &mut self,
        scope_id: Uuid,
    ) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM client_scope_client_mappings WHERE scope_id = $1")
            .bind(scope_id)
            .execute(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn add_client_scope_role_mapping(
        &mut self,
        scope_id: Uuid,
        role_id: Uuid,
    ) -> StorageResult<()> {
        sqlx::query(
            r"INSERT INTO client_scope_role_mappings (scope_id, role_id) VALUES ($1, $2)
            ON CONFLICT DO NOTHING",
        )
        .bind(scope_id)
        .bind(role_id)
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(())
    }

    async fn list_client_scope_role_ids(&mut self, scope_id: Uuid) -> StorageResult<Vec<Uuid>> {
        sqlx::query_scalar("SELECT role_id FROM client_scope_role_mappings WHERE scope_id = $1")
            .bind(scope_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)
    }

    async fn delete_client_scope_role_mappings_by_scope(
        &mut self,
        scope_id: Uuid,
    ) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM client_scope_role_mappings WHERE scope_id = $1")
            .bind(scope_id)
            .execute(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
