//! `PostgreSQL` implementation of the role store.

use async_trait::async_trait;
use kc_model::Role;
use kc_storage::RoleStore;
use kc_storage::error::StorageResult;
use uuid::Uuid;

use crate::entities::RoleRow;
use crate::error::{from_sqlx_error, not_found};
use crate::store::PgTransaction;

#[async_trait]
impl RoleStore for PgTransaction {
    async fn list_roles(&mut self, realm_id: Uuid) -> StorageResult<Vec<Role>> {
        let rows: Vec<RoleRow> =
            sqlx::query_as("SELECT * FROM roles WHERE realm_id = $1 ORDER BY name, id")
                .bind(realm_id)
                .fetch_all(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn list_realm_roles(&mut self, realm_id: Uuid) -> StorageResult<Vec<Role>> {
        let rows: Vec<RoleRow> = sqlx::query_as(
            "SELECT * FROM roles WHERE realm_id = $1 AND client_id IS NULL ORDER BY name",
        )
        .bind(realm_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn list_client_roles(&mut self, client_id: Uuid) -> StorageResult<Vec<Role>> {
        let rows: Vec<RoleRow> =
            sqlx::query_as("SELECT * FROM roles WHERE client_id = $1 ORDER BY name")
                .bind(client_id)
                .fetch_all(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn find_realm_role_by_name(
        &mut self,
        realm_id: Uuid,
        name: &str,
    ) -> StorageResult<Option<Role>> {
        let row: Option<RoleRow> = sqlx::query_as(
            "SELECT * FROM roles WHERE realm_id = $1 AND client_id IS NULL AND name = $2",
        )
        .bind(realm_id)
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(row.map(Role::from))
    }

    async fn find_client_role_by_name(
        &mut self,
        client_id: Uuid,
        name: &str,
    ) -> StorageResult<Option<Role>> {
        let row: Option<RoleRow> =
            sqlx::query_as("SELECT * FROM roles WHERE client_id = $1 AND name = $2")
                .bind(client_id)
                .bind(name)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(row.map(Role::from))
    }

    async fn create_role(&mut self, role: &Role) -> StorageResult<()> {
        sqlx::query(
            r"INSERT INTO roles (id, name, description, realm_id, client_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(role.id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.realm_id)
        .bind(role.client_id)
        .bind(role.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(())
    }

    async fn delete_role(&mut self, id: Uuid) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(not_found("Role", id));
        }

        Ok(())
    }

    async fn add_composite(&mut self, parent_id: Uuid, child_id: Uuid) -> StorageResult<()> {
        sqlx::query(
            r"INSERT INTO composite_roles (parent_role, child_role) VALUES ($1, $2)
            ON CONFLICT DO NOTHING",
        )
        .bind(parent_id)
        .bind(child_id)
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(())
    }

    async fn list_composite_ids(&mut self, parent_id: Uuid) -> StorageResult<Vec<Uuid>> {
        sqlx::query_scalar("SELECT child_role FROM composite_roles WHERE parent_role = $1")
            .bind(parent_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)
    }

    async fn delete_composites_by_child(&mut self, child_id: Uuid) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM composite_roles WHERE child_role = $1")
            .bind(child_id)
            .execute(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_client_scope_role_mappings_by_role(
        &mut self,
        role_id: Uuid,
    ) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM client_scope_role_mappings WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
