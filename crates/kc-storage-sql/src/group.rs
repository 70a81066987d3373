//! `PostgreSQL` implementation of the group store.

use async_trait::async_trait;
use kc_model::Group;
use kc_storage::GroupStore;
use kc_storage::error::StorageResult;
use uuid::Uuid;

use crate::entities::GroupRow;
use crate::error::{from_sqlx_error, not_found};
use crate::store::PgTransaction;

#[async_trait]
impl GroupStore for PgTransaction {
    async fn list_groups(&mut self, realm_id: Uuid) -> StorageResult<Vec<Group>> {
        let rows: Vec<GroupRow> =
            sqlx::query_as("SELECT * FROM groups WHERE realm_id = $1 ORDER BY name, id")
                .bind(realm_id)
                .fetch_all(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(rows.into_iter().map(Group::from).collect())
    }

    async fn list_group_ids_by_parent(
        &mut self,
        realm_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> StorageResult<Vec<Uuid>> {
        sqlx::query_scalar(
            r"SELECT id FROM groups
            WHERE realm_id = $1 AND parent_id IS NOT DISTINCT FROM $2
            ORDER BY name",
        )
        .bind(realm_id)
        .bind(parent_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)
    }

    async fn find_group_by_name(
        &mut self,
        realm_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> StorageResult<Option<Group>> {
        let row: Option<GroupRow> = sqlx::query_as(
            r"SELECT * FROM groups
            WHERE realm_id = $1 AND parent_id IS NOT DISTINCT FROM $2 AND name = $3",
        )
        .bind(realm_id)
        .bind(parent_id)
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(row.map(Group::from))
    }

    async fn get_group(&mut self, id: Uuid) -> StorageResult<Option<Group>> {
        let row: Option<GroupRow> = sqlx::query_as("SELECT * FROM groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        Ok(row.map(Group::from))
    }

    async fn lock_group(&mut self, id: Uuid) -> StorageResult<Option<Group>> {
        let row: Option<GroupRow> =
            sqlx::query_as("SELECT * FROM groups WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(row.map(Group::from))
    }

    async fn create_group(&mut self, group: &Group) -> StorageResult<()> {
        sqlx::query(
            r"INSERT INTO groups (id, name, realm_id, parent_id, created_at)
            VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(group.id)
        .bind(&group.name)
        .bind(group.realm_id)
        .bind(group.parent_id)
        .bind(group.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(())
    }

    async fn delete_group(&mut self, id: Uuid) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(not_found("Group", id));
        }

        Ok(())
    }

    async fn grant_group_role(&mut self, group_id: Uuid, role_id: Uuid) -> StorageResult<()> {
        sqlx::query(
            r"INSERT INTO group_role_mappings (group_id, role_id) VALUES ($1, $2)
            ON CONFLICT DO NOTHING",
        )
        .bind(group_id)
        .bind(role_id)
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(())
    }

    async fn list_group_role_ids(&mut self, group_id: Uuid) -> StorageResult<Vec<Uuid>> {
        sqlx::query_scalar("SELECT role_id FROM group_role_mappings WHERE group_id = $1")
            .bind(group_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)
    }

    async fn delete_group_role_mappings_by_realm(&mut self, realm_id: Uuid) -> StorageResult<u64> {
        let result = sqlx::query(
            r"DELETE FROM group_role_mappings
            WHERE group_id IN (SELECT id FROM groups WHERE realm_id = $1)",
        )
        .bind(realm_id)
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_group_role_mappings_by_group(&mut self, group_id: Uuid) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM group_role_mappings WHERE group_id = $1")
            .bind(group_id)
            .execute(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
