//! `PostgreSQL` implementation of the realm store.

use async_trait::async_trait;
use kc_model::{ClientInitialAccess, Realm};
use kc_storage::RealmStore;
use kc_storage::error::StorageResult;
use uuid::Uuid;

use crate::entities::RealmRow;
use crate::error::{from_sqlx_error, not_found};
use crate::store::PgTransaction;

#[async_trait]
impl RealmStore for PgTransaction {
    async fn find_realm_by_name(&mut self, name: &str) -> StorageResult<Option<Realm>> {
        let row: Option<RealmRow> = sqlx::query_as("SELECT * FROM realms WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        Ok(row.map(Realm::from))
    }

    async fn lock_realm(&mut self, id: Uuid) -> StorageResult<Option<Realm>> {
        let row: Option<RealmRow> =
            sqlx::query_as("SELECT * FROM realms WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(row.map(Realm::from))
    }

    async fn create_realm(&mut self, realm: &Realm) -> StorageResult<()> {
        sqlx::query(
            r"INSERT INTO realms (id, name, display_name, enabled, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(realm.id)
        .bind(&realm.name)
        .bind(&realm.display_name)
        .bind(realm.enabled)
        .bind(realm.created_at)
        .bind(realm.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(())
    }

    async fn delete_realm(&mut self, id: Uuid) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM realms WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(not_found("Realm", id));
        }

        Ok(())
    }

    async fn list_default_group_ids(&mut self, realm_id: Uuid) -> StorageResult<Vec<Uuid>> {
        sqlx::query_scalar("SELECT group_id FROM realm_default_groups WHERE realm_id = $1")
            .bind(realm_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)
    }

    async fn add_default_group(&mut self, realm_id: Uuid, group_id: Uuid) -> StorageResult<()> {
        sqlx::query(
            r"INSERT INTO realm_default_groups (realm_id, group_id) VALUES ($1, $2)
            ON CONFLICT DO NOTHING",
        )
        .bind(realm_id)
        .bind(group_id)
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(())
    }

    async fn remove_default_group(
        &mut self,
        realm_id: Uuid,
        group_id: Uuid,
    ) -> StorageResult<u64> {
        let result =
            sqlx::query("DELETE FROM realm_default_groups WHERE realm_id = $1 AND group_id = $2")
                .bind(realm_id)
                .bind(group_id)
                .execute(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn clear_default_groups(&mut self, realm_id: Uuid) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM realm_default_groups WHERE realm_id = $1")
            .bind(realm_id)
            .execute(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn create_client_initial_access(
        &mut self,
        access: &ClientInitialAccess,
    ) -> StorageResult<()> {
        sqlx::query(
            r"INSERT INTO client_initial_access (
                id, realm_id, created_at, expiration, count, remaining_count
            ) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(access.id)
        .bind(access.realm_id)
        .bind(access.created_at)
        .bind(access.expiration)
        .bind(access.count)
        .bind(access.remaining_count)
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(())
    }

    async fn delete_client_initial_access_by_realm(
        &mut self,
        realm_id: Uuid,
    ) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM client_initial_access WHERE realm_id = $1")
            .bind(realm_id)
            .execute(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
