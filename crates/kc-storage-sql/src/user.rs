//! `PostgreSQL` implementation of the user store.

use async_trait::async_trait;
use kc_model::User;
use kc_storage::UserStore;
use kc_storage::error::StorageResult;
use uuid::Uuid;

use crate::convert::attributes_to_json;
use crate::entities::UserRow;
use crate::error::{from_sqlx_error, not_found};
use crate::store::PgTransaction;

#[async_trait]
impl UserStore for PgTransaction {
    async fn find_user_by_username(
        &mut self,
        realm_id: Uuid,
        username: &str,
    ) -> StorageResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT * FROM users WHERE realm_id = $1 AND username = $2")
                .bind(realm_id)
                .bind(username)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(row.map(User::from))
    }

    async fn get_user(&mut self, id: Uuid) -> StorageResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        Ok(row.map(User::from))
    }

    async fn list_users(&mut self, realm_id: Uuid) -> StorageResult<Vec<User>> {
        let rows: Vec<UserRow> =
            sqlx::query_as("SELECT * FROM users WHERE realm_id = $1 ORDER BY username")
                .bind(realm_id)
                .fetch_all(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn create_user(&mut self, user: &User) -> StorageResult<()> {
        let attributes = attributes_to_json(&user.attributes);

        sqlx::query(
            r"INSERT INTO users (
                id, realm_id, username, enabled, first_name, last_name, email,
                email_verified, service_account_client_link, attributes, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(user.id)
        .bind(user.realm_id)
        .bind(&user.username)
        .bind(user.enabled)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(user.email_verified)
        .bind(user.service_account_client_link)
        .bind(sqlx::types::Json(&attributes))
        .bind(user.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(())
    }

    async fn delete_user(&mut self, id: Uuid) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(not_found("User", id));
        }

        Ok(())
    }

    async fn link_service_account(
        &mut self,
        user_id: Uuid,
        client_id: Uuid,
    ) -> StorageResult<()> {
        let result =
            sqlx::query("UPDATE users SET service_account_client_link = $2 WHERE id = $1")
                .bind(user_id)
                .bind(client_id)
                .execute(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(not_found("User", user_id));
        }

        Ok(())
    }

    async fn grant_role(&mut self, user_id: Uuid, role_id: Uuid) -> StorageResult<()> {
        sqlx::query(
            r"INSERT INTO user_role_mappings (user_id, role_id) VALUES ($1, $2)
            ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(())
    }

    async fn join_group(&mut self, user_id: Uuid, group_id: Uuid) -> StorageResult<()> {
        sqlx::query(
            r"INSERT INTO user_group_memberships (user_id, group_id) VALUES ($1, $2)
            ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(group_id)
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(())
    }

    async fn list_role_mappings(&mut self, user_id: Uuid) -> StorageResult<Vec<Uuid>> {
        sqlx::query_scalar("SELECT role_id FROM user_role_mappings WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)
    }

    async fn list_group_memberships(&mut self, user_id: Uuid) -> StorageResult<Vec<Uuid>> {
        sqlx::query_scalar("SELECT group_id FROM user_group_memberships WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)
    }

    async fn delete_role_mappings_by_user(&mut self, user_id: Uuid) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM user_role_mappings WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_group_memberships_by_user(&mut self, user_id: Uuid) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM user_group_memberships WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
