//! `PostgreSQL` implementation of the membership store.

use async_trait::async_trait;
use kc_storage::MembershipStore;
use kc_storage::error::StorageResult;
use uuid::Uuid;

use crate::error::from_sqlx_error;
use crate::store::PgTransaction;

#[async_trait]
impl MembershipStore for PgTransaction {
    async fn repoint_role_mappings(
        &mut self,
        old_role_id: Uuid,
        new_role_id: Uuid,
    ) -> StorageResult<u64> {
        let result = sqlx::query(
            r"UPDATE user_role_mappings SET role_id = $1
            WHERE role_id = $2
              AND user_id NOT IN (SELECT user_id FROM user_role_mappings WHERE role_id = $1)",
        )
        .bind(new_role_id)
        .bind(old_role_id)
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn repoint_group_memberships(
        &mut self,
        old_group_id: Uuid,
        new_group_id: Uuid,
    ) -> StorageResult<u64> {
        let result = sqlx::query(
            r"UPDATE user_group_memberships SET group_id = $1
            WHERE group_id = $2
              AND user_id NOT IN (SELECT user_id FROM user_group_memberships WHERE group_id = $1)",
        )
        .bind(new_group_id)
        .bind(old_group_id)
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_orphan_role_mappings(&mut self) -> StorageResult<u64> {
        let result = sqlx::query(
            "DELETE FROM user_role_mappings WHERE role_id NOT IN (SELECT id FROM roles)",
        )
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_orphan_group_memberships(&mut self) -> StorageResult<u64> {
        let result = sqlx::query(
            "DELETE FROM user_group_memberships WHERE group_id NOT IN (SELECT id FROM groups)",
        )
        .execute(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
