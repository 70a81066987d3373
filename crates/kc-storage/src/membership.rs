//! Bulk maintenance of user association rows.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StorageResult;

/// Bulk statements over `user_role_mappings` and `user_group_memberships`.
///
/// These statements are not realm scoped: ids are globally unique.
#[async_trait]
pub trait MembershipStore: Send {
    /// Re-points every role mapping from `old_role_id` to `new_role_id`.
    ///
    /// Rows whose user already holds `new_role_id` are left on the old id.
    /// Returns the number of rows re-pointed.
    async fn repoint_role_mappings(
        &mut self,
        old_role_id: Uuid,
        new_role_id: Uuid,
    ) -> StorageResult<u64>;

    /// Re-points every group membership from `old_group_id` to
    /// `new_group_id`, with the same conflict rule as role mappings.
    async fn repoint_group_memberships(
        &mut self,
        old_group_id: Uuid,
        new_group_id: Uuid,
    ) -> StorageResult<u64>;

    /// Deletes role mappings whose role no longer exists.
    async fn delete_orphan_role_mappings(&mut self) -> StorageResult<u64>;

    /// Deletes group memberships whose group no longer exists.
    async fn delete_orphan_group_memberships(&mut self) -> StorageResult<u64>;
}
