//! Association row maintenance against PostgreSQL.

use kc_model::{Realm, Role, User};
use kc_storage::Store;

use crate::common::TestEnv;

/// A user already holding the new role keeps the old row, which the sweep
/// then removes.
#[tokio::test]
async fn test_repoint_skips_users_holding_target() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let mut tx = env.store.begin().await?;

    let realm = Realm::new("acme");
    tx.create_realm(&realm).await?;
    let old_role = Role::new_realm_role(realm.id, "viewer-old");
    let new_role = Role::new_realm_role(realm.id, "viewer");
    tx.create_role(&old_role).await?;
    tx.create_role(&new_role).await?;

    let both = User::new(realm.id, "both");
    let only_old = User::new(realm.id, "only-old");
    tx.create_user(&both).await?;
    tx.create_user(&only_old).await?;
    tx.grant_role(both.id, old_role.id).await?;
    tx.grant_role(both.id, new_role.id).await?;
    tx.grant_role(only_old.id, old_role.id).await?;

    let moved = tx.repoint_role_mappings(old_role.id, new_role.id).await?;
    assert_eq!(moved, 1);

    tx.delete_role(old_role.id).await?;
    let swept = tx.delete_orphan_role_mappings().await?;
    assert_eq!(swept, 1);

    assert_eq!(tx.list_role_mappings(both.id).await?, vec![new_role.id]);
    assert_eq!(tx.list_role_mappings(only_old.id).await?, vec![new_role.id]);
    tx.commit().await?;

    Ok(())
}

/// Deleting a user removes its association rows.
#[tokio::test]
async fn test_user_deletion_cascades() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let mut tx = env.store.begin().await?;

    let realm = Realm::new("acme");
    tx.create_realm(&realm).await?;
    let role = Role::new_realm_role(realm.id, "viewer");
    tx.create_role(&role).await?;
    let user = User::new(realm.id, "alice");
    tx.create_user(&user).await?;
    tx.grant_role(user.id, role.id).await?;

    tx.delete_user(user.id).await?;
    tx.commit().await?;

    let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_role_mappings")
        .fetch_one(&env.pool)
        .await?;
    assert_eq!(rows, 0);

    Ok(())
}
