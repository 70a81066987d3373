//! Realm re-import tests.

use kc_import::{ImportError, ImportOutcome, ImportState, ImportStep, Strategy};
use serde_json::json;

use crate::common::{TestEnv, names, sample_realm};

/// Users keep their assignments by name across a rebuild.
#[tokio::test]
async fn test_reimport_preserves_user_assignments() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.write_realm(&sample_realm())?;
    let importer = env.importer(env.config())?;

    importer.import_realm("acme").await?;
    let bob = env
        .add_user("acme", "bob", &["viewer", "web.edit"], &["/staff", "/staff/admins"])
        .await?;
    let roles_before = env.role_ids("acme").await?;

    let outcome = importer.import_realm("acme").await?;
    let report = outcome
        .report()
        .ok_or_else(|| anyhow::anyhow!("realm was not imported"))?;

    assert!(report.existed);
    assert_eq!(report.states.last(), Some(&ImportState::Done));
    assert!(env.role_ids("acme").await?.is_disjoint(&roles_before));
    assert_eq!(env.role_names(bob).await?, names(&["viewer", "web.edit"]));
    assert_eq!(env.group_names(bob).await?, names(&["staff", "admins"]));
    assert_eq!(env.dangling_rows().await?, 0);

    Ok(())
}

/// Assignments to roles and groups removed from the file are deleted.
#[tokio::test]
async fn test_reimport_sweeps_removed_objects() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.write_realm(&sample_realm())?;
    let importer = env.importer(env.config())?;
    importer.import_realm("acme").await?;
    let bob = env
        .add_user("acme", "bob", &["viewer", "admin"], &["/staff/admins"])
        .await?;

    let mut reduced = sample_realm();
    reduced["roles"]["realm"] = json!([{"name": "viewer"}]);
    reduced["groups"] = json!([{"name": "staff", "realmRoles": ["viewer"]}]);
    reduced["users"] = json!([{"username": "alice", "realmRoles": ["viewer"]}]);
    env.write_realm(&reduced)?;

    let outcome = importer.import_realm("acme").await?;
    let report = outcome
        .report()
        .ok_or_else(|| anyhow::anyhow!("realm was not imported"))?;

    assert_eq!(env.role_names(bob).await?, names(&["viewer"]));
    assert!(env.group_names(bob).await?.is_empty());
    assert_eq!(report.swept.role_mappings, 1);
    assert_eq!(report.swept.group_memberships, 1);
    assert_eq!(env.dangling_rows().await?, 0);

    Ok(())
}

/// A failing rebuild leaves the previous realm in place.
#[tokio::test]
async fn test_failed_reimport_rolls_back() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.write_realm(&sample_realm())?;
    let importer = env.importer(env.config())?;
    importer.import_realm("acme").await?;
    let bob = env.add_user("acme", "bob", &["viewer"], &["/staff"]).await?;
    let roles_before = env.role_ids("acme").await?;

    let mut broken = sample_realm();
    broken["groups"] = json!([{"name": "staff", "realmRoles": ["missing"]}]);
    env.write_realm(&broken)?;

    let err = importer
        .import_realm("acme")
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("import should fail"))?;

    assert_eq!(err.step(), Some(ImportStep::Rebuild));
    assert!(matches!(
        err.root_cause(),
        ImportError::UnknownReference { kind: "realm role", .. }
    ));
    assert_eq!(env.role_ids("acme").await?, roles_before);
    assert_eq!(env.role_names(bob).await?, names(&["viewer"]));
    assert_eq!(env.group_names(bob).await?, names(&["staff"]));

    Ok(())
}

/// IGNORE_EXISTING leaves an existing realm untouched.
#[tokio::test]
async fn test_ignore_existing_skips_realm() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.write_realm(&sample_realm())?;
    env.importer(env.config())?.import_realm("acme").await?;
    let roles_before = env.role_ids("acme").await?;

    let importer = env.importer(env.config().with_strategy(Strategy::IgnoreExisting))?;
    let outcome = importer.import_realm("acme").await?;

    assert_eq!(outcome, ImportOutcome::SkippedExisting { users: None });
    assert_eq!(env.role_ids("acme").await?, roles_before);

    Ok(())
}

/// A skipped realm still receives the users of its shards.
#[tokio::test]
async fn test_ignore_existing_imports_new_users() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.write_realm(&sample_realm())?;
    env.importer(env.config())?.import_realm("acme").await?;
    let roles_before = env.role_ids("acme").await?;
    env.write(
        "acme-users-0.json",
        &json!({"realm": "acme", "users": [{"username": "zed", "realmRoles": ["viewer"]}]}),
    )?;

    let importer = env.importer(
        env.config()
            .with_strategy(Strategy::IgnoreExisting)
            .with_users(true),
    )?;
    let outcome = importer.import_realm("acme").await?;

    let ImportOutcome::SkippedExisting { users: Some(users) } = outcome else {
        anyhow::bail!("expected a skipped realm with user import, got {outcome:?}");
    };
    assert_eq!(users.created, 1);
    assert_eq!(env.role_ids("acme").await?, roles_before);
    let zed = env.user_id("acme", "zed").await?;
    assert_eq!(env.role_names(zed).await?, names(&["viewer"]));

    Ok(())
}

/// The administrative realm goes first and user shards follow each realm.
#[tokio::test]
async fn test_import_all_with_users() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.write_realm(&sample_realm())?;
    env.write_realm(&json!({"realm": "master"}))?;
    env.write(
        "acme-users-1.json",
        &json!({"realm": "acme", "users": [{"username": "dave", "realmRoles": ["viewer"]}]}),
    )?;
    env.write(
        "acme-users-0.json",
        &json!({"realm": "acme", "users": [{"username": "alice"}, {"username": "erin"}]}),
    )?;

    let summary = env
        .importer(env.config().with_users(true))?
        .import_all()
        .await;

    assert!(summary.is_success());
    assert_eq!(summary.results[0].0, "master");
    assert_eq!(summary.imported().count(), 2);

    let (users,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM users u JOIN realms r ON r.id = u.realm_id WHERE r.name = 'acme'",
    )
    .fetch_one(&env.pool)
    .await?;
    // alice, erin, dave and the service account of `web`
    assert_eq!(users, 4);

    Ok(())
}
