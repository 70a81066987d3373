//! Import of user shard files.
//!
//! Users live in `<realm>-users-<n>.json` files next to the realm file.
//! Each shard is validated before any of its users is written, then
//! imported in its own transaction. Users that already exist are skipped.

use kc_storage::{Store, StoreTransaction};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ImportError, ImportResult};
use crate::provision::provision_user;
use crate::representation::UserRepresentation;
use crate::source::DirectorySource;

/// Counts of users handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserImportReport {
    /// Shards read.
    pub shards: usize,
    /// Users created.
    pub created: usize,
    /// Users skipped because the username was taken.
    pub skipped: usize,
}

/// Imports user shards of a realm.
pub struct UserImportEngine<'a> {
    source: &'a DirectorySource,
    store: &'a dyn Store,
}

impl<'a> UserImportEngine<'a> {
    /// Creates an engine reading from `source` and writing to `store`.
    #[must_use]
    pub fn new(source: &'a DirectorySource, store: &'a dyn Store) -> Self {
        Self { source, store }
    }

    /// Imports every shard of `realm` in ascending shard order.
    ///
    /// Shards committed before a failing one stay committed.
    ///
    /// ## Errors
    ///
    /// Returns `ImportError::RealmMismatch` for a shard of another realm,
    /// `ImportError::RealmNotFound` if the realm does not exist, and read,
    /// reference and storage errors.
    pub async fn import_realm_users(&self, realm: &str) -> ImportResult<UserImportReport> {
        let mut report = UserImportReport::default();
        for path in self.source.user_shards(realm)? {
            let shard = self.source.read_user_shard(&path, realm)?;
            debug!(realm, shard = %path.display(), users = shard.users.len(), "Importing user shard");

            let mut tx = self.store.begin().await?;
            let imported = import_users(tx.as_mut(), realm, &shard.users).await;
            match imported {
                Ok(counts) => {
                    tx.commit().await?;
                    report.shards += 1;
                    report.created += counts.created;
                    report.skipped += counts.skipped;
                }
                Err(e) => {
                    if let Err(rollback) = tx.rollback().await {
                        tracing::warn!(realm, error = %rollback, "Rollback failed");
                    }
                    return Err(e);
                }
            }
        }
        info!(
            realm,
            shards = report.shards,
            created = report.created,
            skipped = report.skipped,
            "Imported users"
        );
        Ok(report)
    }
}

/// Creates the users of one shard that do not exist yet.
///
/// ## Errors
///
/// Returns `ImportError::RealmNotFound` if the realm does not exist, and
/// reference and storage errors.
pub async fn import_users(
    tx: &mut dyn StoreTransaction,
    realm: &str,
    users: &[UserRepresentation],
) -> ImportResult<UserImportReport> {
    let realm = tx
        .find_realm_by_name(realm)
        .await?
        .ok_or_else(|| ImportError::RealmNotFound(realm.to_string()))?;

    let mut report = UserImportReport::default();
    for rep in users {
        if tx
            .find_user_by_username(realm.id, &rep.username)
            .await?
            .is_some()
        {
            report.skipped += 1;
            continue;
        }
        provision_user(tx, realm.id, rep).await?;
        report.created += 1;
    }
    Ok(report)
}
