//! Unit-of-work seam.

use async_trait::async_trait;

use crate::client::{ClientScopeStore, ClientStore};
use crate::error::StorageResult;
use crate::group::GroupStore;
use crate::membership::MembershipStore;
use crate::realm::RealmStore;
use crate::role::RoleStore;
use crate::user::UserStore;

/// A storage backend able to open units of work.
#[async_trait]
pub trait Store: Send + Sync {
    /// Begins a new unit of work.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Connection` or `StorageError::Transaction` if
    /// the backend cannot start a transaction.
    async fn begin(&self) -> StorageResult<Box<dyn StoreTransaction>>;
}

/// One open unit of work.
///
/// Dropping a transaction without committing discards its writes.
#[async_trait]
pub trait StoreTransaction:
    RealmStore
    + ClientStore
    + ClientScopeStore
    + RoleStore
    + GroupStore
    + UserStore
    + MembershipStore
    + Send
{
    /// Makes every write of this unit of work durable.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Transaction` if the commit fails.
    async fn commit(self: Box<Self>) -> StorageResult<()>;

    /// Discards every write of this unit of work.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Transaction` if the rollback fails.
    async fn rollback(self: Box<Self>) -> StorageResult<()>;
}
