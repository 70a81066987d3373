//! `PostgreSQL` unit of work.

use async_trait::async_trait;
use kc_storage::error::StorageResult;
use kc_storage::{Store, StoreTransaction};
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::from_transaction_error;

/// `PostgreSQL` store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PostgreSQL` store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StorageResult<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await.map_err(from_transaction_error)?;
        Ok(Box::new(PgTransaction { tx }))
    }
}

/// One database transaction.
///
/// Dropping it without calling `commit` rolls the transaction back.
pub struct PgTransaction {
    pub(crate) tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn commit(self: Box<Self>) -> StorageResult<()> {
        self.tx.commit().await.map_err(from_transaction_error)
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        self.tx.rollback().await.map_err(from_transaction_error)
    }
}
