//! Realm lifecycle events published during teardown.
//!
//! Listeners run inside the teardown transaction and receive it, so they
//! can clean up data of their own before the owning rows disappear.

use std::sync::Arc;

use async_trait::async_trait;
use kc_model::{Client, Realm};
use kc_storage::StoreTransaction;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::ImportResult;

// ============================================================================
// Listener Trait
// ============================================================================

/// Receives realm lifecycle events.
///
/// Returning an error aborts the teardown and rolls the transaction back.
#[async_trait]
pub trait RealmEventListener: Send + Sync {
    /// Called before the rows owned by `client` are deleted.
    async fn on_client_removed(
        &self,
        _client: &Client,
        _tx: &mut dyn StoreTransaction,
    ) -> ImportResult<()> {
        Ok(())
    }

    /// Called after the realm row itself is deleted.
    async fn on_realm_removed(
        &self,
        _realm: &Realm,
        _tx: &mut dyn StoreTransaction,
    ) -> ImportResult<()> {
        Ok(())
    }
}

/// Fans events out to registered listeners in registration order.
#[derive(Clone, Default)]
pub struct RealmEventBus {
    listeners: Vec<Arc<dyn RealmEventListener>>,
}

impl RealmEventBus {
    /// Creates a bus without listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener.
    pub fn register(&mut self, listener: Arc<dyn RealmEventListener>) {
        self.listeners.push(listener);
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Checks if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Publishes a client removal.
    ///
    /// ## Errors
    ///
    /// Returns the first listener error.
    pub async fn client_removed(
        &self,
        client: &Client,
        tx: &mut dyn StoreTransaction,
    ) -> ImportResult<()> {
        for listener in &self.listeners {
            listener.on_client_removed(client, &mut *tx).await?;
        }
        Ok(())
    }

    /// Publishes a realm removal.
    ///
    /// ## Errors
    ///
    /// Returns the first listener error.
    pub async fn realm_removed(
        &self,
        realm: &Realm,
        tx: &mut dyn StoreTransaction,
    ) -> ImportResult<()> {
        for listener in &self.listeners {
            listener.on_realm_removed(realm, &mut *tx).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for RealmEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealmEventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

// ============================================================================
// Tracing Listener
// ============================================================================

/// Listener that writes events to the tracing framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventListener;

#[async_trait]
impl RealmEventListener for TracingEventListener {
    async fn on_client_removed(
        &self,
        client: &Client,
        _tx: &mut dyn StoreTransaction,
    ) -> ImportResult<()> {
        tracing::debug!(
            realm_id = %client.realm_id,
            client_id = %client.client_id,
            id = %client.id,
            "client_removed"
        );
        Ok(())
    }

    async fn on_realm_removed(
        &self,
        realm: &Realm,
        _tx: &mut dyn StoreTransaction,
    ) -> ImportResult<()> {
        tracing::debug!(realm = %realm.name, id = %realm.id, "realm_removed");
        Ok(())
    }
}

// ============================================================================
// Recording Listener (for testing)
// ============================================================================

/// A recorded lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealmEvent {
    /// A client was removed.
    ClientRemoved {
        /// Generated id of the client.
        id: Uuid,
        /// OAuth client identifier.
        client_id: String,
    },
    /// A realm was removed.
    RealmRemoved {
        /// Realm id.
        id: Uuid,
        /// Realm name.
        name: String,
    },
}

/// Listener that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingEventListener {
    events: Mutex<Vec<RealmEvent>>,
}

impl RecordingEventListener {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<RealmEvent> {
        self.events.lock().clone()
    }

    /// Clears all recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

#[async_trait]
impl RealmEventListener for RecordingEventListener {
    async fn on_client_removed(
        &self,
        client: &Client,
        _tx: &mut dyn StoreTransaction,
    ) -> ImportResult<()> {
        self.events.lock().push(RealmEvent::ClientRemoved {
            id: client.id,
            client_id: client.client_id.clone(),
        });
        Ok(())
    }

    async fn on_realm_removed(
        &self,
        realm: &Realm,
        _tx: &mut dyn StoreTransaction,
    ) -> ImportResult<()> {
        self.events.lock().push(RealmEvent::RealmRemoved {
            id: realm.id,
            name: realm.name.clone(),
        });
        Ok(())
    }
}
