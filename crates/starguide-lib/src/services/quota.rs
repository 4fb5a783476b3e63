// Chat quota tracking
// Persists the latest usage snapshot and publishes changes through a typed
// watch subscription, so quota displays refresh without an ambient page
// event as the contract.

use std::sync::Arc;

use tokio::sync::watch;

use crate::api::types::UsageInfo;
use crate::models::quota::UsageSnapshot;

use super::store::{LocalStore, StoreError, KEY_CHAT_USAGE};

/// Owner of the process-wide quota state
pub struct QuotaTracker {
    store: Arc<LocalStore>,
    tx: watch::Sender<UsageSnapshot>,
}

impl QuotaTracker {
    /// Load the persisted snapshot (or defaults) and start publishing
    pub fn new(store: Arc<LocalStore>) -> Self {
        let initial: UsageSnapshot = store.get(KEY_CHAT_USAGE).unwrap_or_default();
        let (tx, _) = watch::channel(initial);
        Self { store, tx }
    }

    pub fn current(&self) -> UsageSnapshot {
        self.tx.borrow().clone()
    }

    /// Subscribe to snapshot changes
    pub fn subscribe(&self) -> watch::Receiver<UsageSnapshot> {
        self.tx.subscribe()
    }

    /// Replace the snapshot, persisting it and notifying subscribers
    pub fn publish(&self, snapshot: UsageSnapshot) -> Result<(), StoreError> {
        self.store.set(KEY_CHAT_USAGE, &snapshot)?;
        self.tx.send_replace(snapshot);
        Ok(())
    }

    /// Merge usage reported alongside a reply into the current snapshot
    pub fn apply_usage(&self, usage: &UsageInfo) -> Result<(), StoreError> {
        let mut snapshot = self.current();
        if let Some(used) = usage.used {
            snapshot.used = used;
        }
        if let Some(limit) = usage.limit {
            snapshot.limit = limit;
        }
        self.publish(snapshot)
    }
}
