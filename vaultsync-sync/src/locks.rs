//! Per-vault sync serialization.
//!
//! Two syncs of the same vault never run at once. A second request waits
//! for the first to finish and then runs in full; requests are not
//! coalesced. Tokio's mutex is fair, so waiters run in arrival order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use vaultsync_types::VaultId;

/// Registry of one async mutex per vault. Clones share the registry.
#[derive(Debug, Clone, Default)]
pub struct SyncLocks {
    locks: Arc<Mutex<HashMap<VaultId, Arc<AsyncMutex<()>>>>>,
}

impl SyncLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other sync of `vault` holds the lock. The lock is
    /// released when the guard drops.
    pub async fn acquire(&self, vault: VaultId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
            Arc::clone(locks.entry(vault).or_default())
        };
        lock.lock_owned().await
    }

    /// True while a sync of `vault` is running.
    pub fn is_busy(&self, vault: &VaultId) -> bool {
        let locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
        locks.get(vault).is_some_and(|l| l.try_lock().is_err())
    }
}
