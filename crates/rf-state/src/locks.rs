//! Per-player exclusive locks
//!
//! One mutex per scene key, created on demand and dropped again once nobody
//! holds or waits for it, so the table only grows with concurrent players.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use rf_core::SceneKey;

/// Lock table keyed by scene key
#[derive(Default)]
pub struct PlayerLocks {
    table: Mutex<HashMap<SceneKey, Arc<Mutex<()>>>>,
}

impl PlayerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `key` is exclusively ours
    pub fn acquire(&self, key: &SceneKey) -> PlayerGuard<'_> {
        let slot = {
            let mut table = self.table.lock();
            Arc::clone(table.entry(key.clone()).or_default())
        };
        let guard = slot.lock_arc();
        PlayerGuard {
            locks: self,
            key: key.clone(),
            guard: Some(guard),
        }
    }

    /// Keys currently held or waited on
    pub fn active(&self) -> usize {
        self.table.lock().len()
    }
}

/// Held for the whole load → step → save sequence
pub struct PlayerGuard<'a> {
    locks: &'a PlayerLocks,
    key: SceneKey,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl Drop for PlayerGuard<'_> {
    fn drop(&mut self) {
        // Release first so the count below only sees the table and waiters
        drop(self.guard.take());
        let mut table = self.locks.table.lock();
        if table
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            table.remove(&self.key);
        }
    }
}
