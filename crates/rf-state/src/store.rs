//! Scene record storage
//!
//! The engine only needs get/set/delete of opaque bytes with a TTL, so any
//! external cache can sit behind [`SceneStore`]. [`MemorySceneStore`] is the
//! in-process implementation used by tests and the simulator.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rf_core::{RfResult, SceneKey};

/// Keyed byte storage for scene records
pub trait SceneStore: Send + Sync {
    /// Read a record; expired records read as absent
    fn fetch(&self, key: &SceneKey) -> RfResult<Option<Vec<u8>>>;

    /// Write a record, replacing any previous one
    fn store(&self, key: &SceneKey, record: Vec<u8>, ttl: Duration) -> RfResult<()>;

    fn remove(&self, key: &SceneKey) -> RfResult<()>;
}

// ============ Memory Store ============

struct Entry {
    record: Vec<u8>,
    expires_at: Instant,
}

/// In-memory scene store with lazy expiry
#[derive(Default)]
pub struct MemorySceneStore {
    entries: Mutex<HashMap<SceneKey, Entry>>,
}

impl MemorySceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records (expired ones included until purged)
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every expired record, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        let purged = before - entries.len();
        if purged > 0 {
            log::debug!("Purged {purged} expired scene records");
        }
        purged
    }
}

impl SceneStore for MemorySceneStore {
    fn fetch(&self, key: &SceneKey) -> RfResult<Option<Vec<u8>>> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.record.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn store(&self, key: &SceneKey, record: Vec<u8>, ttl: Duration) -> RfResult<()> {
        let expires_at = Instant::now() + ttl;
        self.entries
            .lock()
            .insert(key.clone(), Entry { record, expires_at });
        Ok(())
    }

    fn remove(&self, key: &SceneKey) -> RfResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
