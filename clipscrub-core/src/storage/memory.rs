// clipscrub-core/src/storage/memory.rs
//! In-process key-value store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use crate::errors::Result;
use crate::storage::{KeyLock, KeyValueStore};

/// A `HashMap`-backed store. Counts writes so callers can assert how often
/// the persisted document was replaced.
///
/// One lock covers every key; all users of a shared `MemoryStore` queue on it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
    lock: Arc<Mutex<()>>,
    writes: AtomicUsize,
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with an existing document. Does not count as a write.
    pub fn with_entry(key: &str, value: Value) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.to_string(), value);
        Self {
            entries: RwLock::new(entries),
            ..Self::default()
        }
    }

    /// Adds an artificial delay to every `get` and `set`, which widens the
    /// window between a read and the following write.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn lock(&self, _key: &str) -> Result<KeyLock> {
        Ok(KeyLock::new(Arc::clone(&self.lock).lock_owned().await))
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        self.simulate_latency().await;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.simulate_latency().await;
        self.entries.write().await.insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
