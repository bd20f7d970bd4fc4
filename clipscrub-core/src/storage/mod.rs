// clipscrub-core/src/storage/mod.rs
//! Persistence boundary for the rule store.
//!
//! The store is an opaque async key-value map holding JSON documents. The
//! rule store only ever touches one key ([`RULES_KEY`]), and holds
//! [`KeyValueStore::lock`] on it across every read-modify-write, so writers
//! sharing the same backing storage never interleave.

use std::any::Any;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::Result;

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// The single canonical key holding the persisted `RuleSet`.
pub const RULES_KEY: &str = "rules";

/// Exclusive hold on one key. Released on drop.
pub struct KeyLock {
    _guard: Box<dyn Any + Send + Sync>,
}

impl KeyLock {
    pub fn new<G: Any + Send + Sync>(guard: G) -> Self {
        Self { _guard: Box::new(guard) }
    }
}

impl std::fmt::Debug for KeyLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyLock").finish_non_exhaustive()
    }
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Waits until no other holder (in this or any other process sharing the
    /// storage) has `key` locked, then locks it until the guard is dropped.
    async fn lock(&self, key: &str) -> Result<KeyLock>;

    /// Returns the document stored under `key`, or `None` if nothing was ever written.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Replaces the document stored under `key`.
    async fn set(&self, key: &str, value: Value) -> Result<()>;
}
