//! In-memory store for testing and ephemeral use.

use crate::backend::StoreBackend;
use crate::error::{StoreError, StoreResult};
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory slot store.
///
/// This store keeps all slots in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Sessions that don't need durability
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Failure injection
///
/// Tests for the engine's non-fatal persistence path can flip
/// [`set_failing`](Self::set_failing); while on, every `get` and `set`
/// returns [`StoreError::Unavailable`].
///
/// # Example
///
/// ```rust
/// use nestsync_store::{InMemoryStore, StoreBackend};
///
/// let store = InMemoryStore::new();
/// store.set("slot", b"value").unwrap();
/// assert_eq!(store.get("slot").unwrap(), Some(b"value".to_vec()));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    slots: RwLock<HashMap<String, Vec<u8>>>,
    failing: RwLock<bool>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with existing slots.
    ///
    /// Useful for testing restart/recovery scenarios.
    #[must_use]
    pub fn with_entries(entries: impl IntoIterator<Item = (String, Vec<u8>)>) -> Self {
        Self {
            slots: RwLock::new(entries.into_iter().collect()),
            failing: RwLock::new(false),
        }
    }

    /// Turns failure injection on or off.
    pub fn set_failing(&self, failing: bool) {
        *self.failing.write() = failing;
    }

    /// Returns a copy of all slots.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn entries(&self) -> HashMap<String, Vec<u8>> {
        self.slots.read().clone()
    }

    /// Removes all slots.
    pub fn clear(&self) {
        self.slots.write().clear();
    }

    fn check_available(&self) -> StoreResult<()> {
        if *self.failing.read() {
            Err(StoreError::Unavailable("failure injection enabled".into()))
        } else {
            Ok(())
        }
    }
}

impl StoreBackend for InMemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.check_available()?;
        Ok(self.slots.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.check_available()?;
        self.slots.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
