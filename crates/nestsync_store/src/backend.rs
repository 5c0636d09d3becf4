//! Store backend trait definition.

use crate::error::StoreResult;

/// A durable key-value slot store for NestSync.
///
/// Stores are **opaque byte slots**. The engine persists exactly two slots
/// through this trait - the pending-mutation queue snapshot and the
/// last-successful-sync timestamp - but implementations must not assume
/// which keys occur.
///
/// # Invariants
///
/// - `get` on a key never written returns `Ok(None)`, not an error
/// - `set` replaces the whole slot; after it returns `Ok`, a subsequent
///   `get` observes the new value, across process restarts for persistent
///   implementations
/// - Stores must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing
/// - [`super::FileStore`] - For persistent storage
pub trait StoreBackend: Send + Sync {
    /// Reads the slot for `key`.
    ///
    /// Returns `None` if the key has never been written.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Replaces the slot for `key` with `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid for this store or an I/O
    /// error occurs.
    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()>;
}

impl<S: StoreBackend + ?Sized> StoreBackend for std::sync::Arc<S> {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        (**self).set(key, value)
    }
}
