//! # NestSync Store
//!
//! Key-value slot store trait and implementations for NestSync.
//!
//! This crate provides the persistence boundary for the sync engine.
//! Stores are **opaque byte slots** keyed by short strings - they do not
//! interpret the data they hold.
//!
//! ## Design Principles
//!
//! - Stores are simple slot stores (get, set)
//! - An absent key is a valid empty/initial state, never an error
//! - Must be `Send + Sync` for concurrent access
//! - The engine owns all serialization (JSON snapshots, timestamps)
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral use
//! - [`FileStore`] - Persistent, one file per key, atomic replace
//!
//! ## Example
//!
//! ```rust
//! use nestsync_store::{InMemoryStore, StoreBackend};
//!
//! let store = InMemoryStore::new();
//! store.set("sync.queue", b"[]").unwrap();
//! assert_eq!(store.get("sync.queue").unwrap(), Some(b"[]".to_vec()));
//! assert_eq!(store.get("missing").unwrap(), None);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StoreBackend;
pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
