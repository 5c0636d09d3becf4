//! # NestSync Engine
//!
//! Durable mutation queue, flush scheduler, and sync state machine for
//! NestSync.
//!
//! This crate provides:
//! - [`MutationQueue`] - deduplicated (one entry per type, last-writer-wins)
//!   pending mutations, mirrored to a persistent slot store
//! - A flush scheduler - debounced drains after edits, immediate drains on
//!   reconnect and foreground resume, defensive persistence on backgrounding
//! - [`SyncController`] - the {idle, syncing, synced, error, offline} state
//!   machine behind `enqueue`, `force_full_sync`, `pull_from_remote`, and
//!   `status`
//! - [`RemoteStore`] - the adapter boundary to the authoritative backend,
//!   with a [`MockRemote`] for tests
//!
//! ## Architecture
//!
//! A local edit flows `enqueue` → queue coalesce + persist → debounce →
//! drain pass → per-item remote write → residual queue persisted. At most
//! one drain pass is in flight at any time; the scheduler task is the only
//! scheduler-side driver and explicit operations serialize on the same
//! internal guard.
//!
//! ## Key Invariants
//!
//! - At most one queued mutation per [`MutationType`]
//! - Per-item failures retry across passes up to a fixed ceiling (3), then
//!   the item is dropped and reported as a non-fatal `error` status
//! - Connectivity loss is the `offline` status, not an error, and recovers
//!   on its own
//! - No engine failure reaches the hosting process as an unhandled fault;
//!   everything user-visible flows through `status()`
//!
//! ## Example
//!
//! ```no_run
//! use nestsync_engine::{
//!     connectivity_channel, lifecycle_channel, EngineConfig, LifecyclePhase, MockRemote,
//!     SyncController,
//! };
//! use nestsync_store::InMemoryStore;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (_conn_tx, conn_rx) = connectivity_channel(true);
//! let (_life_tx, life_rx) = lifecycle_channel(LifecyclePhase::Active);
//!
//! let sync = SyncController::spawn(
//!     EngineConfig::new(),
//!     MockRemote::new(),
//!     InMemoryStore::new(),
//!     conn_rx,
//!     life_rx,
//! );
//!
//! sync.enqueue_mascot(json!({"mood": "happy"}));
//! let report = sync.status();
//! assert_eq!(report.pending, 1);
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod controller;
mod error;
mod persist;
mod queue;
mod remote;
mod scheduler;
mod signal;

pub use config::EngineConfig;
pub use controller::SyncController;
pub use error::{EngineError, EngineResult, RemoteError};
pub use persist::{LAST_SYNCED_KEY, QUEUE_KEY};
pub use queue::{FailureOutcome, MutationQueue};
pub use remote::{MockRemote, RemoteStore};
pub use signal::{
    connectivity_channel, lifecycle_channel, ConnectivitySignal, LifecyclePhase, LifecycleSignal,
};

pub use nestsync_model::{
    MutationType, QueuedMutation, StateSnapshot, StatusReport, SyncStatus,
};
