//! # NestSync Model
//!
//! Shared data model for the NestSync engine.
//!
//! This crate provides:
//! - [`MutationType`] - the closed set of syncable state slots
//! - [`QueuedMutation`] - one pending push, with retry accounting
//! - [`StateSnapshot`] - a full app-state snapshot for bulk push/pull
//! - [`SyncStatus`] and [`StatusReport`] - the engine's observable state
//!
//! This is a pure data crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod mutation;
mod snapshot;
mod status;

pub use mutation::{MutationType, QueuedMutation};
pub use snapshot::StateSnapshot;
pub use status::{StatusReport, SyncStatus};
