//! Engine status as seen by callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The current status of the sync engine.
///
/// Statuses are mutually exclusive; the engine holds exactly one at a time
/// and the machine is long-lived (no terminal state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Nothing pending, nothing in flight. Initial status.
    Idle,
    /// A drain pass or bulk operation is in flight.
    Syncing,
    /// The last pass completed with the queue fully empty.
    Synced,
    /// The last pass left a permanently-failed or retry-pending entry.
    Error,
    /// Connectivity is down; recovers on its own when it returns.
    Offline,
}

impl SyncStatus {
    /// Returns true if a new sync pass may begin from this status.
    pub fn can_start_sync(&self) -> bool {
        matches!(
            self,
            SyncStatus::Idle | SyncStatus::Synced | SyncStatus::Error | SyncStatus::Offline
        )
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Error => "error",
            SyncStatus::Offline => "offline",
        };
        f.write_str(tag)
    }
}

/// A point-in-time read of the engine's observable state.
///
/// Produced by the controller's `status()`; reading one never blocks and is
/// always available, whatever the engine is doing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Current status.
    pub status: SyncStatus,
    /// When the last fully-successful sync completed, if any. Persisted.
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Latest connectivity signal value.
    pub is_online: bool,
    /// Number of mutations waiting in the queue.
    pub pending: usize,
}
