//! Remote store adapter abstraction.

use crate::error::RemoteError;
use nestsync_model::{MutationType, StateSnapshot};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// A remote store adapter performs the actual writes against the
/// authoritative backend.
///
/// This trait abstracts the backend, allowing for different implementations
/// (HTTP, cloud SDK, mock for testing, etc.). Calls may fail transiently;
/// the engine applies its own bounded retry across drain passes, so
/// implementations should not retry internally.
///
/// Writes must be idempotent: the engine guarantees at-least-once delivery,
/// not exactly-once.
pub trait RemoteStore: Send + Sync {
    /// Writes the full new state for one mutation type.
    fn write_typed(
        &self,
        ty: MutationType,
        payload: &Value,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Pushes a full state snapshot, superseding incremental writes.
    fn bulk_push(
        &self,
        snapshot: &StateSnapshot,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Pulls the current full state snapshot.
    fn bulk_pull(&self) -> impl Future<Output = Result<StateSnapshot, RemoteError>> + Send;
}

impl<R: RemoteStore> RemoteStore for Arc<R> {
    fn write_typed(
        &self,
        ty: MutationType,
        payload: &Value,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send {
        (**self).write_typed(ty, payload)
    }

    fn bulk_push(
        &self,
        snapshot: &StateSnapshot,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send {
        (**self).bulk_push(snapshot)
    }

    fn bulk_pull(&self) -> impl Future<Output = Result<StateSnapshot, RemoteError>> + Send {
        (**self).bulk_pull()
    }
}

/// A mock remote store for testing.
///
/// Records every `write_typed` call (including failed ones) and lets tests
/// script per-type failure runs and bulk push/pull outcomes.
#[derive(Debug, Default)]
pub struct MockRemote {
    calls: parking_lot::Mutex<Vec<(MutationType, Value)>>,
    write_failures: parking_lot::Mutex<HashMap<MutationType, u32>>,
    write_delay: parking_lot::Mutex<Option<Duration>>,
    bulk_push_error: parking_lot::Mutex<Option<String>>,
    bulk_pull_error: parking_lot::Mutex<Option<String>>,
    pull_snapshot: parking_lot::Mutex<StateSnapshot>,
    pushed: parking_lot::Mutex<Vec<StateSnapshot>>,
}

impl MockRemote {
    /// Creates a mock remote where every call succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` writes of `ty` fail.
    pub fn fail_writes(&self, ty: MutationType, count: u32) {
        self.write_failures.lock().insert(ty, count);
    }

    /// Makes each `write_typed` call take `delay` before completing.
    ///
    /// Lets tests interleave events with an in-flight drain pass.
    pub fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.lock() = Some(delay);
    }

    /// Makes `bulk_push` fail with `message` until cleared.
    pub fn fail_bulk_push(&self, message: impl Into<String>) {
        *self.bulk_push_error.lock() = Some(message.into());
    }

    /// Makes `bulk_push` succeed again.
    pub fn clear_bulk_push_failure(&self) {
        *self.bulk_push_error.lock() = None;
    }

    /// Makes `bulk_pull` fail with `message` until cleared.
    pub fn fail_bulk_pull(&self, message: impl Into<String>) {
        *self.bulk_pull_error.lock() = Some(message.into());
    }

    /// Sets the snapshot returned by `bulk_pull`.
    pub fn set_pull_snapshot(&self, snapshot: StateSnapshot) {
        *self.pull_snapshot.lock() = snapshot;
    }

    /// Returns every recorded `write_typed` call, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<(MutationType, Value)> {
        self.calls.lock().clone()
    }

    /// Returns the recorded `write_typed` calls for one type.
    #[must_use]
    pub fn calls_for(&self, ty: MutationType) -> Vec<Value> {
        self.calls
            .lock()
            .iter()
            .filter(|(t, _)| *t == ty)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Returns every snapshot passed to `bulk_push`.
    #[must_use]
    pub fn pushed_snapshots(&self) -> Vec<StateSnapshot> {
        self.pushed.lock().clone()
    }
}

impl RemoteStore for MockRemote {
    async fn write_typed(&self, ty: MutationType, payload: &Value) -> Result<(), RemoteError> {
        self.calls.lock().push((ty, payload.clone()));

        let delay = *self.write_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut failures = self.write_failures.lock();
        if let Some(remaining) = failures.get_mut(&ty) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(RemoteError::new(format!("scripted failure for {ty}")));
            }
        }
        Ok(())
    }

    async fn bulk_push(&self, snapshot: &StateSnapshot) -> Result<(), RemoteError> {
        if let Some(message) = self.bulk_push_error.lock().clone() {
            return Err(RemoteError::new(message));
        }
        self.pushed.lock().push(snapshot.clone());
        Ok(())
    }

    async fn bulk_pull(&self) -> Result<StateSnapshot, RemoteError> {
        if let Some(message) = self.bulk_pull_error.lock().clone() {
            return Err(RemoteError::new(message));
        }
        Ok(self.pull_snapshot.lock().clone())
    }
}
