//! The sync controller and its status state machine.

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::persist;
use crate::queue::{FailureOutcome, MutationQueue};
use crate::remote::RemoteStore;
use crate::scheduler;
use crate::signal::{ConnectivitySignal, LifecycleSignal};
use chrono::Utc;
use nestsync_model::{MutationType, StateSnapshot, StatusReport, SyncStatus};
use nestsync_store::StoreBackend;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// The sync controller owns the mutation queue and the
/// {idle, syncing, synced, error, offline} status machine, and exposes the
/// engine's public operations.
///
/// The controller is the **single writer** of the queue and of the status:
/// call sites interact only through [`enqueue`](Self::enqueue),
/// [`force_full_sync`](Self::force_full_sync),
/// [`pull_from_remote`](Self::pull_from_remote), and
/// [`status`](Self::status). Drain passes and bulk operations serialize on
/// one internal guard, so at most one pass is in flight at any time; a pass
/// requested while another runs simply follows it.
///
/// [`spawn`](Self::spawn) starts the flush scheduler task, which owns all
/// timing decisions: debounced drains after edits, immediate drains on
/// reconnect and foreground resume, and defensive persistence on
/// backgrounding. The scheduler exits on its own once every handle to the
/// controller is dropped.
pub struct SyncController<R: RemoteStore, S: StoreBackend> {
    remote: R,
    store: S,
    queue: Mutex<MutationQueue>,
    status: RwLock<SyncStatus>,
    last_synced_at: RwLock<Option<chrono::DateTime<Utc>>>,
    online: AtomicBool,
    ready: AtomicBool,
    pass_guard: tokio::sync::Mutex<()>,
    edits: mpsc::UnboundedSender<()>,
}

impl<R, S> SyncController<R, S>
where
    R: RemoteStore + 'static,
    S: StoreBackend + 'static,
{
    /// Builds the controller and spawns its flush scheduler task.
    ///
    /// Restores the persisted queue snapshot and last-sync timestamp from
    /// `store` (absent slots mean a fresh start; unreadable slots are logged
    /// and treated as fresh). The connectivity signal's value at subscribe
    /// time seeds the `is_online` mirror and the initial status.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        config: EngineConfig,
        remote: R,
        store: S,
        connectivity: ConnectivitySignal,
        lifecycle: LifecycleSignal,
    ) -> Arc<Self> {
        let online = *connectivity.borrow();

        let entries = persist::load_queue(&store).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not restore queue snapshot; starting empty");
            Vec::new()
        });
        let last_synced_at = persist::load_last_synced(&store).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not restore last-sync timestamp");
            None
        });

        let (edits, edit_events) = mpsc::unbounded_channel();
        let controller = Arc::new(Self {
            remote,
            store,
            queue: Mutex::new(MutationQueue::from_entries(entries, config.retry_ceiling)),
            status: RwLock::new(if online {
                SyncStatus::Idle
            } else {
                SyncStatus::Offline
            }),
            last_synced_at: RwLock::new(last_synced_at),
            online: AtomicBool::new(online),
            ready: AtomicBool::new(config.ready),
            pass_guard: tokio::sync::Mutex::new(()),
            edits,
        });

        tokio::spawn(scheduler::run(
            Arc::downgrade(&controller),
            edit_events,
            connectivity,
            lifecycle,
            config.debounce,
        ));

        controller
    }

    /// Queues the full new state for `ty` and schedules a debounced drain.
    ///
    /// Replaces any already-queued mutation of the same type
    /// (last-writer-wins per type). Silently ignored while the engine is not
    /// [ready](Self::set_ready) - intentional low-stakes behavior for edits
    /// made before authentication completes, not an error. Never touches the
    /// network; while offline the mutation is queued and persisted, and
    /// drains wait for connectivity to return.
    pub fn enqueue(&self, ty: MutationType, payload: Value) {
        if !self.ready.load(Ordering::SeqCst) {
            tracing::debug!(%ty, "enqueue ignored: engine not ready");
            return;
        }
        self.queue.lock().enqueue(ty, payload);
        self.persist_queue();
        // Scheduler gone means every handle is being dropped; nothing to do.
        let _ = self.edits.send(());
        tracing::debug!(%ty, pending = self.queue.lock().len(), "mutation enqueued");
    }

    /// Queues a room state edit. Delegates to [`enqueue`](Self::enqueue).
    pub fn enqueue_room(&self, payload: Value) {
        self.enqueue(MutationType::Room, payload);
    }

    /// Queues a stats edit. Delegates to [`enqueue`](Self::enqueue).
    pub fn enqueue_stats(&self, payload: Value) {
        self.enqueue(MutationType::Stats, payload);
    }

    /// Queues a settings edit. Delegates to [`enqueue`](Self::enqueue).
    pub fn enqueue_settings(&self, payload: Value) {
        self.enqueue(MutationType::Settings, payload);
    }

    /// Queues a mascot edit. Delegates to [`enqueue`](Self::enqueue).
    pub fn enqueue_mascot(&self, payload: Value) {
        self.enqueue(MutationType::Mascot, payload);
    }

    /// Queues a collection edit. Delegates to [`enqueue`](Self::enqueue).
    pub fn enqueue_collection(&self, payload: Value) {
        self.enqueue(MutationType::Collection, payload);
    }

    /// Marks the engine ready (or not) to accept enqueues.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Returns a point-in-time read of the engine state.
    ///
    /// Pure read; always available, never blocks on the network.
    pub fn status(&self) -> StatusReport {
        StatusReport {
            status: *self.status.read(),
            last_synced_at: *self.last_synced_at.read(),
            is_online: self.online.load(Ordering::SeqCst),
            pending: self.queue.lock().len(),
        }
    }

    /// Runs one drain pass: pushes every queued mutation, one at a time.
    ///
    /// Each candidate is pushed to completion before the next; a success
    /// removes it, a failure advances its retry count and drops it at the
    /// ceiling. The residual queue is persisted after the pass. Ends in
    /// `synced` when every candidate write succeeded, otherwise in `error`;
    /// a fresh edit landing mid-pass stays queued for its own debounced
    /// pass without tainting this one. A pass with an empty queue, or while
    /// offline, is a no-op.
    pub async fn drain_queue(&self) {
        let _pass = self.pass_guard.lock().await;
        if !self.online.load(Ordering::SeqCst) {
            return;
        }
        let candidates = self.queue.lock().drain_candidates();
        if candidates.is_empty() {
            return;
        }

        self.set_status(SyncStatus::Syncing);
        tracing::debug!(pending = candidates.len(), "drain pass started");

        let mut failed = false;
        for mutation in candidates {
            match self
                .remote
                .write_typed(mutation.mutation_type, &mutation.payload)
                .await
            {
                Ok(()) => {
                    self.queue.lock().mark_succeeded(&mutation.id);
                }
                Err(e) => {
                    failed = true;
                    match self.queue.lock().mark_failed(&mutation.id) {
                        Some(FailureOutcome::Dropped) => {
                            tracing::warn!(
                                ty = %mutation.mutation_type,
                                error = %e,
                                "mutation dropped: retry ceiling reached"
                            );
                        }
                        Some(FailureOutcome::Retained) => {
                            tracing::debug!(
                                ty = %mutation.mutation_type,
                                error = %e,
                                retries = mutation.retry_count + 1,
                                "write failed; mutation retained for next pass"
                            );
                        }
                        // A newer edit replaced the entry mid-flight; its
                        // fresh retry count must not be charged for this
                        // attempt.
                        None => {}
                    }
                }
            }
        }

        let clean = !failed;
        self.persist_queue();
        if clean {
            self.touch_last_synced();
        }
        // Connectivity may have dropped mid-pass; offline then wins.
        if self.online.load(Ordering::SeqCst) {
            self.set_status(if clean {
                SyncStatus::Synced
            } else {
                SyncStatus::Error
            });
        }
    }

    /// Pushes a full state snapshot, bypassing the incremental queue.
    ///
    /// On success the queue is cleared - the bulk push supersedes any
    /// pending incremental items - and the status becomes `synced` with a
    /// fresh last-sync timestamp. On failure the queue is left untouched
    /// and the status becomes `error`.
    pub async fn force_full_sync(&self, snapshot: &StateSnapshot) -> EngineResult<()> {
        let _pass = self.pass_guard.lock().await;
        self.set_status(SyncStatus::Syncing);

        match self.remote.bulk_push(snapshot).await {
            Ok(()) => {
                self.queue.lock().clear();
                self.persist_queue();
                self.touch_last_synced();
                self.set_status(SyncStatus::Synced);
                tracing::debug!("full snapshot pushed; queue cleared");
                Ok(())
            }
            Err(e) => {
                self.set_status(SyncStatus::Error);
                Err(e.into())
            }
        }
    }

    /// Fetches the remote's full state snapshot for the caller to merge
    /// into local state.
    ///
    /// Never touches the mutation queue; only wraps the call in the
    /// `syncing` → `synced`/`error` transition.
    pub async fn pull_from_remote(&self) -> EngineResult<StateSnapshot> {
        let _pass = self.pass_guard.lock().await;
        self.set_status(SyncStatus::Syncing);

        match self.remote.bulk_pull().await {
            Ok(snapshot) => {
                self.set_status(SyncStatus::Synced);
                Ok(snapshot)
            }
            Err(e) => {
                self.set_status(SyncStatus::Error);
                Err(e.into())
            }
        }
    }

    /// Persists the queue snapshot immediately.
    ///
    /// The scheduler calls this on the background lifecycle transition,
    /// ahead of possible process termination; every queue mutation also
    /// persists on its own, so this only narrows the window.
    pub fn persist_now(&self) {
        self.persist_queue();
    }

    pub(crate) fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.queue.lock().is_empty()
    }

    pub(crate) fn note_offline(&self) {
        self.online.store(false, Ordering::SeqCst);
        self.set_status(SyncStatus::Offline);
        tracing::debug!("connectivity lost");
    }

    pub(crate) fn note_online(&self) {
        self.online.store(true, Ordering::SeqCst);
        // With nothing to drain there is no syncing pass to re-enter
        // through; the machine goes back to idle.
        if !self.has_pending() && *self.status.read() == SyncStatus::Offline {
            self.set_status(SyncStatus::Idle);
        }
        tracing::debug!(pending = self.queue.lock().len(), "connectivity restored");
    }

    fn set_status(&self, status: SyncStatus) {
        *self.status.write() = status;
    }

    fn touch_last_synced(&self) {
        let now = Utc::now();
        *self.last_synced_at.write() = Some(now);
        if let Err(e) = persist::save_last_synced(&self.store, now) {
            tracing::warn!(error = %e, "could not persist last-sync timestamp");
        }
    }

    fn persist_queue(&self) {
        let entries = self.queue.lock().entries().to_vec();
        if let Err(e) = persist::save_queue(&self.store, &entries) {
            // Non-fatal: the engine keeps operating in memory and the next
            // queue mutation retries persistence.
            tracing::warn!(error = %e, "could not persist queue snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MockRemote;
    use crate::signal::{connectivity_channel, lifecycle_channel, LifecyclePhase};
    use nestsync_store::InMemoryStore;
    use serde_json::json;

    type TestController = Arc<SyncController<Arc<MockRemote>, Arc<InMemoryStore>>>;

    fn spawn_controller(config: EngineConfig, online: bool) -> (TestController, Arc<MockRemote>) {
        let remote = Arc::new(MockRemote::new());
        let store = Arc::new(InMemoryStore::new());
        let (_conn_tx, conn_rx) = connectivity_channel(online);
        let (_life_tx, life_rx) = lifecycle_channel(LifecyclePhase::Active);
        let ctrl = SyncController::spawn(
            config,
            Arc::clone(&remote),
            store,
            conn_rx,
            life_rx,
        );
        (ctrl, remote)
    }

    #[tokio::test]
    async fn initial_status_reflects_connectivity() {
        let (ctrl, _) = spawn_controller(EngineConfig::new(), true);
        assert_eq!(ctrl.status().status, SyncStatus::Idle);
        assert!(ctrl.status().is_online);

        let (ctrl, _) = spawn_controller(EngineConfig::new(), false);
        assert_eq!(ctrl.status().status, SyncStatus::Offline);
        assert!(!ctrl.status().is_online);
    }

    #[tokio::test]
    async fn enqueue_is_dropped_while_not_ready() {
        let (ctrl, _) = spawn_controller(EngineConfig::new().with_ready(false), true);
        ctrl.enqueue_stats(json!({"sessions": 1}));
        assert_eq!(ctrl.status().pending, 0);

        ctrl.set_ready(true);
        ctrl.enqueue_stats(json!({"sessions": 1}));
        assert_eq!(ctrl.status().pending, 1);
    }

    #[tokio::test]
    async fn drain_pushes_each_candidate_and_syncs() {
        let (ctrl, remote) = spawn_controller(EngineConfig::new(), true);
        ctrl.enqueue_room(json!({"wallpaper": "forest"}));
        ctrl.enqueue_mascot(json!({"mood": "happy"}));

        ctrl.drain_queue().await;

        let report = ctrl.status();
        assert_eq!(report.status, SyncStatus::Synced);
        assert_eq!(report.pending, 0);
        assert!(report.last_synced_at.is_some());
        assert_eq!(remote.calls().len(), 2);
    }

    #[tokio::test]
    async fn failed_write_retains_entry_and_sets_error() {
        let (ctrl, remote) = spawn_controller(EngineConfig::new(), true);
        remote.fail_writes(MutationType::Settings, 1);
        ctrl.enqueue_settings(json!({"theme": "dark"}));

        ctrl.drain_queue().await;

        let report = ctrl.status();
        assert_eq!(report.status, SyncStatus::Error);
        assert_eq!(report.pending, 1);
        assert!(report.last_synced_at.is_none());

        // The retained entry succeeds on the next pass.
        ctrl.drain_queue().await;
        assert_eq!(ctrl.status().status, SyncStatus::Synced);
        assert_eq!(ctrl.status().pending, 0);
    }

    #[tokio::test]
    async fn retry_ceiling_drops_entry_with_error_status() {
        let (ctrl, remote) = spawn_controller(EngineConfig::new(), true);
        remote.fail_writes(MutationType::Collection, 3);
        ctrl.enqueue_collection(json!(["badge_1"]));

        ctrl.drain_queue().await;
        ctrl.drain_queue().await;
        assert_eq!(ctrl.status().pending, 1);

        ctrl.drain_queue().await;
        let report = ctrl.status();
        assert_eq!(report.pending, 0);
        assert_eq!(report.status, SyncStatus::Error);
        assert_eq!(remote.calls_for(MutationType::Collection).len(), 3);
    }

    #[tokio::test]
    async fn drain_while_offline_is_a_no_op() {
        let (ctrl, remote) = spawn_controller(EngineConfig::new(), false);
        ctrl.enqueue_room(json!({"wallpaper": "cave"}));

        ctrl.drain_queue().await;

        assert!(remote.calls().is_empty());
        assert_eq!(ctrl.status().status, SyncStatus::Offline);
        assert_eq!(ctrl.status().pending, 1);
    }

    #[tokio::test]
    async fn force_full_sync_clears_queue_on_success() {
        let (ctrl, remote) = spawn_controller(EngineConfig::new(), true);
        ctrl.enqueue_room(json!({"wallpaper": "forest"}));
        ctrl.enqueue_stats(json!({"sessions": 9}));

        let snapshot = StateSnapshot::new().with(MutationType::Room, json!({"wallpaper": "beach"}));
        ctrl.force_full_sync(&snapshot).await.unwrap();

        let report = ctrl.status();
        assert_eq!(report.status, SyncStatus::Synced);
        assert_eq!(report.pending, 0);
        assert_eq!(remote.pushed_snapshots(), vec![snapshot]);
        // The bulk push superseded the incremental items.
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn force_full_sync_failure_leaves_queue_untouched() {
        let (ctrl, remote) = spawn_controller(EngineConfig::new(), true);
        remote.fail_bulk_push("backend down");
        ctrl.enqueue_stats(json!({"sessions": 2}));

        let snapshot = StateSnapshot::new();
        assert!(ctrl.force_full_sync(&snapshot).await.is_err());

        let report = ctrl.status();
        assert_eq!(report.status, SyncStatus::Error);
        assert_eq!(report.pending, 1);
    }

    #[tokio::test]
    async fn pull_returns_snapshot_without_touching_queue() {
        let (ctrl, remote) = spawn_controller(EngineConfig::new(), true);
        let snapshot = StateSnapshot::new().with(MutationType::Mascot, json!({"mood": "sleepy"}));
        remote.set_pull_snapshot(snapshot.clone());
        ctrl.enqueue_settings(json!({"theme": "light"}));

        let pulled = ctrl.pull_from_remote().await.unwrap();
        assert_eq!(pulled, snapshot);
        assert_eq!(ctrl.status().status, SyncStatus::Synced);
        assert_eq!(ctrl.status().pending, 1);

        remote.fail_bulk_pull("timeout");
        assert!(ctrl.pull_from_remote().await.is_err());
        assert_eq!(ctrl.status().status, SyncStatus::Error);
    }

    #[tokio::test]
    async fn persistence_failure_is_non_fatal() {
        let remote = Arc::new(MockRemote::new());
        let store = Arc::new(InMemoryStore::new());
        let (_conn_tx, conn_rx) = connectivity_channel(true);
        let (_life_tx, life_rx) = lifecycle_channel(LifecyclePhase::Active);
        let ctrl = SyncController::spawn(
            EngineConfig::new(),
            Arc::clone(&remote),
            Arc::clone(&store),
            conn_rx,
            life_rx,
        );

        store.set_failing(true);
        ctrl.enqueue_room(json!({"wallpaper": "storm"}));
        // The edit is queued in memory despite the failed persist.
        assert_eq!(ctrl.status().pending, 1);

        // The next mutation retries persistence once the store recovers.
        store.set_failing(false);
        ctrl.enqueue_stats(json!({"sessions": 5}));
        let persisted = store.get(persist::QUEUE_KEY).unwrap().unwrap();
        let entries: Vec<nestsync_model::QueuedMutation> =
            serde_json::from_slice(&persisted).unwrap();
        assert_eq!(entries.len(), 2);
    }
}
