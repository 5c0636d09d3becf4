//! The flush scheduler task.
//!
//! A single spawned task decides *when* drain passes run, so drains are
//! never concurrent with each other:
//!
//! - a local edit (re)arms one debounce deadline; only the last edit in the
//!   window fires it, and edits of different types coalesce into one pass
//! - offline→online drains immediately when the queue is non-empty,
//!   bypassing the window
//! - foreground resume while online drains immediately when the queue is
//!   non-empty
//! - backgrounding persists the queue instead of draining
//!
//! Offline clears any armed deadline and suppresses arming until
//! connectivity returns. The task awaits each pass before reading further
//! events, so a request landing mid-pass runs as another pass afterwards.

use crate::controller::SyncController;
use crate::remote::RemoteStore;
use crate::signal::{ConnectivitySignal, LifecyclePhase, LifecycleSignal};
use nestsync_store::StoreBackend;
use std::sync::Weak;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

/// Runs the scheduler loop until every controller handle is dropped or a
/// signal source goes away.
///
/// Holds only a weak reference between events: the scheduler must not keep
/// the controller (and with it the edit-channel sender) alive once the app
/// has dropped its handles.
pub(crate) async fn run<R, S>(
    controller: Weak<SyncController<R, S>>,
    mut edits: mpsc::UnboundedReceiver<()>,
    mut connectivity: ConnectivitySignal,
    mut lifecycle: LifecycleSignal,
    debounce: Duration,
) where
    R: RemoteStore + 'static,
    S: StoreBackend + 'static,
{
    // The armed debounce deadline, if any. Re-armed (replaced, never
    // stacked) on each edit; a pending deadline is cancellable, an
    // in-flight per-item write is not.
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            event = edits.recv() => {
                let Some(ctrl) = controller.upgrade() else { break };
                match event {
                    None => break,
                    Some(()) => {
                        if ctrl.is_online() {
                            deadline = Some(Instant::now() + debounce);
                        }
                    }
                }
            }
            changed = connectivity.changed() => {
                let Some(ctrl) = controller.upgrade() else { break };
                if changed.is_err() {
                    break;
                }
                let online = *connectivity.borrow_and_update();
                if online {
                    ctrl.note_online();
                    if ctrl.has_pending() {
                        deadline = None;
                        ctrl.drain_queue().await;
                    }
                } else {
                    deadline = None;
                    ctrl.note_offline();
                }
            }
            changed = lifecycle.changed() => {
                let Some(ctrl) = controller.upgrade() else { break };
                if changed.is_err() {
                    break;
                }
                // Copy the phase out so the watch borrow does not live
                // across the drain await below.
                let phase = *lifecycle.borrow_and_update();
                match phase {
                    LifecyclePhase::Active => {
                        if ctrl.is_online() && ctrl.has_pending() {
                            deadline = None;
                            ctrl.drain_queue().await;
                        }
                    }
                    LifecyclePhase::Background => {
                        tracing::debug!("app backgrounded; persisting queue");
                        ctrl.persist_now();
                    }
                }
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                let Some(ctrl) = controller.upgrade() else { break };
                deadline = None;
                ctrl.drain_queue().await;
            }
        }
    }

    tracing::debug!("flush scheduler stopped");
}
