//! Connectivity and lifecycle signal channels.
//!
//! The OS-level signal sources live outside this crate; the engine consumes
//! their transitions through `tokio::sync::watch` channels, which hand every
//! subscriber the latest value at subscribe time.

use tokio::sync::watch;

/// Receiver side of the connectivity signal: `true` means online.
pub type ConnectivitySignal = watch::Receiver<bool>;

/// Receiver side of the lifecycle signal.
pub type LifecycleSignal = watch::Receiver<LifecyclePhase>;

/// Hosting-process lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// The app is in the foreground.
    Active,
    /// The app has been backgrounded and may be terminated at any point.
    Background,
}

/// Creates a connectivity channel seeded with `initial_online`.
///
/// The platform's network monitor holds the sender; the engine subscribes
/// with the receiver.
pub fn connectivity_channel(initial_online: bool) -> (watch::Sender<bool>, ConnectivitySignal) {
    watch::channel(initial_online)
}

/// Creates a lifecycle channel seeded with `initial`.
pub fn lifecycle_channel(
    initial: LifecyclePhase,
) -> (watch::Sender<LifecyclePhase>, LifecycleSignal) {
    watch::channel(initial)
}
