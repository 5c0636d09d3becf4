//! Error types for the sync engine.

use nestsync_store::StoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// A failed remote store call.
///
/// Remote failures only need to be distinguishable from success; the engine
/// retries them uniformly up to the bounded ceiling, so no finer taxonomy is
/// carried.
#[derive(Debug, Clone, Error)]
#[error("remote store error: {0}")]
pub struct RemoteError(String);

impl RemoteError {
    /// Creates a remote error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur during engine operations.
///
/// None of these are fatal to the hosting process: per-item remote failures
/// end as retained or dropped queue entries, connectivity loss is the
/// `offline` status rather than an error, and persistence failures are
/// logged and retried on the next queue mutation. Callers only see an
/// `EngineError` from the explicit bulk operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A remote write, bulk push, or bulk pull failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The persistent slot store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Encoding or decoding a persisted slot failed.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}
