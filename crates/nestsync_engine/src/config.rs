//! Configuration for the sync engine.

use std::time::Duration;

/// Configuration for the sync controller and flush scheduler.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Delay between the most recent local edit and the scheduled drain.
    pub debounce: Duration,
    /// Failed push attempts after which a queue entry is dropped.
    pub retry_ceiling: u32,
    /// Whether the engine starts ready to accept enqueues.
    ///
    /// While not ready (for example, before authentication completes),
    /// `enqueue` is a silent no-op by design.
    pub ready: bool,
}

impl EngineConfig {
    /// Creates a configuration with the default knobs.
    #[must_use]
    pub fn new() -> Self {
        Self {
            debounce: Duration::from_millis(2000),
            retry_ceiling: 3,
            ready: true,
        }
    }

    /// Sets the debounce window.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Sets the retry ceiling.
    #[must_use]
    pub fn with_retry_ceiling(mut self, ceiling: u32) -> Self {
        self.retry_ceiling = ceiling;
        self
    }

    /// Sets the initial ready flag.
    #[must_use]
    pub fn with_ready(mut self, ready: bool) -> Self {
        self.ready = ready;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
