//! Liveness flag shared by the relay and the deadline monitor.

use std::sync::atomic::{AtomicBool, Ordering};

/// Set once per completed relay cycle, consumed once per monitor tick.
///
/// The flag carries no data besides itself, so relaxed ordering is enough.
#[derive(Debug, Default)]
pub struct LivenessFlag {
    satisfied: AtomicBool,
}

impl LivenessFlag {
    /// Create a cleared flag.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            satisfied: AtomicBool::new(false),
        }
    }

    /// Record that a full relay cycle completed.
    pub fn signal(&self) {
        self.satisfied.store(true, Ordering::Relaxed);
    }

    /// Clear the flag, returning whether it was set.
    #[must_use]
    pub fn consume(&self) -> bool {
        self.satisfied.swap(false, Ordering::Relaxed)
    }

    /// Whether the flag is currently set.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.satisfied.load(Ordering::Relaxed)
    }
}
