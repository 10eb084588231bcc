//! Safety-stop reporting.
//!
//! Every session teardown ends in exactly one [`SafetyStop`] handed to an
//! injected [`SafetyReporter`]. The report is unconditional: a session that is
//! simply dropped, with no fault, reports too.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::relay::{RelayStage, RelayStats};

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopCause {
    /// No cycle completed within one monitor period.
    DeadlineMiss,
    /// A socket failed in the given stage.
    Transport(RelayStage),
    /// A frame failed to decode in the given stage.
    Decode(RelayStage),
    /// The session was dropped without a fault.
    Dropped,
    /// The relay could not run at all.
    Halted,
}

impl StopCause {
    /// Human-readable cause name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DeadlineMiss => "deadline miss",
            Self::Transport(_) => "transport failure",
            Self::Decode(_) => "decode failure",
            Self::Dropped => "dropped",
            Self::Halted => "halted",
        }
    }

    /// Stage the cause is attributed to, if any.
    #[must_use]
    pub fn stage(self) -> Option<RelayStage> {
        match self {
            Self::Transport(stage) | Self::Decode(stage) => Some(stage),
            Self::DeadlineMiss | Self::Dropped | Self::Halted => None,
        }
    }

    /// Whether the stop followed a fault rather than a plain drop.
    #[must_use]
    pub fn is_fault(self) -> bool {
        self != Self::Dropped
    }
}

impl fmt::Display for StopCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage() {
            Some(stage) => write!(f, "{} during {stage}", self.as_str()),
            None => f.write_str(self.as_str()),
        }
    }
}

/// A safety-stop event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyStop {
    /// What ended the session.
    pub cause: StopCause,
    /// Relay counters at the moment of the stop.
    pub stats: RelayStats,
}

/// Sink for safety-stop events.
pub trait SafetyReporter: Send + Sync + fmt::Debug {
    /// Report that the session has been torn down.
    fn safety_stop(&self, event: &SafetyStop);
}

/// Reporter that writes the safety stop to the log at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl SafetyReporter for LogReporter {
    fn safety_stop(&self, event: &SafetyStop) {
        error!(
            cause = %event.cause,
            cycles_completed = event.stats.cycles_completed,
            "terminating with safety stop because something went wrong"
        );
    }
}

/// Reporter that records events in memory.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<SafetyStop>>>,
}

impl RecordingReporter {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events recorded.
    #[must_use]
    pub fn count(&self) -> usize {
        self.events.lock().len()
    }

    /// All recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<SafetyStop> {
        self.events.lock().clone()
    }

    /// The most recent event.
    #[must_use]
    pub fn last(&self) -> Option<SafetyStop> {
        self.events.lock().last().copied()
    }
}

impl SafetyReporter for RecordingReporter {
    fn safety_stop(&self, event: &SafetyStop) {
        self.events.lock().push(*event);
    }
}

/// Once-only latch guarding the shutdown sequence.
#[derive(Debug, Default)]
pub struct ShutdownLatch {
    engaged: bool,
}

impl ShutdownLatch {
    /// Engage the latch. Returns `true` only on the first call.
    #[must_use]
    pub fn engage(&mut self) -> bool {
        !std::mem::replace(&mut self.engaged, true)
    }

    /// Whether shutdown has already run.
    #[must_use]
    pub fn is_engaged(&self) -> bool {
        self.engaged
    }
}
