//! Whole-cycle deadline monitor.
//!
//! The monitor is a recurring heartbeat rather than a per-stage timeout. Every
//! period it consumes the [`LivenessFlag`]; if no cycle completed since the
//! previous tick, the deadline is missed. Missed ticks are delayed, never
//! burst, so a stalled executor cannot produce several ticks back to back.

use std::future;
use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{trace, warn};

use crate::config::MIN_CYCLE_DEADLINE;
use crate::liveness::LivenessFlag;

/// Monitor lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitorStatus {
    /// Created, timer not started.
    Idle,
    /// Timer running.
    Armed,
    /// A tick found the liveness flag clear.
    Expired,
    /// Timer dropped by shutdown.
    Cancelled,
}

impl MonitorStatus {
    /// Human-readable status name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Armed => "armed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the timer is running.
    #[must_use]
    pub fn is_armed(self) -> bool {
        self == Self::Armed
    }
}

impl std::fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an expired monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineMiss {
    /// The period that elapsed without a completed cycle.
    pub deadline: Duration,
    /// Tick number that detected the miss, starting at 1.
    pub tick: u64,
}

/// Recurring deadline timer.
#[derive(Debug)]
pub struct DeadlineMonitor {
    period: Duration,
    ticker: Option<Interval>,
    status: MonitorStatus,
    ticks: u64,
}

impl DeadlineMonitor {
    /// Create an idle monitor with the given period.
    ///
    /// Periods below one millisecond are raised to one millisecond.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(MIN_CYCLE_DEADLINE),
            ticker: None,
            status: MonitorStatus::Idle,
            ticks: 0,
        }
    }

    /// Start the timer. The first tick fires one period from now.
    ///
    /// Only an idle monitor can be armed; returns whether the timer started.
    pub fn arm(&mut self) -> bool {
        if self.status != MonitorStatus::Idle {
            return false;
        }
        let start = Instant::now()
            .checked_add(self.period)
            .unwrap_or_else(Instant::now);
        let mut ticker = time::interval_at(start, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
        self.status = MonitorStatus::Armed;
        true
    }

    /// Wait until a tick finds the liveness flag clear.
    ///
    /// Arms an idle monitor first. A cancelled or expired monitor never
    /// completes. Cancel safe: dropping the future between ticks loses nothing.
    pub async fn expired(&mut self, liveness: &LivenessFlag) -> DeadlineMiss {
        if self.status == MonitorStatus::Idle {
            self.arm();
        }

        loop {
            let Some(ticker) = self.ticker.as_mut() else {
                return future::pending().await;
            };
            ticker.tick().await;
            self.ticks = self.ticks.saturating_add(1);

            if liveness.consume() {
                trace!(tick = self.ticks, "deadline satisfied");
                continue;
            }

            warn!(
                tick = self.ticks,
                deadline_us = self.period.as_micros(),
                "relay cycle missed its deadline"
            );
            self.ticker = None;
            self.status = MonitorStatus::Expired;
            return DeadlineMiss {
                deadline: self.period,
                tick: self.ticks,
            };
        }
    }

    /// Stop the timer. Idempotent.
    pub fn cancel(&mut self) {
        self.ticker = None;
        if self.status != MonitorStatus::Expired {
            self.status = MonitorStatus::Cancelled;
        }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> MonitorStatus {
        self.status
    }

    /// Monitor period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of ticks observed so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
