//! Relay session.
//!
//! A [`Session`] owns both endpoints, the scratch buffer, the liveness flag
//! and the deadline monitor. It is created once after the startup handshakes
//! and runs until the first failure. There is no reconnection and no second
//! session.
//!
//! # Shutdown
//!
//! Shutdown happens exactly once, whichever path gets there first:
//!
//! 1. the deadline monitor expires,
//! 2. a relay stage fails,
//! 3. the session is dropped.
//!
//! In every case the timer is cancelled, both endpoints are shut down in both
//! directions, and a [`SafetyStop`] is reported, including on a plain drop.

use std::sync::Arc;
use std::time::Duration;

use loopguard_protocol::BUFFER_CAPACITY;
use tokio::net::TcpStream;
use tracing::{info, warn};

use crate::config::WatchdogConfig;
use crate::deadline::{DeadlineMiss, DeadlineMonitor, MonitorStatus};
use crate::endpoint::Endpoint;
use crate::error::WatchdogError;
use crate::liveness::LivenessFlag;
use crate::relay::{RelayStage, RelayStateMachine, RelayStats};
use crate::shutdown::{SafetyReporter, SafetyStop, ShutdownLatch, StopCause};

/// Summary returned when a session ends.
#[derive(Debug)]
pub struct SessionReport {
    /// The failure that ended the session.
    pub cause: WatchdogError,
    /// Stage the failure was attributed to, or `Failed` for a deadline miss.
    pub final_stage: RelayStage,
    /// Relay counters at the moment of the stop.
    pub stats: RelayStats,
}

impl SessionReport {
    /// Full cycles completed before the stop.
    #[must_use]
    pub fn cycles_completed(&self) -> u64 {
        self.stats.cycles_completed
    }
}

enum Outcome {
    Missed(DeadlineMiss),
    Faulted(WatchdogError),
}

/// One relay session between a sensor rig and a client.
pub struct Session<S: Endpoint = TcpStream> {
    sensor: Option<S>,
    client: Option<S>,
    buffer: Box<[u8; BUFFER_CAPACITY]>,
    liveness: LivenessFlag,
    monitor: DeadlineMonitor,
    stats: RelayStats,
    reporter: Arc<dyn SafetyReporter>,
    latch: ShutdownLatch,
}

impl<S: Endpoint> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("monitor", &self.monitor)
            .field("stats", &self.stats)
            .field("shut_down", &self.latch.is_engaged())
            .finish_non_exhaustive()
    }
}

impl<S: Endpoint> Session<S> {
    /// Create a session over two connected endpoints.
    #[must_use]
    pub fn new(
        sensor: S,
        client: S,
        cycle_deadline: Duration,
        reporter: Arc<dyn SafetyReporter>,
    ) -> Self {
        Self {
            sensor: Some(sensor),
            client: Some(client),
            buffer: Box::new([0u8; BUFFER_CAPACITY]),
            liveness: LivenessFlag::new(),
            monitor: DeadlineMonitor::new(cycle_deadline),
            stats: RelayStats::default(),
            reporter,
            latch: ShutdownLatch::default(),
        }
    }

    /// Create a session using the deadline from `config`.
    #[must_use]
    pub fn from_config(
        sensor: S,
        client: S,
        config: &WatchdogConfig,
        reporter: Arc<dyn SafetyReporter>,
    ) -> Self {
        Self::new(sensor, client, config.cycle_deadline, reporter)
    }

    /// Relay until the first failure, shut down, and report.
    pub async fn run(mut self) -> SessionReport {
        let cause = self.relay_until_failure().await;
        let final_stage = cause.stage().unwrap_or(RelayStage::Failed);
        info!(
            cause = %cause,
            cycles_completed = self.stats.cycles_completed,
            "relay session ended"
        );
        self.safety_shutdown(cause.stop_cause());

        SessionReport {
            cause,
            final_stage,
            stats: self.stats,
        }
    }

    async fn relay_until_failure(&mut self) -> WatchdogError {
        let (Some(sensor), Some(client)) = (self.sensor.as_mut(), self.client.as_mut()) else {
            return WatchdogError::RelayHalted;
        };
        info!(
            sensor = %sensor.peer_label(),
            client = %client.peer_label(),
            deadline_us = self.monitor.period().as_micros(),
            "relay session started"
        );

        self.monitor.arm();
        let relay = RelayStateMachine::new(
            sensor,
            client,
            &mut self.buffer,
            &self.liveness,
            &mut self.stats,
        );
        let monitor = &mut self.monitor;
        let liveness = &self.liveness;

        // Relay first: a cycle that completes in the same poll as a tick
        // signals liveness before the tick consumes it.
        let outcome = tokio::select! {
            biased;
            fault = relay.run() => Outcome::Faulted(fault),
            miss = monitor.expired(liveness) => Outcome::Missed(miss),
        };

        match outcome {
            Outcome::Faulted(fault) => fault,
            Outcome::Missed(miss) => {
                WatchdogError::deadline_miss(miss.deadline, self.stats.cycles_completed)
            }
        }
    }

    /// Cancel the timer, shut both endpoints down, and report a safety stop.
    ///
    /// Runs at most once; returns `false` if shutdown already happened.
    pub fn safety_shutdown(&mut self, cause: StopCause) -> bool {
        if !self.latch.engage() {
            return false;
        }

        self.monitor.cancel();
        let endpoints = [("sensor", self.sensor.take()), ("client", self.client.take())];
        for (role, endpoint) in endpoints {
            if let Some(endpoint) = endpoint
                && let Err(err) = endpoint.shutdown_both()
            {
                warn!(role, error = %err, "endpoint shutdown failed");
            }
        }

        self.reporter.safety_stop(&SafetyStop {
            cause,
            stats: self.stats,
        });
        true
    }

    /// Whether shutdown has run.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.latch.is_engaged()
    }

    /// Deadline monitor status.
    #[must_use]
    pub fn monitor_status(&self) -> MonitorStatus {
        self.monitor.status()
    }

    /// Relay counters so far.
    #[must_use]
    pub fn stats(&self) -> RelayStats {
        self.stats
    }
}

impl<S: Endpoint> Drop for Session<S> {
    fn drop(&mut self) {
        self.safety_shutdown(StopCause::Dropped);
    }
}
