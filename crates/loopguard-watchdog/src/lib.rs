//! # loopguard-watchdog
//!
//! Deadline-enforcing relay between a sensor rig and a controller client.
//!
//! The watchdog sits in the middle of a closed control loop. Once per cycle it
//! reads an observation from the sensor rig, forwards it to the controller
//! client, reads back the computed control law and forwards it to the sensor
//! rig. A whole-cycle deadline monitor runs alongside the relay; if a cycle
//! fails to complete within one monitor period, or any stage fails, the
//! session is torn down and a safety stop is reported. Nothing is retried:
//! silently repeating or skipping a control cycle is worse than stopping.
//!
//! ## Architecture
//!
//! - [`codec`](loopguard_protocol) - wire frames, re-exported from `loopguard-protocol`
//! - [`relay`] - the five-stage relay state machine
//! - [`deadline`] - recurring whole-cycle deadline monitor
//! - [`liveness`] - the flag shared by the relay and the monitor
//! - [`session`] - owner of both endpoints, the scratch buffer and the timer
//! - [`shutdown`] - safety-stop reporting and the once-only shutdown latch
//! - [`endpoint`] - socket seam (`TcpStream` in production, duplex pipes in simulation)
//! - [`startup`] - connect-to-sensor / accept-from-client handshake
//! - [`config`] - runtime configuration
//! - [`error`] - error taxonomy
//!
//! ## Relay cycle
//!
//! ```text
//! ReadSensor ──► WriteToClient ──► ReadHeader ──► ReadBody ──► WriteToSensor
//!     ▲                                                            │
//!     └──────────────────── signal liveness ◄──────────────────────┘
//!
//! any stage error ──► Failed ──► safety shutdown
//! ```
//!
//! ## Concurrency
//!
//! One task polls the relay and the deadline monitor together. Each relay
//! stage has exactly one transfer in flight, so the single scratch buffer is
//! never read and written at the same time. The liveness flag is the only
//! state touched by both paths, and relaxed atomics are enough for it.
//!
//! ## Safety stop reporting
//!
//! A session reports a safety stop on **every** teardown path, including a
//! plain drop with no fault. This is conservative and atypical: downstream
//! tooling cannot tell a clean exit from a fail-safe one by the report alone.
//!
//! ## Example
//!
//! ```rust,no_run
//! use loopguard_watchdog::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> WatchdogResult<()> {
//! let config = WatchdogConfig::builder()
//!     .sensor_host("localhost")
//!     .sensor_port(30000)
//!     .listen_port(15000)
//!     .build()?;
//!
//! let session = establish(&config, Arc::new(LogReporter)).await?;
//! let report = session.run().await;
//! eprintln!("session ended: {}", report.cause);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod deadline;
pub mod endpoint;
pub mod error;
pub mod liveness;
pub mod relay;
pub mod session;
pub mod shutdown;
pub mod startup;

pub mod prelude;

pub use config::{WatchdogConfig, WatchdogConfigBuilder};
pub use deadline::{DeadlineMiss, DeadlineMonitor, MonitorStatus};
pub use endpoint::Endpoint;
pub use error::{WatchdogError, WatchdogResult};
pub use liveness::LivenessFlag;
pub use relay::{RelayStage, RelayStateMachine, RelayStats};
pub use session::{Session, SessionReport};
pub use shutdown::{LogReporter, RecordingReporter, SafetyReporter, SafetyStop, StopCause};
pub use startup::{accept_client, bind_client_listener, connect_sensor, establish};

/// Default upper bound on one full relay cycle.
pub const DEFAULT_CYCLE_DEADLINE_MS: u64 = 5;
