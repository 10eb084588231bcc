//! # loopguard-peers
//!
//! Reference peers for the loopguard relay protocol: a simulated sensor rig
//! and a proportional controller client. They exist to drive the watchdog in
//! integration tests and demos and are never linked into the watchdog itself.
//!
//! ## Architecture
//!
//! - [`sensor`] - sensor rig simulator, serving observations and consuming control laws
//! - [`client`] - reference controller, answering each observation with a control law
//! - [`barrier`] - wait-for-N barrier between the sensor loop and its peripherals
//! - [`peripherals`] - simulated GPS and camera samplers
//! - [`stats`] - per-peer counters
//! - [`error`] - error types
//!
//! ## Peripheral scheduling
//!
//! ```text
//! cycle n:  trigger([Gps])            every cycle
//!           trigger([Camera, Gps])    when n % 5 == 0
//!
//!  sensor loop ──trigger──► barrier ──wait_turn──► peripheral task
//!       ▲                      │                        │
//!       └──── all arrived ◄────┴────────arrive◄─────────┘
//! ```
//!
//! Both peers are generic over any `AsyncRead + AsyncWrite` stream, so tests
//! can run them over in-memory pipes as well as TCP.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod barrier;
pub mod client;
pub mod error;
pub mod peripherals;
pub mod sensor;
pub mod stats;

mod transfer;

pub mod prelude;

pub use barrier::PeripheralBarrier;
pub use client::{ClientConfig, ReferenceClient, CONTROL_LAW_BYTES};
pub use error::{PeerError, PeerResult};
pub use peripherals::{PeripheralId, SampleSlot};
pub use sensor::{SensorConfig, SensorSimulator};
pub use stats::PeerStats;
