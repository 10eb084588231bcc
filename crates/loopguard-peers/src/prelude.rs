//! Prelude module for convenient imports.

pub use crate::barrier::PeripheralBarrier;
pub use crate::client::{ClientConfig, ReferenceClient, CONTROL_LAW_BYTES};
pub use crate::error::{PeerError, PeerResult};
pub use crate::peripherals::PeripheralId;
pub use crate::sensor::{SensorConfig, SensorSimulator};
pub use crate::stats::PeerStats;
