//! Prelude module for convenient imports.
//!
//! ```rust
//! use loopguard_watchdog::prelude::*;
//!
//! let config = WatchdogConfig::default();
//! assert!(config.validate().is_ok());
//! ```

pub use crate::config::{WatchdogConfig, WatchdogConfigBuilder};
pub use crate::deadline::{DeadlineMiss, DeadlineMonitor, MonitorStatus};
pub use crate::endpoint::Endpoint;
pub use crate::error::{WatchdogError, WatchdogResult};
pub use crate::liveness::LivenessFlag;
pub use crate::relay::{RelayStage, RelayStateMachine, RelayStats};
pub use crate::session::{Session, SessionReport};
pub use crate::shutdown::{LogReporter, RecordingReporter, SafetyReporter, SafetyStop, StopCause};
pub use crate::startup::{accept_client, bind_client_listener, connect_sensor, establish};
