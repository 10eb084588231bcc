//! Error types for the watchdog.
//!
//! Errors fall into two classes. Startup failures happen before a session
//! exists and end the process. Session failures end the one relay session
//! and always go through the safety shutdown path. Nothing here is retried.

use std::io;
use std::time::Duration;

use loopguard_protocol::ProtocolError;
use thiserror::Error;

use crate::relay::RelayStage;
use crate::shutdown::StopCause;

/// Errors that can occur while starting or running a relay session.
#[derive(Debug, Error)]
pub enum WatchdogError {
    /// Could not connect to the sensor rig.
    #[error("Failed to connect to sensor at {endpoint}: {source}")]
    ConnectFailure {
        /// `host:port` that was dialled.
        endpoint: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// Could not bind the client listener or accept the client.
    #[error("Failed to accept client on {endpoint}: {source}")]
    AcceptFailure {
        /// `address:port` being listened on.
        endpoint: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// A frame failed to decode or exceeded the buffer ceiling.
    #[error("Decode failure during {stage}: {source}")]
    Decode {
        /// Relay stage that was running.
        stage: RelayStage,
        /// Codec error.
        #[source]
        source: ProtocolError,
    },

    /// A socket read or write failed, including an orderly close by the peer.
    #[error("Transport failure during {stage}: {source}")]
    Transport {
        /// Relay stage that was running.
        stage: RelayStage,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// A full relay cycle did not complete within one monitor period.
    #[error("Deadline miss: no relay cycle completed within {deadline:?} (after {cycles_completed} cycles)")]
    DeadlineMiss {
        /// Monitor period that elapsed.
        deadline: Duration,
        /// Cycles completed before the miss.
        cycles_completed: u64,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The relay was asked to run after its session released the endpoints.
    #[error("Relay halted: session endpoints already released")]
    RelayHalted,
}

impl WatchdogError {
    /// Create a connect failure error.
    #[must_use]
    pub fn connect_failure(endpoint: impl Into<String>, source: io::Error) -> Self {
        Self::ConnectFailure {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Create an accept failure error.
    #[must_use]
    pub fn accept_failure(endpoint: impl Into<String>, source: io::Error) -> Self {
        Self::AcceptFailure {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Create a decode error for `stage`.
    #[must_use]
    pub fn decode(stage: RelayStage, source: ProtocolError) -> Self {
        Self::Decode { stage, source }
    }

    /// Create a transport error for `stage`.
    #[must_use]
    pub fn transport(stage: RelayStage, source: io::Error) -> Self {
        Self::Transport { stage, source }
    }

    /// Create a deadline miss error.
    #[must_use]
    pub fn deadline_miss(deadline: Duration, cycles_completed: u64) -> Self {
        Self::DeadlineMiss {
            deadline,
            cycles_completed,
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Whether this error happened before a session existed.
    #[must_use]
    pub fn is_startup_failure(&self) -> bool {
        matches!(
            self,
            Self::ConnectFailure { .. } | Self::AcceptFailure { .. } | Self::InvalidConfiguration(_)
        )
    }

    /// Whether this error ended a running session.
    #[must_use]
    pub fn is_session_failure(&self) -> bool {
        !self.is_startup_failure()
    }

    /// Relay stage the error was raised in, if any.
    #[must_use]
    pub fn stage(&self) -> Option<RelayStage> {
        match self {
            Self::Decode { stage, .. } | Self::Transport { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Safety-stop cause reported when this error ends a session.
    #[must_use]
    pub fn stop_cause(&self) -> StopCause {
        match self {
            Self::Decode { stage, .. } => StopCause::Decode(*stage),
            Self::Transport { stage, .. } => StopCause::Transport(*stage),
            Self::DeadlineMiss { .. } => StopCause::DeadlineMiss,
            Self::ConnectFailure { .. }
            | Self::AcceptFailure { .. }
            | Self::InvalidConfiguration(_)
            | Self::RelayHalted => StopCause::Halted,
        }
    }
}

/// A specialized `Result` type for watchdog operations.
pub type WatchdogResult<T> = std::result::Result<T, WatchdogError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn reset() -> io::Error {
        io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer")
    }

    #[test]
    fn test_error_display() {
        let err = WatchdogError::connect_failure("localhost:30000", reset());
        let text = err.to_string();
        assert!(text.contains("localhost:30000"));
        assert!(text.contains("reset by peer"));

        let err = WatchdogError::transport(RelayStage::ReadBody, reset());
        assert!(err.to_string().contains("read body"));

        let err = WatchdogError::deadline_miss(Duration::from_millis(5), 12);
        assert!(err.to_string().contains("5ms"));
        assert!(err.to_string().contains("12 cycles"));
    }

    #[test]
    fn test_startup_classification() {
        assert!(WatchdogError::connect_failure("h:1", reset()).is_startup_failure());
        assert!(WatchdogError::accept_failure("0.0.0.0:1", reset()).is_startup_failure());
        assert!(WatchdogError::invalid_configuration("bad").is_startup_failure());

        assert!(WatchdogError::deadline_miss(Duration::from_millis(5), 0).is_session_failure());
        assert!(WatchdogError::transport(RelayStage::ReadSensor, reset()).is_session_failure());
        assert!(
            WatchdogError::decode(
                RelayStage::ReadBody,
                ProtocolError::BodyTooLarge {
                    declared: 2000,
                    max: 1016
                }
            )
            .is_session_failure()
        );
    }

    #[test]
    fn test_stage_and_stop_cause() {
        let err = WatchdogError::transport(RelayStage::WriteToClient, reset());
        assert_eq!(err.stage(), Some(RelayStage::WriteToClient));
        assert_eq!(err.stop_cause(), StopCause::Transport(RelayStage::WriteToClient));

        let err = WatchdogError::deadline_miss(Duration::from_millis(5), 3);
        assert_eq!(err.stage(), None);
        assert_eq!(err.stop_cause(), StopCause::DeadlineMiss);
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error as _;

        let err = WatchdogError::transport(RelayStage::ReadHeader, reset());
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("reset by peer"));
    }
}
