//! Error types for the protocol peers.

use std::io;

use loopguard_protocol::ProtocolError;
use thiserror::Error;

use crate::peripherals::PeripheralId;

/// Errors raised by the sensor simulator, the reference client, and the
/// peripheral barrier.
#[derive(Debug, Error)]
pub enum PeerError {
    /// Socket failure other than an orderly close at a frame boundary.
    #[error("I/O error while {context}: {source}")]
    Io {
        /// What the peer was doing.
        context: &'static str,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// A frame from the remote side failed to decode.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The barrier was asked to trigger a peripheral it does not manage.
    #[error("Unknown peripheral: {0}")]
    UnknownPeripheral(PeripheralId),

    /// The barrier was stopped while a trigger was outstanding.
    #[error("Peripheral barrier stopped")]
    BarrierStopped,
}

impl PeerError {
    /// Create an I/O error with context.
    #[must_use]
    pub fn io(context: &'static str, source: io::Error) -> Self {
        Self::Io { context, source }
    }
}

/// A specialized `Result` type for peer operations.
pub type PeerResult<T> = std::result::Result<T, PeerError>;
