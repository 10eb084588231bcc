//! Codec error types.

use thiserror::Error;

use crate::frames::FrameKind;

/// Errors returned by frame encoding and decoding.
///
/// Every variant describes a malformed or mismatched frame. None of them is
/// recoverable in place: a relay that sees one fails its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A fixed-width frame arrived with the wrong number of bytes.
    #[error("Invalid {frame} frame size: expected {expected} bytes, got {actual}")]
    InvalidFrameSize {
        /// Frame being decoded.
        frame: FrameKind,
        /// Width required by the protocol.
        expected: usize,
        /// Width actually supplied.
        actual: usize,
    },

    /// The header declared a body larger than the buffer can hold.
    #[error("Control law of {declared} bytes exceeds the {max} byte ceiling")]
    BodyTooLarge {
        /// Length declared by `size_of_control_law`.
        declared: u64,
        /// Protocol ceiling.
        max: usize,
    },

    /// The body byte count disagrees with the declared `size_of_control_law`.
    #[error("Control law length mismatch: header declares {declared} bytes, body has {actual}")]
    BodyLengthMismatch {
        /// Length declared by `size_of_control_law`.
        declared: u64,
        /// Bytes actually supplied.
        actual: usize,
    },

    /// The output buffer cannot hold the encoded frame.
    #[error("Output buffer too small: need {required} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes needed.
        required: usize,
        /// Bytes available.
        available: usize,
    },
}

impl ProtocolError {
    /// Create an invalid frame size error.
    #[must_use]
    pub fn invalid_frame_size(frame: FrameKind, expected: usize, actual: usize) -> Self {
        Self::InvalidFrameSize {
            frame,
            expected,
            actual,
        }
    }

    /// The frame kind the error was raised for.
    #[must_use]
    pub fn frame(&self) -> FrameKind {
        match self {
            Self::InvalidFrameSize { frame, .. } => *frame,
            Self::BodyTooLarge { .. }
            | Self::BodyLengthMismatch { .. }
            | Self::BufferTooSmall { .. } => FrameKind::ControlLawBody,
        }
    }
}

/// Convenience result alias for codec operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
