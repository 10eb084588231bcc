//! Frame types exchanged during a relay cycle.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};
use crate::{
    CONTROL_LAW_HEADER_SIZE, MAX_CONTROL_LAW_SIZE, OBSERVATION_SIZE, READINGS_PER_OBSERVATION,
};

/// The three frame kinds of the relay protocol, in cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameKind {
    /// Sensor measurement record.
    Observation,
    /// Fixed-width prefix announcing the control-law length.
    ControlLawHeader,
    /// Variable-width actuation command.
    ControlLawBody,
}

impl FrameKind {
    /// Fixed wire width of this frame, or `None` for the variable-width body.
    #[must_use]
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            Self::Observation => Some(OBSERVATION_SIZE),
            Self::ControlLawHeader => Some(CONTROL_LAW_HEADER_SIZE),
            Self::ControlLawBody => None,
        }
    }

    /// Human-readable frame name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Observation => "observation",
            Self::ControlLawHeader => "control-law header",
            Self::ControlLawBody => "control-law body",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sensor observation.
///
/// Produced by the sensor rig once per cycle and forwarded verbatim to the
/// controller client. The watchdog never mutates it after decoding.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Observation {
    /// Monotonic cycle counter assigned by the sensor rig.
    pub sequence: u64,
    /// Sensor-side capture time in microseconds.
    pub timestamp_us: u64,
    /// Raw numeric readings.
    pub readings: [f32; READINGS_PER_OBSERVATION],
}

impl Observation {
    /// Create a new observation.
    #[must_use]
    pub fn new(sequence: u64, timestamp_us: u64, readings: [f32; READINGS_PER_OBSERVATION]) -> Self {
        Self {
            sequence,
            timestamp_us,
            readings,
        }
    }

    /// Bitwise equality, treating NaN readings with identical payloads as equal.
    #[must_use]
    pub fn bitwise_eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
            && self.timestamp_us == other.timestamp_us
            && self
                .readings
                .iter()
                .zip(other.readings.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

/// Control-law header.
///
/// `size_of_control_law` is the only semantically significant field: it tells
/// the relay how many body bytes follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlLawHeader {
    /// Byte length of the body that follows this header.
    pub size_of_control_law: u64,
}

impl ControlLawHeader {
    /// Create a header declaring a body of `size_of_control_law` bytes.
    #[must_use]
    pub fn new(size_of_control_law: u64) -> Self {
        Self {
            size_of_control_law,
        }
    }

    /// Create the header that announces `body`.
    #[must_use]
    pub fn for_body(body: &ControlLawBody) -> Self {
        Self::new(body.len() as u64)
    }
}

/// Control-law body.
///
/// Stored inline in a fixed-capacity array so decoding never allocates.
/// Only the first [`len`](Self::len) bytes are meaningful.
#[derive(Clone)]
pub struct ControlLawBody {
    len: usize,
    bytes: [u8; MAX_CONTROL_LAW_SIZE],
}

impl ControlLawBody {
    /// An empty body.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            len: 0,
            bytes: [0; MAX_CONTROL_LAW_SIZE],
        }
    }

    /// Copy `bytes` into a new body.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::BodyTooLarge`] if `bytes` exceeds
    /// [`MAX_CONTROL_LAW_SIZE`].
    pub fn from_slice(bytes: &[u8]) -> ProtocolResult<Self> {
        let mut body = Self::empty();
        let Some(dst) = body.bytes.get_mut(..bytes.len()) else {
            return Err(ProtocolError::BodyTooLarge {
                declared: bytes.len() as u64,
                max: MAX_CONTROL_LAW_SIZE,
            });
        };
        dst.copy_from_slice(bytes);
        body.len = bytes.len();
        Ok(body)
    }

    /// The meaningful body bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.get(..self.len).unwrap_or_default()
    }

    /// Body length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the body carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for ControlLawBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for ControlLawBody {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for ControlLawBody {}

impl fmt::Debug for ControlLawBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlLawBody")
            .field("len", &self.len)
            .field("bytes", &self.as_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_kind_sizes() {
        assert_eq!(FrameKind::Observation.fixed_size(), Some(32));
        assert_eq!(FrameKind::ControlLawHeader.fixed_size(), Some(8));
        assert_eq!(FrameKind::ControlLawBody.fixed_size(), None);
    }

    #[test]
    fn test_body_from_slice() -> ProtocolResult<()> {
        let body = ControlLawBody::from_slice(&[9, 8, 7])?;
        assert_eq!(body.len(), 3);
        assert_eq!(body.as_bytes(), &[9, 8, 7]);
        assert!(!body.is_empty());
        Ok(())
    }

    #[test]
    fn test_body_at_ceiling() -> ProtocolResult<()> {
        let bytes = [0xA5u8; MAX_CONTROL_LAW_SIZE];
        let body = ControlLawBody::from_slice(&bytes)?;
        assert_eq!(body.len(), MAX_CONTROL_LAW_SIZE);
        Ok(())
    }

    #[test]
    fn test_body_over_ceiling_rejected() {
        let bytes = [0u8; MAX_CONTROL_LAW_SIZE + 1];
        let result = ControlLawBody::from_slice(&bytes);
        assert_eq!(
            result,
            Err(ProtocolError::BodyTooLarge {
                declared: (MAX_CONTROL_LAW_SIZE + 1) as u64,
                max: MAX_CONTROL_LAW_SIZE,
            })
        );
    }

    #[test]
    fn test_body_equality_ignores_spare_capacity() -> ProtocolResult<()> {
        let a = ControlLawBody::from_slice(&[1, 2])?;
        let b = ControlLawBody::from_slice(&[1, 2])?;
        let c = ControlLawBody::from_slice(&[1, 2, 0])?;
        assert_eq!(a, b);
        assert_ne!(a, c);
        Ok(())
    }

    #[test]
    fn test_header_for_body() -> ProtocolResult<()> {
        let body = ControlLawBody::from_slice(&[0; 16])?;
        assert_eq!(ControlLawHeader::for_body(&body).size_of_control_law, 16);
        assert_eq!(ControlLawHeader::for_body(&ControlLawBody::empty()).size_of_control_law, 0);
        Ok(())
    }

    #[test]
    fn test_observation_bitwise_eq_handles_nan() {
        let a = Observation::new(1, 2, [f32::NAN, 0.0, 1.0, -1.0]);
        let b = a;
        assert!(a.bitwise_eq(&b));
        assert_ne!(a, b);
    }
}
