//! Frame encoding and decoding.
//!
//! All functions are I/O-free and allocation-free. Decoders check the supplied
//! byte count against the protocol before reading any field, so a hostile or
//! truncated frame yields a [`ProtocolError`] rather than a panic or an
//! out-of-bounds read.

use crate::error::{ProtocolError, ProtocolResult};
use crate::frames::{ControlLawBody, ControlLawHeader, FrameKind, Observation};
use crate::{CONTROL_LAW_HEADER_SIZE, MAX_CONTROL_LAW_SIZE, OBSERVATION_SIZE};

/// Sequential little-endian field reader over a length-checked frame.
struct FieldReader<'a> {
    rest: &'a [u8],
    frame: FrameKind,
    frame_len: usize,
}

impl<'a> FieldReader<'a> {
    fn new(bytes: &'a [u8], frame: FrameKind) -> Self {
        Self {
            rest: bytes,
            frame,
            frame_len: bytes.len(),
        }
    }

    fn take<const N: usize>(&mut self) -> ProtocolResult<[u8; N]> {
        let Some((head, tail)) = self.rest.split_first_chunk::<N>() else {
            return Err(ProtocolError::invalid_frame_size(
                self.frame,
                self.frame.fixed_size().unwrap_or(N),
                self.frame_len,
            ));
        };
        self.rest = tail;
        Ok(*head)
    }

    fn u64(&mut self) -> ProtocolResult<u64> {
        self.take::<8>().map(u64::from_le_bytes)
    }

    fn f32(&mut self) -> ProtocolResult<f32> {
        self.take::<4>().map(f32::from_le_bytes)
    }
}

/// Encode an observation into its fixed 32-byte frame.
#[must_use]
pub fn encode_observation(observation: &Observation) -> [u8; OBSERVATION_SIZE] {
    let mut frame = [0u8; OBSERVATION_SIZE];
    let fields = observation
        .sequence
        .to_le_bytes()
        .into_iter()
        .chain(observation.timestamp_us.to_le_bytes())
        .chain(observation.readings.iter().flat_map(|r| r.to_le_bytes()));
    for (slot, byte) in frame.iter_mut().zip(fields) {
        *slot = byte;
    }
    frame
}

/// Decode an observation frame.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidFrameSize`] unless `bytes` is exactly
/// [`OBSERVATION_SIZE`] long.
pub fn decode_observation(bytes: &[u8]) -> ProtocolResult<Observation> {
    if bytes.len() != OBSERVATION_SIZE {
        return Err(ProtocolError::invalid_frame_size(
            FrameKind::Observation,
            OBSERVATION_SIZE,
            bytes.len(),
        ));
    }

    let mut reader = FieldReader::new(bytes, FrameKind::Observation);
    let sequence = reader.u64()?;
    let timestamp_us = reader.u64()?;
    let mut readings = [0f32; crate::READINGS_PER_OBSERVATION];
    for reading in &mut readings {
        *reading = reader.f32()?;
    }

    Ok(Observation {
        sequence,
        timestamp_us,
        readings,
    })
}

/// Encode a control-law header into its fixed 8-byte frame.
#[must_use]
pub fn encode_header(header: &ControlLawHeader) -> [u8; CONTROL_LAW_HEADER_SIZE] {
    header.size_of_control_law.to_le_bytes()
}

/// Decode a control-law header frame.
///
/// The declared body length is returned as-is; checking it against the
/// protocol ceiling is left to [`body_len`] / [`decode_body`].
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidFrameSize`] unless `bytes` is exactly
/// [`CONTROL_LAW_HEADER_SIZE`] long.
pub fn decode_header(bytes: &[u8]) -> ProtocolResult<ControlLawHeader> {
    let Ok(frame) = <[u8; CONTROL_LAW_HEADER_SIZE]>::try_from(bytes) else {
        return Err(ProtocolError::invalid_frame_size(
            FrameKind::ControlLawHeader,
            CONTROL_LAW_HEADER_SIZE,
            bytes.len(),
        ));
    };
    Ok(ControlLawHeader::new(u64::from_le_bytes(frame)))
}

/// Validate a declared control-law length against the protocol ceiling.
///
/// # Errors
///
/// Returns [`ProtocolError::BodyTooLarge`] if `size_of_control_law` exceeds
/// [`MAX_CONTROL_LAW_SIZE`].
pub fn body_len(size_of_control_law: u64) -> ProtocolResult<usize> {
    usize::try_from(size_of_control_law)
        .ok()
        .filter(|len| *len <= MAX_CONTROL_LAW_SIZE)
        .ok_or(ProtocolError::BodyTooLarge {
            declared: size_of_control_law,
            max: MAX_CONTROL_LAW_SIZE,
        })
}

/// Decode a control-law body of `size_of_control_law` bytes.
///
/// # Errors
///
/// - [`ProtocolError::BodyTooLarge`] if the declared size exceeds the ceiling.
/// - [`ProtocolError::BodyLengthMismatch`] if `bytes` is not exactly the
///   declared size.
pub fn decode_body(bytes: &[u8], size_of_control_law: u64) -> ProtocolResult<ControlLawBody> {
    let declared = body_len(size_of_control_law)?;
    if bytes.len() != declared {
        return Err(ProtocolError::BodyLengthMismatch {
            declared: size_of_control_law,
            actual: bytes.len(),
        });
    }
    ControlLawBody::from_slice(bytes)
}

/// Encode a header followed by its body, contiguously, into `out`.
///
/// Returns the number of bytes written: `CONTROL_LAW_HEADER_SIZE + body.len()`.
///
/// # Errors
///
/// - [`ProtocolError::BodyTooLarge`] if the header declares more than the ceiling.
/// - [`ProtocolError::BodyLengthMismatch`] if the header and body disagree.
/// - [`ProtocolError::BufferTooSmall`] if `out` cannot hold the frame.
pub fn encode_header_and_body(
    header: &ControlLawHeader,
    body: &ControlLawBody,
    out: &mut [u8],
) -> ProtocolResult<usize> {
    let declared = body_len(header.size_of_control_law)?;
    if declared != body.len() {
        return Err(ProtocolError::BodyLengthMismatch {
            declared: header.size_of_control_law,
            actual: body.len(),
        });
    }

    let total = CONTROL_LAW_HEADER_SIZE.saturating_add(declared);
    let available = out.len();
    let Some(frame) = out.get_mut(..total) else {
        return Err(ProtocolError::BufferTooSmall {
            required: total,
            available,
        });
    };

    let (head, tail) = frame.split_at_mut(CONTROL_LAW_HEADER_SIZE);
    head.copy_from_slice(&encode_header(header));
    tail.copy_from_slice(body.as_bytes());
    Ok(total)
}
