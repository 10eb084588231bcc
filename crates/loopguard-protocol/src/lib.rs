//! # loopguard-protocol
//!
//! Fixed-width wire codec for the loopguard relay.
//!
//! A relay cycle moves three kinds of frames between the sensor rig, the
//! watchdog and the controller client:
//!
//! | Frame | Direction | Width |
//! |-------|-----------|-------|
//! | [`Observation`] | sensor → watchdog → client | [`OBSERVATION_SIZE`] (32 bytes) |
//! | [`ControlLawHeader`] | client → watchdog → sensor | [`CONTROL_LAW_HEADER_SIZE`] (8 bytes) |
//! | [`ControlLawBody`] | client → watchdog → sensor | `size_of_control_law` bytes |
//!
//! ## Wire format
//!
//! Every multi-byte numeric field is **little-endian**, packed without padding
//! or alignment. Frame order and widths are part of the interoperability
//! contract with existing peers and must not change.
//!
//! ```text
//! Observation (32 bytes)
//! ┌──────────────┬──────────────┬────────────────────────────┐
//! │ sequence u64 │ timestamp_us │ readings [f32; 4]          │
//! │   [0..8)     │ u64 [8..16)  │   [16..32)                 │
//! └──────────────┴──────────────┴────────────────────────────┘
//!
//! Control-law header (8 bytes) followed by body (0..=1016 bytes)
//! ┌──────────────────────────┬──────────────────────────────┐
//! │ size_of_control_law u64  │ body bytes                   │
//! └──────────────────────────┴──────────────────────────────┘
//! ```
//!
//! ## Safety Guarantees
//!
//! - **No heap allocations**: every encoder writes into caller-owned or
//!   fixed-size storage.
//! - **No panics on malformed input**: decoders validate lengths before
//!   trusting any size field and return [`ProtocolError`] instead.
//!
//! ## Example
//!
//! ```rust
//! use loopguard_protocol::prelude::*;
//!
//! let observation = Observation::new(7, 1_000, [0.5, -0.25, 1.0, 0.0]);
//! let frame = encode_observation(&observation);
//! assert_eq!(frame.len(), OBSERVATION_SIZE);
//! assert_eq!(decode_observation(&frame), Ok(observation));
//!
//! let body = ControlLawBody::from_slice(&[1, 2, 3, 4])?;
//! let header = ControlLawHeader::for_body(&body);
//! let mut buffer = [0u8; BUFFER_CAPACITY];
//! let written = encode_header_and_body(&header, &body, &mut buffer)?;
//! assert_eq!(written, CONTROL_LAW_HEADER_SIZE + 4);
//! # Ok::<(), ProtocolError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod codec;
pub mod error;
pub mod frames;
pub mod prelude;

pub use codec::{
    body_len, decode_body, decode_header, decode_observation, encode_header,
    encode_header_and_body, encode_observation,
};
pub use error::{ProtocolError, ProtocolResult};
pub use frames::{ControlLawBody, ControlLawHeader, FrameKind, Observation};

/// Capacity of the single scratch buffer a relay session reuses for every stage.
pub const BUFFER_CAPACITY: usize = 1024;

/// Width of an encoded [`Observation`] frame in bytes.
pub const OBSERVATION_SIZE: usize = 32;

/// Width of an encoded [`ControlLawHeader`] frame in bytes.
pub const CONTROL_LAW_HEADER_SIZE: usize = 8;

/// Largest control-law body that fits in the scratch buffer behind its header.
pub const MAX_CONTROL_LAW_SIZE: usize = BUFFER_CAPACITY - CONTROL_LAW_HEADER_SIZE;

/// Number of numeric readings carried by one observation.
pub const READINGS_PER_OBSERVATION: usize = 4;
