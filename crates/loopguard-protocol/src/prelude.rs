//! Prelude for loopguard-protocol.
//!
//! ```rust
//! use loopguard_protocol::prelude::*;
//!
//! let header = decode_header(&encode_header(&ControlLawHeader::new(16)));
//! assert_eq!(header, Ok(ControlLawHeader::new(16)));
//! ```

pub use crate::codec::{
    body_len, decode_body, decode_header, decode_observation, encode_header,
    encode_header_and_body, encode_observation,
};
pub use crate::error::{ProtocolError, ProtocolResult};
pub use crate::frames::{ControlLawBody, ControlLawHeader, FrameKind, Observation};
pub use crate::{
    BUFFER_CAPACITY, CONTROL_LAW_HEADER_SIZE, MAX_CONTROL_LAW_SIZE, OBSERVATION_SIZE,
    READINGS_PER_OBSERVATION,
};
