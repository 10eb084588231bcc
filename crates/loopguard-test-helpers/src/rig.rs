//! In-memory session rig.
//!
//! Builds a [`Session`] over two duplex pipes and hands the far ends to the
//! test, which plays the sensor rig and the client. A [`RecordingReporter`]
//! captures every safety stop.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use loopguard_protocol::{
    decode_observation, encode_observation, Observation, CONTROL_LAW_HEADER_SIZE,
    OBSERVATION_SIZE,
};
use loopguard_watchdog::{RecordingReporter, Session};
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};

/// Pipe capacity large enough to hold a full cycle in each direction.
pub const DEFAULT_PIPE_CAPACITY: usize = 4096;

/// A session wired to in-memory peers.
#[derive(Debug)]
pub struct SessionRig {
    /// The session under test.
    pub session: Session<DuplexStream>,
    /// The sensor rig's end of the sensor pipe.
    pub sensor: DuplexStream,
    /// The client's end of the client pipe.
    pub client: DuplexStream,
    /// Records every safety stop the session reports.
    pub reporter: RecordingReporter,
}

impl SessionRig {
    /// Build a rig with the given cycle deadline.
    #[must_use]
    pub fn new(deadline: Duration) -> Self {
        Self::with_capacity(deadline, DEFAULT_PIPE_CAPACITY)
    }

    /// Build a rig with a custom pipe capacity.
    #[must_use]
    pub fn with_capacity(deadline: Duration, capacity: usize) -> Self {
        let (session_sensor, sensor) = duplex(capacity);
        let (session_client, client) = duplex(capacity);
        let reporter = RecordingReporter::new();
        let session = Session::new(
            session_sensor,
            session_client,
            deadline,
            Arc::new(reporter.clone()),
        );
        Self {
            session,
            sensor,
            client,
            reporter,
        }
    }
}

/// The observation of the concrete single-cycle scenario.
#[must_use]
pub fn concrete_observation() -> Observation {
    Observation::new(1, 1000, [1.0, -1.0, 0.5, 0.0])
}

/// The 16-byte control law of the concrete single-cycle scenario.
#[must_use]
pub fn concrete_control_law() -> [u8; 16] {
    let mut body = [0u8; 16];
    for (i, byte) in (0u8..).zip(body.iter_mut()) {
        *byte = i;
    }
    body
}

/// Write one observation frame.
///
/// # Errors
///
/// Returns the write error.
pub async fn send_observation(stream: &mut DuplexStream, observation: &Observation) -> io::Result<()> {
    stream.write_all(&encode_observation(observation)).await
}

/// Read one observation frame.
///
/// # Errors
///
/// Returns the read error, or `InvalidData` if the frame does not decode.
pub async fn read_observation(stream: &mut DuplexStream) -> io::Result<Observation> {
    let mut frame = [0u8; OBSERVATION_SIZE];
    stream.read_exact(&mut frame).await?;
    decode_observation(&frame).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Write a control-law header declaring `body.len()` bytes, then the body.
///
/// # Errors
///
/// Returns the write error.
pub async fn answer_control_law(stream: &mut DuplexStream, body: &[u8]) -> io::Result<()> {
    let declared = u64::try_from(body.len()).unwrap_or(u64::MAX);
    stream.write_all(&declared.to_le_bytes()).await?;
    stream.write_all(body).await
}

/// Read a forwarded header and body, returning the raw frame bytes.
///
/// # Errors
///
/// Returns the read error.
pub async fn read_control_law(stream: &mut DuplexStream) -> io::Result<Vec<u8>> {
    let mut header = [0u8; CONTROL_LAW_HEADER_SIZE];
    stream.read_exact(&mut header).await?;
    let declared = usize::try_from(u64::from_le_bytes(header))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let mut frame = header.to_vec();
    frame.resize(CONTROL_LAW_HEADER_SIZE + declared, 0);
    stream.read_exact(&mut frame[CONTROL_LAW_HEADER_SIZE..]).await?;
    Ok(frame)
}
