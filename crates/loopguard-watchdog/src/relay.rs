//! Relay state machine.
//!
//! One relay cycle moves an observation from the sensor rig to the client and
//! a control law from the client back to the sensor rig:
//!
//! | Stage           | Transfer                        | Buffer window        |
//! |-----------------|---------------------------------|----------------------|
//! | `ReadSensor`    | read 32 bytes from the sensor   | `[0..32)`            |
//! | `WriteToClient` | write 32 bytes to the client    | `[0..32)`            |
//! | `ReadHeader`    | read 8 bytes from the client    | `[0..8)`             |
//! | `ReadBody`      | read `len` bytes from the client| `[8..8+len)`         |
//! | `WriteToSensor` | write header + body to sensor   | `[0..8+len)`         |
//!
//! Each stage performs exactly one exact-length transfer, so there is never
//! more than one operation in flight on the shared buffer. Any failure moves
//! the machine to [`RelayStage::Failed`] and is returned to the caller.

use std::fmt;

use loopguard_protocol::{
    body_len, decode_body, decode_header, decode_observation, encode_header_and_body,
    encode_observation, ControlLawBody, ControlLawHeader, Observation, ProtocolError,
    BUFFER_CAPACITY, CONTROL_LAW_HEADER_SIZE, OBSERVATION_SIZE,
};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::error::{WatchdogError, WatchdogResult};
use crate::liveness::LivenessFlag;

/// Relay stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelayStage {
    /// Reading an observation from the sensor rig.
    ReadSensor,
    /// Forwarding the observation to the client.
    WriteToClient,
    /// Reading the control-law header from the client.
    ReadHeader,
    /// Reading the control-law body from the client.
    ReadBody,
    /// Forwarding header and body to the sensor rig.
    WriteToSensor,
    /// Terminal: a stage failed.
    Failed,
}

impl RelayStage {
    /// The five working stages in cycle order.
    pub const CYCLE: [Self; 5] = [
        Self::ReadSensor,
        Self::WriteToClient,
        Self::ReadHeader,
        Self::ReadBody,
        Self::WriteToSensor,
    ];

    /// Stage that follows a successful `self`. `Failed` stays `Failed`.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::ReadSensor => Self::WriteToClient,
            Self::WriteToClient => Self::ReadHeader,
            Self::ReadHeader => Self::ReadBody,
            Self::ReadBody => Self::WriteToSensor,
            Self::WriteToSensor => Self::ReadSensor,
            Self::Failed => Self::Failed,
        }
    }

    /// Human-readable stage name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadSensor => "read sensor",
            Self::WriteToClient => "write to client",
            Self::ReadHeader => "read header",
            Self::ReadBody => "read body",
            Self::WriteToSensor => "write to sensor",
            Self::Failed => "failed",
        }
    }

    /// Whether this is the terminal stage.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Failed
    }
}

impl fmt::Display for RelayStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relay counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayStats {
    /// Full cycles completed.
    pub cycles_completed: u64,
    /// Bytes read from the sensor rig.
    pub bytes_from_sensor: u64,
    /// Bytes written to the client.
    pub bytes_to_client: u64,
    /// Bytes read from the client.
    pub bytes_from_client: u64,
    /// Bytes written to the sensor rig.
    pub bytes_to_sensor: u64,
}

impl RelayStats {
    fn add(counter: &mut u64, bytes: usize) {
        *counter = counter.saturating_add(u64::try_from(bytes).unwrap_or(u64::MAX));
    }
}

/// Borrowed view of the buffer window `[start..start+len)`.
fn window(
    buffer: &mut [u8],
    stage: RelayStage,
    start: usize,
    len: usize,
) -> WatchdogResult<&mut [u8]> {
    let end = start.saturating_add(len);
    let available = buffer.len();
    buffer.get_mut(start..end).ok_or(WatchdogError::decode(
        stage,
        ProtocolError::BufferTooSmall {
            required: end,
            available,
        },
    ))
}

async fn read_frame<R>(reader: &mut R, frame: &mut [u8], stage: RelayStage) -> WatchdogResult<()>
where
    R: AsyncRead + Unpin,
{
    reader
        .read_exact(frame)
        .await
        .map_err(|source| WatchdogError::transport(stage, source))?;
    Ok(())
}

async fn write_frame<W>(writer: &mut W, frame: &[u8], stage: RelayStage) -> WatchdogResult<()>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(frame)
        .await
        .map_err(|source| WatchdogError::transport(stage, source))?;
    writer
        .flush()
        .await
        .map_err(|source| WatchdogError::transport(stage, source))
}

/// The relay state machine over one sensor/client pair.
///
/// Borrows everything it touches from the owning session; the session keeps
/// ownership so it can tear the endpoints down once the relay stops.
pub struct RelayStateMachine<'a, S> {
    sensor: &'a mut S,
    client: &'a mut S,
    buffer: &'a mut [u8; BUFFER_CAPACITY],
    liveness: &'a LivenessFlag,
    stats: &'a mut RelayStats,
    stage: RelayStage,
    observation: Observation,
    header: ControlLawHeader,
    body: ControlLawBody,
}

impl<S> fmt::Debug for RelayStateMachine<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayStateMachine")
            .field("stage", &self.stage)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<'a, S> RelayStateMachine<'a, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a relay positioned at [`RelayStage::ReadSensor`].
    pub fn new(
        sensor: &'a mut S,
        client: &'a mut S,
        buffer: &'a mut [u8; BUFFER_CAPACITY],
        liveness: &'a LivenessFlag,
        stats: &'a mut RelayStats,
    ) -> Self {
        Self {
            sensor,
            client,
            buffer,
            liveness,
            stats,
            stage: RelayStage::ReadSensor,
            observation: Observation::default(),
            header: ControlLawHeader::default(),
            body: ControlLawBody::empty(),
        }
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> RelayStage {
        self.stage
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> RelayStats {
        *self.stats
    }

    /// Run the current stage and advance.
    ///
    /// Returns the new stage. On error the machine is left in
    /// [`RelayStage::Failed`] and every later call fails with
    /// [`WatchdogError::RelayHalted`].
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::Transport`] on socket failure or peer close and
    /// [`WatchdogError::Decode`] on a malformed frame.
    pub async fn step(&mut self) -> WatchdogResult<RelayStage> {
        let stage = self.stage;
        let outcome = match stage {
            RelayStage::ReadSensor => self.read_sensor().await,
            RelayStage::WriteToClient => self.write_to_client().await,
            RelayStage::ReadHeader => self.read_header().await,
            RelayStage::ReadBody => self.read_body().await,
            RelayStage::WriteToSensor => self.write_to_sensor().await,
            RelayStage::Failed => Err(WatchdogError::RelayHalted),
        };

        match outcome {
            Ok(()) => {
                self.stage = stage.next();
                Ok(self.stage)
            }
            Err(err) => {
                self.stage = RelayStage::Failed;
                Err(err)
            }
        }
    }

    /// Run cycles until a stage fails, and return that failure.
    pub async fn run(mut self) -> WatchdogError {
        loop {
            if let Err(err) = self.step().await {
                return err;
            }
        }
    }

    async fn read_sensor(&mut self) -> WatchdogResult<()> {
        let stage = RelayStage::ReadSensor;
        let frame = window(self.buffer.as_mut_slice(), stage, 0, OBSERVATION_SIZE)?;
        read_frame(&mut *self.sensor, frame, stage).await?;
        self.observation = decode_observation(frame).map_err(|e| WatchdogError::decode(stage, e))?;
        RelayStats::add(&mut self.stats.bytes_from_sensor, OBSERVATION_SIZE);
        trace!(
            sequence = self.observation.sequence,
            bytes = OBSERVATION_SIZE,
            "observation received"
        );
        Ok(())
    }

    async fn write_to_client(&mut self) -> WatchdogResult<()> {
        let stage = RelayStage::WriteToClient;
        let encoded = encode_observation(&self.observation);
        let frame = window(self.buffer.as_mut_slice(), stage, 0, OBSERVATION_SIZE)?;
        frame.copy_from_slice(&encoded);
        write_frame(&mut *self.client, frame, stage).await?;
        RelayStats::add(&mut self.stats.bytes_to_client, OBSERVATION_SIZE);
        trace!(sequence = self.observation.sequence, "observation forwarded");
        Ok(())
    }

    async fn read_header(&mut self) -> WatchdogResult<()> {
        let stage = RelayStage::ReadHeader;
        let frame = window(self.buffer.as_mut_slice(), stage, 0, CONTROL_LAW_HEADER_SIZE)?;
        read_frame(&mut *self.client, frame, stage).await?;
        self.header = decode_header(frame).map_err(|e| WatchdogError::decode(stage, e))?;
        RelayStats::add(&mut self.stats.bytes_from_client, CONTROL_LAW_HEADER_SIZE);
        trace!(
            size_of_control_law = self.header.size_of_control_law,
            "control-law header received"
        );
        Ok(())
    }

    async fn read_body(&mut self) -> WatchdogResult<()> {
        let stage = RelayStage::ReadBody;
        let declared = self.header.size_of_control_law;
        let len = body_len(declared).map_err(|e| WatchdogError::decode(stage, e))?;
        let frame = window(self.buffer.as_mut_slice(), stage, CONTROL_LAW_HEADER_SIZE, len)?;
        read_frame(&mut *self.client, frame, stage).await?;
        self.body = decode_body(frame, declared).map_err(|e| WatchdogError::decode(stage, e))?;
        RelayStats::add(&mut self.stats.bytes_from_client, len);
        trace!(bytes = len, "control-law body received");
        Ok(())
    }

    async fn write_to_sensor(&mut self) -> WatchdogResult<()> {
        let stage = RelayStage::WriteToSensor;
        let written = encode_header_and_body(&self.header, &self.body, self.buffer.as_mut_slice())
            .map_err(|e| WatchdogError::decode(stage, e))?;
        let frame = window(self.buffer.as_mut_slice(), stage, 0, written)?;
        write_frame(&mut *self.sensor, frame, stage).await?;
        RelayStats::add(&mut self.stats.bytes_to_sensor, written);

        self.liveness.signal();
        self.stats.cycles_completed = self.stats.cycles_completed.saturating_add(1);
        trace!(
            cycle = self.stats.cycles_completed,
            bytes = written,
            "control law forwarded"
        );
        Ok(())
    }
}
