//! Reference controller client.
//!
//! Reads each observation from the watchdog, computes a proportional control
//! law of four `f32` actuation commands, and answers with header and body.

use std::time::Duration;

use loopguard_protocol::{
    decode_observation, encode_header_and_body, ControlLawBody, ControlLawHeader, Observation,
    BUFFER_CAPACITY, OBSERVATION_SIZE, READINGS_PER_OBSERVATION,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, trace, warn};

use crate::error::{PeerError, PeerResult};
use crate::stats::PeerStats;
use crate::transfer::{read_or_closed, Transfer};

/// Byte length of the control law this client produces.
pub const CONTROL_LAW_BYTES: usize = READINGS_PER_OBSERVATION * 4;

/// Reference client settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientConfig {
    /// Proportional gain applied to every reading.
    pub gain: f32,
    /// Simulated computation time per cycle.
    pub compute_delay: Option<Duration>,
    /// Stop answering after this many cycles, holding the connection open.
    pub stall_after: Option<u64>,
    /// Stop after this many cycles.
    pub max_cycles: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gain: 0.5,
            compute_delay: None,
            stall_after: None,
            max_cycles: None,
        }
    }
}

/// Proportional controller speaking the client side of the protocol.
#[derive(Debug)]
pub struct ReferenceClient {
    config: ClientConfig,
    stats: PeerStats,
    last_observation: Option<Observation>,
}

impl ReferenceClient {
    /// Create a client.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            stats: PeerStats::default(),
            last_observation: None,
        }
    }

    /// Compute the control law for `observation`: `-gain * reading` for each
    /// reading, little-endian.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the body is well under the protocol ceiling.
    pub fn control_law(&self, observation: &Observation) -> PeerResult<ControlLawBody> {
        let mut bytes = [0u8; CONTROL_LAW_BYTES];
        let commands = observation
            .readings
            .iter()
            .map(|reading| -self.config.gain * reading);
        for (chunk, command) in bytes.chunks_exact_mut(4).zip(commands) {
            chunk.copy_from_slice(&command.to_le_bytes());
        }
        Ok(ControlLawBody::from_slice(&bytes)?)
    }

    /// Run the client side of the protocol over `stream`.
    ///
    /// Returns when `max_cycles` is reached or the watchdog closes the
    /// connection. A stalled client keeps reading until the close.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::Io`] on other socket failures and
    /// [`PeerError::Protocol`] if an observation is malformed.
    pub async fn serve<S>(&mut self, stream: &mut S) -> PeerResult<PeerStats>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut buffer = [0u8; BUFFER_CAPACITY];
        info!(gain = self.config.gain, "reference client serving");

        while self.config.max_cycles.is_none_or(|max| self.stats.cycles < max) {
            let Some(frame) = buffer.get_mut(..OBSERVATION_SIZE) else {
                break;
            };
            if read_or_closed(stream, frame, "reading observation").await? == Transfer::Closed {
                self.stats.closed_by_remote = true;
                break;
            }
            let observation = decode_observation(frame)?;
            self.stats.received(OBSERVATION_SIZE);
            self.last_observation = Some(observation);

            if self.config.stall_after.is_some_and(|n| self.stats.cycles >= n) {
                warn!(cycle = observation.sequence, "client stalling");
                self.drain_until_closed(stream).await?;
                break;
            }

            if let Some(delay) = self.config.compute_delay {
                tokio::time::sleep(delay).await;
            }

            let body = self.control_law(&observation)?;
            let header = ControlLawHeader::for_body(&body);
            let written = encode_header_and_body(&header, &body, &mut buffer)?;
            let Some(frame) = buffer.get(..written) else {
                break;
            };
            stream
                .write_all(frame)
                .await
                .map_err(|e| PeerError::io("writing control law", e))?;
            stream
                .flush()
                .await
                .map_err(|e| PeerError::io("writing control law", e))?;
            self.stats.sent(written);
            self.stats.complete_cycle();
            trace!(cycle = observation.sequence, "client cycle complete");
        }

        debug!(stats = ?self.stats, "reference client finished");
        Ok(self.stats)
    }

    async fn drain_until_closed<S>(&mut self, stream: &mut S) -> PeerResult<()>
    where
        S: AsyncRead + Unpin,
    {
        let mut scratch = [0u8; 64];
        loop {
            match stream.read(&mut scratch).await {
                Ok(0) => break,
                Ok(n) => self.stats.received(n),
                Err(err) => {
                    debug!(error = %err, "stalled client saw connection error");
                    break;
                }
            }
        }
        self.stats.closed_by_remote = true;
        Ok(())
    }

    /// The most recent observation received.
    #[must_use]
    pub fn last_observation(&self) -> Option<Observation> {
        self.last_observation
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> PeerStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopguard_protocol::{decode_header, encode_observation};

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_control_law_is_proportional() -> TestResult {
        let client = ReferenceClient::new(ClientConfig {
            gain: 2.0,
            ..ClientConfig::default()
        });
        let observation = Observation::new(0, 0, [1.0, -0.5, 0.0, 0.25]);

        let body = client.control_law(&observation)?;

        assert_eq!(body.len(), CONTROL_LAW_BYTES);
        let expected: Vec<u8> = [-2.0f32, 1.0, -0.0, -0.5]
            .iter()
            .flat_map(|c| c.to_le_bytes())
            .collect();
        assert_eq!(body.as_bytes(), expected.as_slice());
        Ok(())
    }

    #[tokio::test]
    async fn test_serve_answers_each_observation() -> TestResult {
        let (mut local, mut remote) = tokio::io::duplex(4096);
        let mut client = ReferenceClient::new(ClientConfig {
            max_cycles: Some(2),
            ..ClientConfig::default()
        });

        let watchdog = async {
            let mut headers = Vec::new();
            for sequence in 0..2u64 {
                let observation = Observation::new(sequence, 0, [1.0; 4]);
                remote.write_all(&encode_observation(&observation)).await?;
                let mut answer = [0u8; 24];
                remote.read_exact(&mut answer).await?;
                headers.push(decode_header(&answer[..8])?);
            }
            Ok::<_, Box<dyn std::error::Error>>(headers)
        };

        let (stats, headers) = tokio::join!(client.serve(&mut local), watchdog);
        let stats = stats?;
        assert_eq!(stats.cycles, 2);
        assert_eq!(stats.bytes_sent, 48);
        assert!(!stats.closed_by_remote);
        assert!(headers?.iter().all(|h| h.size_of_control_law == 16));
        Ok(())
    }

    #[tokio::test]
    async fn test_stalled_client_waits_for_close() -> TestResult {
        let (mut local, mut remote) = tokio::io::duplex(4096);
        let mut client = ReferenceClient::new(ClientConfig {
            stall_after: Some(0),
            ..ClientConfig::default()
        });

        let watchdog = async {
            remote
                .write_all(&encode_observation(&Observation::default()))
                .await?;
            drop(remote);
            Ok::<_, std::io::Error>(())
        };

        let (stats, closed) = tokio::join!(client.serve(&mut local), watchdog);
        closed?;
        let stats = stats?;
        assert_eq!(stats.cycles, 0);
        assert_eq!(stats.bytes_sent, 0);
        assert!(stats.closed_by_remote);
        Ok(())
    }
}
