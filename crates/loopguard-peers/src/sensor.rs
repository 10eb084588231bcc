//! Sensor rig simulator.
//!
//! Each cycle the simulator triggers its peripherals through a
//! [`PeripheralBarrier`], assembles an observation from their samples, writes
//! it to the watchdog, and waits for the control law before the next cycle.

use std::sync::Arc;
use std::time::Duration;

use loopguard_protocol::{
    body_len, decode_body, decode_header, encode_observation, ControlLawBody, Observation,
    CONTROL_LAW_HEADER_SIZE, MAX_CONTROL_LAW_SIZE,
};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::barrier::PeripheralBarrier;
use crate::error::{PeerError, PeerResult};
use crate::peripherals::{PeripheralId, SampleSlot};
use crate::stats::PeerStats;
use crate::transfer::{read_or_closed, Transfer};

/// Sensor simulator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorConfig {
    /// Pause after each completed cycle.
    pub period: Option<Duration>,
    /// Stop after this many cycles.
    pub max_cycles: Option<u64>,
    /// Sample the camera every this many cycles. `0` disables it.
    pub camera_every: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            period: None,
            max_cycles: None,
            camera_every: 5,
        }
    }
}

impl SensorConfig {
    /// Peripherals to trigger for `cycle`.
    #[must_use]
    pub fn peripherals_for(&self, cycle: u64) -> &'static [PeripheralId] {
        if self.camera_every != 0 && cycle.is_multiple_of(self.camera_every) {
            &[PeripheralId::Camera, PeripheralId::Gps]
        } else {
            &[PeripheralId::Gps]
        }
    }
}

/// Simulated sensor rig.
#[derive(Debug)]
pub struct SensorSimulator {
    config: SensorConfig,
    barrier: Arc<PeripheralBarrier>,
    slot: Arc<Mutex<SampleSlot>>,
    peripherals: Vec<JoinHandle<()>>,
    started: Instant,
    last_control: Option<ControlLawBody>,
    stats: PeerStats,
}

impl SensorSimulator {
    /// Start the peripheral tasks.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(config: SensorConfig) -> Self {
        let barrier = Arc::new(PeripheralBarrier::new(&PeripheralId::ALL));
        let slot = Arc::new(Mutex::new(SampleSlot::default()));
        let peripherals = PeripheralId::ALL
            .iter()
            .map(|id| spawn_peripheral(*id, Arc::clone(&barrier), Arc::clone(&slot)))
            .collect();

        Self {
            config,
            barrier,
            slot,
            peripherals,
            started: Instant::now(),
            last_control: None,
            stats: PeerStats::default(),
        }
    }

    /// Sample the peripherals for the next observation.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::BarrierStopped`] if the simulator was stopped.
    pub async fn next_observation(&mut self) -> PeerResult<Observation> {
        let cycle = self.stats.cycles;
        self.slot.lock().cycle = cycle;
        self.barrier
            .trigger(self.config.peripherals_for(cycle))
            .await?;

        let readings = self.slot.lock().readings;
        let timestamp_us = u64::try_from(self.started.elapsed().as_micros()).unwrap_or(u64::MAX);
        Ok(Observation::new(cycle, timestamp_us, readings))
    }

    /// Run the sensor side of the protocol over `stream`.
    ///
    /// Returns when `max_cycles` is reached or the watchdog closes the
    /// connection at a frame boundary.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::Io`] on other socket failures and
    /// [`PeerError::Protocol`] if the control law is malformed.
    pub async fn serve<S>(&mut self, stream: &mut S) -> PeerResult<PeerStats>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut buffer = [0u8; CONTROL_LAW_HEADER_SIZE + MAX_CONTROL_LAW_SIZE];
        info!(max_cycles = ?self.config.max_cycles, "sensor simulator serving");

        while self.config.max_cycles.is_none_or(|max| self.stats.cycles < max) {
            let observation = self.next_observation().await?;
            let frame = encode_observation(&observation);
            stream
                .write_all(&frame)
                .await
                .map_err(|e| PeerError::io("writing observation", e))?;
            self.stats.sent(frame.len());

            let Some((header_bytes, rest)) = buffer.split_first_chunk_mut::<CONTROL_LAW_HEADER_SIZE>()
            else {
                break;
            };
            if read_or_closed(stream, header_bytes, "reading control-law header").await?
                == Transfer::Closed
            {
                self.stats.closed_by_remote = true;
                break;
            }
            let header = decode_header(header_bytes)?;
            let len = body_len(header.size_of_control_law)?;
            let Some(body_bytes) = rest.get_mut(..len) else {
                break;
            };
            stream
                .read_exact(body_bytes)
                .await
                .map_err(|e| PeerError::io("reading control-law body", e))?;
            self.last_control = Some(decode_body(body_bytes, header.size_of_control_law)?);
            self.stats.received(CONTROL_LAW_HEADER_SIZE.saturating_add(len));
            self.stats.complete_cycle();
            trace!(cycle = observation.sequence, control_bytes = len, "sensor cycle complete");

            if let Some(period) = self.config.period {
                tokio::time::sleep(period).await;
            }
        }

        debug!(stats = ?self.stats, "sensor simulator finished");
        Ok(self.stats)
    }

    /// The most recent control law received.
    #[must_use]
    pub fn last_control(&self) -> Option<&ControlLawBody> {
        self.last_control.as_ref()
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> PeerStats {
        self.stats
    }

    /// Stop the peripheral tasks.
    pub fn stop(&self) {
        self.barrier.stop();
    }
}

impl Drop for SensorSimulator {
    fn drop(&mut self) {
        self.barrier.stop();
        for task in &self.peripherals {
            task.abort();
        }
    }
}

fn spawn_peripheral(
    id: PeripheralId,
    barrier: Arc<PeripheralBarrier>,
    slot: Arc<Mutex<SampleSlot>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while barrier.wait_turn(id).await {
            slot.lock().record(id);
            barrier.arrive(id);
        }
        trace!(peripheral = %id, "peripheral stopped");
    })
}
