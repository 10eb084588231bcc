//! Simulated sensor peripherals.
//!
//! Each peripheral fills two of the four observation readings. The samples
//! are deterministic functions of the cycle number so runs are reproducible.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A simulated peripheral on the sensor rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PeripheralId {
    /// Position fix, sampled every cycle.
    Gps,
    /// Image feature tracker, sampled every few cycles.
    Camera,
}

impl PeripheralId {
    /// Every peripheral, in reading order.
    pub const ALL: [Self; 2] = [Self::Gps, Self::Camera];

    /// Human-readable name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gps => "gps",
            Self::Camera => "camera",
        }
    }

    /// Index of the first of this peripheral's two readings.
    #[must_use]
    pub fn reading_offset(self) -> usize {
        match self {
            Self::Gps => 0,
            Self::Camera => 2,
        }
    }

    /// Sample this peripheral for `cycle`.
    #[must_use]
    pub fn sample(self, cycle: u64) -> [f32; 2] {
        // Bounded phase keeps the f32 conversion exact enough.
        let phase = (cycle % 3600) as f32 * 0.01;
        match self {
            Self::Gps => [phase.sin(), phase.cos()],
            Self::Camera => [(phase * 0.5).cos() * 0.25, (phase * 0.5).sin() * 0.25],
        }
    }
}

impl fmt::Display for PeripheralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest readings written by the peripherals.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleSlot {
    /// Cycle the peripherals are sampling for.
    pub cycle: u64,
    /// Readings assembled so far.
    pub readings: [f32; loopguard_protocol::READINGS_PER_OBSERVATION],
}

impl SampleSlot {
    /// Store `id`'s sample for the current cycle.
    pub fn record(&mut self, id: PeripheralId) {
        let sample = id.sample(self.cycle);
        let offset = id.reading_offset();
        if let Some(dst) = self.readings.get_mut(offset..offset.saturating_add(sample.len())) {
            dst.copy_from_slice(&sample);
        }
    }
}
