//! Peer counters.

use serde::{Deserialize, Serialize};

/// Counters kept by a protocol peer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerStats {
    /// Full cycles completed.
    pub cycles: u64,
    /// Bytes written to the watchdog.
    pub bytes_sent: u64,
    /// Bytes read from the watchdog.
    pub bytes_received: u64,
    /// Whether the watchdog closed the connection.
    pub closed_by_remote: bool,
}

impl PeerStats {
    pub(crate) fn sent(&mut self, bytes: usize) {
        self.bytes_sent = self
            .bytes_sent
            .saturating_add(u64::try_from(bytes).unwrap_or(u64::MAX));
    }

    pub(crate) fn received(&mut self, bytes: usize) {
        self.bytes_received = self
            .bytes_received
            .saturating_add(u64::try_from(bytes).unwrap_or(u64::MAX));
    }

    pub(crate) fn complete_cycle(&mut self) {
        self.cycles = self.cycles.saturating_add(1);
    }
}
