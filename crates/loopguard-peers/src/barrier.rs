//! Wait-for-N barrier between the sensor loop and its peripheral tasks.
//!
//! The sensor loop calls [`PeripheralBarrier::trigger`] with the peripherals
//! it needs this cycle. Each requested peripheral task wakes from
//! [`PeripheralBarrier::wait_turn`], writes its sample, and calls
//! [`PeripheralBarrier::arrive`]. `trigger` returns once every requested
//! peripheral has arrived.
//!
//! Waiters register for a wake-up before checking state, so a notification
//! between the check and the await is never lost.

use std::pin::pin;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::trace;

use crate::error::{PeerError, PeerResult};
use crate::peripherals::PeripheralId;

#[derive(Debug, Default)]
struct BarrierState {
    pending: Vec<PeripheralId>,
    claimed: Vec<PeripheralId>,
    stopped: bool,
}

impl BarrierState {
    fn settled(&self) -> bool {
        self.pending.is_empty() && self.claimed.is_empty()
    }
}

/// Runtime wait-for-N barrier keyed by [`PeripheralId`].
#[derive(Debug)]
pub struct PeripheralBarrier {
    members: Vec<PeripheralId>,
    state: Mutex<BarrierState>,
    requested: Notify,
    arrived: Notify,
}

impl PeripheralBarrier {
    /// Create a barrier managing `members`.
    #[must_use]
    pub fn new(members: &[PeripheralId]) -> Self {
        let mut members = members.to_vec();
        members.sort_unstable();
        members.dedup();
        Self {
            members,
            state: Mutex::new(BarrierState::default()),
            requested: Notify::new(),
            arrived: Notify::new(),
        }
    }

    /// Peripherals this barrier manages.
    #[must_use]
    pub fn members(&self) -> &[PeripheralId] {
        &self.members
    }

    /// Request `ids` and wait until each has arrived.
    ///
    /// # Errors
    ///
    /// - [`PeerError::UnknownPeripheral`] if any id is not a member. Nothing
    ///   is requested in that case.
    /// - [`PeerError::BarrierStopped`] if the barrier is or becomes stopped.
    pub async fn trigger(&self, ids: &[PeripheralId]) -> PeerResult<()> {
        if let Some(unknown) = ids.iter().find(|id| !self.members.contains(id)) {
            return Err(PeerError::UnknownPeripheral(*unknown));
        }

        {
            let mut state = self.state.lock();
            if state.stopped {
                return Err(PeerError::BarrierStopped);
            }
            for id in ids {
                if !state.pending.contains(id) {
                    state.pending.push(*id);
                }
            }
        }
        trace!(count = ids.len(), "peripherals requested");
        self.requested.notify_waiters();

        loop {
            let mut notified = pin!(self.arrived.notified());
            notified.as_mut().enable();
            {
                let state = self.state.lock();
                if state.stopped {
                    return Err(PeerError::BarrierStopped);
                }
                if state.settled() {
                    return Ok(());
                }
            }
            notified.await;
        }
    }

    /// Wait until `id` is requested.
    ///
    /// Returns `true` when it is this peripheral's turn and `false` once the
    /// barrier is stopped.
    pub async fn wait_turn(&self, id: PeripheralId) -> bool {
        loop {
            let mut notified = pin!(self.requested.notified());
            notified.as_mut().enable();
            {
                let mut state = self.state.lock();
                if state.stopped {
                    return false;
                }
                if let Some(index) = state.pending.iter().position(|p| *p == id) {
                    state.pending.swap_remove(index);
                    state.claimed.push(id);
                    return true;
                }
            }
            notified.await;
        }
    }

    /// Record that `id` has written its sample.
    ///
    /// Returns `false` if `id` had not claimed a turn.
    pub fn arrive(&self, id: PeripheralId) -> bool {
        let settled = {
            let mut state = self.state.lock();
            let Some(index) = state.claimed.iter().position(|p| *p == id) else {
                return false;
            };
            state.claimed.swap_remove(index);
            state.settled()
        };
        if settled {
            self.arrived.notify_waiters();
        }
        true
    }

    /// Release every waiter. Later triggers fail and later turns end.
    pub fn stop(&self) {
        self.state.lock().stopped = true;
        self.requested.notify_waiters();
        self.arrived.notify_waiters();
    }

    /// Whether [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }
}
