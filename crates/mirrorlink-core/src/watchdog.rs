//! Join watchdog.
//!
//! Bounds how long a room join may stay unacknowledged. At most one timer is
//! pending at a time; arming a new one replaces the old one. Every arm bumps a
//! generation counter and hands back a [`WatchdogToken`], so a fire that was
//! already in flight when the timer got cancelled or replaced is recognised
//! as stale and dropped.
//!
//! Like the rest of the core, the watchdog never sleeps. Drivers either
//! schedule a wake-up at [`JoinWatchdog::deadline`] and report back with
//! [`JoinWatchdog::fire`], or poll [`JoinWatchdog::expired`] from a tick.

use std::time::{Duration, Instant};

/// Handle to one arming of the watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchdogToken(u64);

impl WatchdogToken {
    /// Generation this token was issued for.
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Cancellable single-shot timer.
#[derive(Debug, Clone, Default)]
pub struct JoinWatchdog {
    generation: u64,
    pending: Option<(WatchdogToken, Instant)>,
}

impl JoinWatchdog {
    /// Create a disarmed watchdog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer to expire `duration` after `now`.
    ///
    /// Any pending timer is cancelled first.
    pub fn start(&mut self, now: Instant, duration: Duration) -> WatchdogToken {
        self.cancel();
        self.generation = self.generation.wrapping_add(1);
        let token = WatchdogToken(self.generation);
        self.pending = Some((token, now + duration));
        token
    }

    /// Disarm. Returns whether a timer was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Whether a timer is armed.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Token of the pending timer.
    pub fn token(&self) -> Option<WatchdogToken> {
        self.pending.map(|(token, _)| token)
    }

    /// Expiry instant of the pending timer.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, deadline)| deadline)
    }

    /// Consume a fire for `token`.
    ///
    /// Returns `true` only if `token` is the pending timer, which is then
    /// disarmed. Stale tokens return `false` and change nothing.
    pub fn fire(&mut self, token: WatchdogToken) -> bool {
        match self.pending {
            Some((pending, _)) if pending == token => {
                self.pending = None;
                true
            },
            _ => false,
        }
    }

    /// Token of the pending timer if it has expired by `now`.
    pub fn expired(&self, now: Instant) -> Option<WatchdogToken> {
        match self.pending {
            Some((token, deadline)) if now >= deadline => Some(token),
            _ => None,
        }
    }
}
