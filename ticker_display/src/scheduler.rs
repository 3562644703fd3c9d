//! Refresh cadence for the displayed symbol.
//!
//! Three cadences, chosen on every tick from the last known market state and
//! the market-local time of day:
//!
//! - `MarketOpen`: every 5 minutes, unless rotation is running (rotation
//!   fetches on its own timer).
//! - `Transition`: market closed but within an hour bracketing the open or
//!   close bell; every 5 minutes so the open/close flip is picked up quickly.
//! - `Closed`: every 60 minutes.
//!
//! A fetch may flip the market state, so the next tick can land in a different
//! cadence.

use std::time::{Duration, Instant};

use log::debug;

/// Refresh period while the market is open.
pub const MARKET_OPEN_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// Refresh period near the open and close bells.
pub const TRANSITION_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// Refresh period while the market is closed.
pub const CLOSED_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Minute-of-day windows (half-open) around the open and close bells.
const TRANSITION_WINDOWS: [(u32, u32); 2] = [(540, 600), (930, 990)];

/// `true` for 09:00-09:59 and 15:30-16:29 market-local time.
pub fn is_transition_window(minute_of_day: u32) -> bool {
    TRANSITION_WINDOWS
        .iter()
        .any(|&(start, end)| (start..end).contains(&minute_of_day))
}

/// Refresh cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Market open.
    MarketOpen,
    /// Market closed, near open/close.
    Transition,
    /// Market closed.
    Closed,
}

impl Cadence {
    /// Pick the cadence for the given market state and time of day.
    pub fn classify(market_open: bool, minute_of_day: u32) -> Self {
        if market_open {
            Cadence::MarketOpen
        } else if is_transition_window(minute_of_day) {
            Cadence::Transition
        } else {
            Cadence::Closed
        }
    }

    /// Refresh period for this cadence.
    pub fn interval(self) -> Duration {
        match self {
            Cadence::MarketOpen => MARKET_OPEN_INTERVAL,
            Cadence::Transition => TRANSITION_INTERVAL,
            Cadence::Closed => CLOSED_INTERVAL,
        }
    }
}

/// What the control loop should do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Nothing is due.
    Idle,
    /// Fetch the displayed symbol.
    Fetch(Cadence),
    /// A refresh was due but rotation provides the updates.
    Deferred,
}

/// Tracks when the displayed symbol was last checked.
#[derive(Debug)]
pub struct RefreshScheduler {
    last_check: Instant,
}

impl RefreshScheduler {
    /// Start counting from `now`.
    pub fn new(now: Instant) -> Self {
        Self { last_check: now }
    }

    /// Decide whether to refresh. A due check always restarts the interval.
    pub fn poll(
        &mut self,
        now: Instant,
        market_open: bool,
        minute_of_day: u32,
        rotation_active: bool,
    ) -> Decision {
        let cadence = Cadence::classify(market_open, minute_of_day);
        if now.saturating_duration_since(self.last_check) <= cadence.interval() {
            return Decision::Idle;
        }
        self.last_check = now;

        if cadence == Cadence::MarketOpen && rotation_active {
            debug!("Refresh due but rotation is driving updates");
            return Decision::Deferred;
        }
        debug!("Refresh due ({:?}, every {} min)", cadence, cadence.interval().as_secs() / 60);
        Decision::Fetch(cadence)
    }

    /// Restart the interval, e.g. after an on-demand fetch.
    pub fn mark_checked(&mut self, now: Instant) {
        self.last_check = now;
    }
}
