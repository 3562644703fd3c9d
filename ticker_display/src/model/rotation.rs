//! Rotation configuration and timer bookkeeping.
//!
//! `Rotation` holds the ordered symbol list, the enabled flag, the interval and
//! the current index, plus the baseline instant of the last rotation attempt.
//! Resolving data and swapping the display happen in the control loop; this
//! type only answers "which index is next" and "is a rotation due".

use std::time::Instant;

use ticker_common::intent::{Direction, RotationInterval};
use ticker_common::symbol::{Symbol, SymbolListParser};

/// Ordered rotation list with its timer.
#[derive(Debug, Clone)]
pub struct Rotation {
    symbols: Vec<Symbol>,
    enabled: bool,
    interval: RotationInterval,
    index: usize,
    last_rotation: Instant,
}

impl Rotation {
    /// Build from the persisted list string.
    pub fn new(raw_list: &str, enabled: bool, interval: RotationInterval, now: Instant) -> Self {
        Self {
            symbols: Symbol::parse_list(raw_list),
            enabled,
            interval,
            index: 0,
            last_rotation: now,
        }
    }

    /// Re-parse the list; the index goes back to the first symbol.
    pub fn set_list(&mut self, raw_list: &str) {
        self.symbols = Symbol::parse_list(raw_list);
        self.index = 0;
    }

    /// Turn rotation on or off.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Change the automatic interval.
    pub fn set_interval(&mut self, interval: RotationInterval) {
        self.interval = interval;
    }

    /// Parsed symbols in order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Whether rotation is switched on.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current automatic interval.
    pub fn interval(&self) -> RotationInterval {
        self.interval
    }

    /// Index of the symbol currently shown.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Symbol at the current index.
    pub fn current(&self) -> Option<&Symbol> {
        self.symbols.get(self.index)
    }

    /// Symbol at `index`.
    pub fn symbol_at(&self, index: usize) -> Option<&Symbol> {
        self.symbols.get(index)
    }

    /// Rotation needs to be on and have somewhere to go.
    pub fn is_active(&self) -> bool {
        self.enabled && self.symbols.len() > 1
    }

    /// Wrap-around neighbour of the current index.
    pub fn next_index(&self, direction: Direction) -> usize {
        let count = self.symbols.len();
        if count == 0 {
            return 0;
        }
        match direction {
            Direction::Forward => (self.index + 1) % count,
            Direction::Back => (self.index + count - 1) % count,
        }
    }

    /// Make `index` current. Out-of-range indices are ignored.
    pub fn advance_to(&mut self, index: usize) {
        if index < self.symbols.len() {
            self.index = index;
        }
    }

    /// `true` once a full interval has passed since the last baseline.
    pub fn is_due(&self, now: Instant) -> bool {
        self.is_active()
            && now.saturating_duration_since(self.last_rotation) > self.interval.as_duration()
    }

    /// Start a new interval at `now`.
    pub fn reset_timer(&mut self, now: Instant) {
        self.last_rotation = now;
    }
}
