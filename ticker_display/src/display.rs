//! Display state shared between the control loop and the render thread.
//!
//! All writes go through `SharedDisplay::update`, which takes the lock for a
//! bounded time, applies the whole change, bumps the revision and releases the
//! lock when the guard drops. The render thread copies the state out under the
//! same lock and formats it afterwards, so it never observes a half-applied
//! change.
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use ticker_common::{QuoteRecord, Result, Symbol, TickerError};

/// Longest the control loop waits for the display lock.
pub const LOCK_TIMEOUT: Duration = Duration::from_millis(100);

/// Status line shown under the quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Waiting for the first fetch after start-up.
    Connecting,
    /// A new symbol was selected and is being fetched.
    Loading,
    /// Quote applied at this market-local time.
    Updated {
        /// Hour, 0-23.
        hour: u32,
        /// Minute, 0-59.
        minute: u32,
    },
    /// Fetch failed; the cached quote for this symbol is shown.
    CachedApiError,
    /// Fetch failed and nothing is cached for this symbol.
    ApiError,
    /// No network transport.
    NoConnectivity,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Connecting => f.write_str("Connecting..."),
            Status::Loading => f.write_str("Loading..."),
            Status::Updated { hour, minute } => {
                let hour12 = match hour % 12 {
                    0 => 12,
                    h => h,
                };
                let suffix = if *hour >= 12 { "PM" } else { "AM" };
                write!(f, "Last Updated: {}:{:02} {}", hour12, minute, suffix)
            }
            Status::CachedApiError => f.write_str("Cached (API Error)"),
            Status::ApiError => f.write_str("API Error"),
            Status::NoConnectivity => f.write_str("No Network"),
        }
    }
}

/// Everything the presentation side needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    /// Symbol in the header.
    pub symbol: Symbol,
    /// Quote behind every numeric field; `None` until one is available.
    pub quote: Option<QuoteRecord>,
    /// Price text shown while `quote` is `None` (cold start, loading).
    pub placeholder_price: String,
    /// Status line.
    pub status: Status,
    /// `false` while a rotation swap is fading.
    pub visible: bool,
    /// Incremented on every update.
    pub revision: u64,
}

impl DisplayState {
    /// Cold-start state: last symbol and last price, nothing fetched yet.
    pub fn cold_start(symbol: Symbol, last_price: String) -> Self {
        Self {
            symbol,
            quote: None,
            placeholder_price: last_price,
            status: Status::Connecting,
            visible: true,
            revision: 0,
        }
    }

    /// Replace every quote field at once and make them visible.
    pub fn show_quote(&mut self, record: QuoteRecord, status: Status) {
        self.symbol = record.symbol.clone();
        self.quote = Some(record);
        self.status = status;
        self.visible = true;
    }

    /// Blank the quote while `symbol` is fetched.
    pub fn show_loading(&mut self, symbol: Symbol) {
        self.symbol = symbol;
        self.quote = None;
        self.placeholder_price = "$---.--".to_string();
        self.status = Status::Loading;
        self.visible = true;
    }
}

/// Lock-protected handle to the display state.
#[derive(Clone)]
pub struct SharedDisplay {
    inner: Arc<Mutex<DisplayState>>,
    timeout: Duration,
}

impl SharedDisplay {
    /// Wrap `state` with the default lock timeout.
    pub fn new(state: DisplayState) -> Self {
        Self::with_timeout(state, LOCK_TIMEOUT)
    }

    /// Wrap `state` with a custom lock timeout.
    pub fn with_timeout(state: DisplayState, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
            timeout,
        }
    }

    /// Take the lock, giving up after the timeout. Released when the guard drops.
    pub fn lock(&self) -> Result<MutexGuard<'_, DisplayState>> {
        self.inner
            .try_lock_for(self.timeout)
            .ok_or(TickerError::DisplayBusy(self.timeout.as_millis() as u64))
    }

    /// Apply `change` under the lock and bump the revision.
    pub fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut DisplayState),
    {
        let mut state = self.lock()?;
        change(&mut *state);
        state.revision += 1;
        Ok(())
    }

    /// Copy of the state when its revision differs from `seen`.
    pub fn snapshot_if_changed(&self, seen: u64) -> Result<Option<DisplayState>> {
        let state = self.lock()?;
        if state.revision == seen {
            Ok(None)
        } else {
            Ok(Some(state.clone()))
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> Result<DisplayState> {
        Ok(self.lock()?.clone())
    }
}
