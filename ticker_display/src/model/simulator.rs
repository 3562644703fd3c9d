//! Offline quote source producing random-walk prices.
//!
//! Used with `--demo` to drive the display without a provider account. Every
//! symbol starts near a base price and moves by at most 1% per fetch; the
//! session high/low and 52-week range widen as the walk moves. Records are
//! always complete, so the control loop treats them like provider quotes.

use std::collections::HashMap;
use std::time::Instant;

use rand::Rng;
use ticker_common::{FetchError, QuoteRecord, Symbol};

use crate::fetcher::QuoteSource;

const INITIAL_PRICE: f64 = 100.0;

struct Walk {
    previous_close: f64,
    open: f64,
    price: f64,
    high: f64,
    low: f64,
    year_low: f64,
    year_high: f64,
    volume: f64,
}

/// Random-walk quote source.
pub struct SimulatedSource {
    walks: HashMap<Symbol, Walk>,
    market_open: bool,
}

impl SimulatedSource {
    /// Create a source that reports the given market state.
    pub fn new(market_open: bool) -> Self {
        Self {
            walks: HashMap::new(),
            market_open,
        }
    }

    /// Calculate the next price using a small random walk around `current_price`.
    ///
    /// The change is sampled uniformly from `[-1%, +1%]` and clamped to a minimum
    /// positive value.
    pub fn next_price(current_price: f64) -> f64 {
        let mut rng = rand::rng();
        let change: f64 = rng.random_range(-0.01..0.01);
        (current_price * (1.0 + change)).max(0.01)
    }
}

impl QuoteSource for SimulatedSource {
    fn fetch(&mut self, symbol: &Symbol, _credential: &str) -> Result<QuoteRecord, FetchError> {
        let mut rng = rand::rng();
        let walk = self.walks.entry(symbol.clone()).or_insert_with(|| {
            let base = INITIAL_PRICE * rng.random_range(0.5..5.0);
            Walk {
                previous_close: base,
                open: base,
                price: base,
                high: base,
                low: base,
                year_low: base * 0.7,
                year_high: base * 1.3,
                volume: 0.0,
            }
        });

        walk.price = Self::next_price(walk.price);
        walk.high = walk.high.max(walk.price);
        walk.low = walk.low.min(walk.price);
        walk.year_high = walk.year_high.max(walk.price);
        walk.year_low = walk.year_low.min(walk.price);
        walk.volume += rng.random_range(10_000.0..2_000_000.0);

        Ok(QuoteRecord {
            symbol: symbol.clone(),
            close: walk.price,
            previous_close: walk.previous_close,
            percent_change: ticker_common::quote::percent_change(walk.price, walk.previous_close),
            open: walk.open,
            high: walk.high,
            low: walk.low,
            volume: walk.volume,
            fifty_two_week_low: walk.year_low,
            fifty_two_week_high: walk.year_high,
            name: format!("{symbol} (simulated)"),
            market_open: self.market_open,
            fetched_at: Instant::now(),
        })
    }
}
