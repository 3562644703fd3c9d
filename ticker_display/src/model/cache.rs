//! Bounded last-known-good quote cache.
//!
//! The cache maps a normalized symbol to the most recent usable `QuoteRecord`
//! fetched for it; the record carries its own fetch time. It exposes two core
//! operations:
//!
//! - `SymbolCache::upsert(record)`: replace the entry for the record's symbol in
//!   place, or append it while there is room. Once the cache is full, new symbols
//!   are rejected; existing entries are never evicted.
//! - `SymbolCache::lookup(symbol)`: the cached record, if any.
//!
//! Staleness is not enforced here. Callers judge it with `QuoteRecord::age` and
//! the current market state.
//!
//! The cache is plain memory owned by the control loop and performs no I/O.

use log::debug;
use ticker_common::{QuoteRecord, Symbol};

/// Default number of symbols kept.
pub const CACHE_CAPACITY: usize = 20;

/// Outcome of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// An existing entry was overwritten.
    Replaced,
    /// A new entry was appended.
    Inserted,
    /// The cache is full and the symbol was not present.
    Rejected,
}

/// Fixed-capacity symbol cache with linear lookup.
pub struct SymbolCache {
    entries: Vec<QuoteRecord>,
    capacity: usize,
}

impl SymbolCache {
    /// Create an empty cache holding at most `capacity` symbols.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Cached record for `symbol`.
    pub fn lookup(&self, symbol: &Symbol) -> Option<&QuoteRecord> {
        self.entries.iter().find(|entry| &entry.symbol == symbol)
    }

    /// Insert or replace the entry for `record.symbol`.
    pub fn upsert(&mut self, record: QuoteRecord) -> Upsert {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.symbol == record.symbol)
        {
            *entry = record;
            return Upsert::Replaced;
        }

        if self.entries.len() >= self.capacity {
            debug!("Symbol cache full, not caching {}", record.symbol);
            return Upsert::Rejected;
        }

        self.entries.push(record);
        Upsert::Inserted
    }

    /// Number of cached symbols.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SymbolCache {
    fn default() -> Self {
        Self::new(CACHE_CAPACITY)
    }
}
