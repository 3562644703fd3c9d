//! Single-slot staging area for the next rotation swap.
//!
//! A record is staged together with the rotation index it belongs to, and is
//! taken exactly once when the swap is applied.

use ticker_common::QuoteRecord;

/// Record waiting to become visible.
#[derive(Debug, Clone, PartialEq)]
pub struct Staged {
    /// Fully built record for the next symbol.
    pub record: QuoteRecord,
    /// Rotation index that becomes current when the record is shown.
    pub index: usize,
}

/// Holds at most one staged record.
#[derive(Debug, Default)]
pub struct PrefetchSlot {
    staged: Option<Staged>,
}

impl PrefetchSlot {
    /// Replace whatever is staged.
    pub fn stage(&mut self, record: QuoteRecord, index: usize) {
        self.staged = Some(Staged { record, index });
    }

    /// Borrow the staged record without consuming it.
    pub fn peek(&self) -> Option<&Staged> {
        self.staged.as_ref()
    }

    /// Consume the staged record, leaving the slot empty.
    pub fn take(&mut self) -> Option<Staged> {
        self.staged.take()
    }

    /// `true` while a record is waiting.
    pub fn is_staged(&self) -> bool {
        self.staged.is_some()
    }
}
