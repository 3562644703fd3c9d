//! State owned by the control loop.
//!
//! - `cache`: bounded last-known-good `QuoteRecord` per symbol.
//! - `prefetch`: single-slot staging for the next rotation swap.
//! - `rotation`: rotation list, index and timer.
//! - `simulator`: offline random-walk quote source.

pub mod cache;
pub mod prefetch;
pub mod rotation;
pub mod simulator;
