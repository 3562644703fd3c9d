//!
//! Common types shared by the ticker display control loop and its adapters.
//!
//! This crate aggregates:
//! - `error`: `TickerError` for plumbing failures and `FetchError` for quote acquisition.
//! - `result`: handy `Result<T, TickerError>` alias.
//! - `symbol`: symbol normalization, preset watch list and rotation-list parsing.
//! - `quote`: `QuoteRecord`, the lenient provider payload and pure derivations.
//! - `intent`: tagged user intents queued for the control loop.
//! - `net`: provider endpoint constants.
#![warn(missing_docs)]
pub mod error;
pub mod result;
pub mod symbol;
pub mod quote;
pub mod intent;
pub mod net;

pub use error::{FetchError, TickerError};
pub use result::Result;
pub use intent::Intent;
pub use quote::QuoteRecord;
pub use symbol::Symbol;
