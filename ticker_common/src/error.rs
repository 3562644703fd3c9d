//! Error types shared by the control loop, the fetcher and the display.
//!
//! `TickerError` covers the plumbing failures (I/O, JSON, channels and the
//! display lock) that any crate in the workspace may propagate.
//! `FetchError` is the narrower taxonomy produced while acquiring a quote; it is
//! always handled where it originates and turned into a user-visible status.
use std::io;

use thiserror::Error;

/// Unified error type shared by the workspace.
#[derive(Error, Debug)]
pub enum TickerError {
    /// I/O error originating from the standard library or files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// A symbol was empty or longer than the accepted length after normalization.
    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),

    /// A line of user input could not be turned into an intent.
    #[error("Invalid intent: {0}")]
    InvalidIntent(String),

    /// Rotation interval outside the supported set of minutes.
    #[error("Unsupported rotation interval: {0} min")]
    InvalidInterval(i64),

    /// Channel receive failed (e.g., sender closed); contains a short context string.
    #[error("Channel receive failed: {0}")]
    ChannelRecv(String),

    /// The display lock could not be taken within the allotted time.
    #[error("Display lock busy after {0} ms")]
    DisplayBusy(u64),
}

/// Failure while acquiring a quote for one symbol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// No network transport is available; no request was attempted.
    #[error("no network connectivity")]
    NoConnectivity,

    /// Non-200 response (`Some(status)`) or transport failure (`None`).
    #[error("provider error ({})", status_label(.status))]
    Provider {
        /// HTTP status code, absent when the request never produced a response.
        status: Option<u16>,
    },

    /// The response body was not parseable as a quote object.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The payload parsed but carried no usable price data.
    #[error("empty quote for {0}")]
    EmptyQuote(String),

    /// Rotation found neither a fresh fetch nor a cache entry to reuse.
    #[error("no cached data for {0}")]
    NoCachedData(String),
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "transport".to_string(),
    }
}

impl FetchError {
    /// Transport-level failure without an HTTP status.
    pub fn transport() -> Self {
        FetchError::Provider { status: None }
    }
}
