//! Quote record, its derived numeric fields and the provider payload it is built from.
//!
//! The provider sends every number as a JSON string and any field may be
//! missing. [`ProviderQuote`] absorbs that: a field that is absent or of the
//! wrong type reads as "not present" instead of failing the parse. A
//! [`QuoteRecord`] is then built in one step from a parsed payload, so there
//! is never a half-filled record to publish.
//!
//! The derivations (`dollar_change`, `range_position`, `VolumeScale`) are pure
//! and carry no formatting; rendering is left to the presentation side.
use std::time::Instant;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::FetchError;
use crate::symbol::Symbol;

/// Range position used when a range is empty or inverted.
pub const NEUTRAL_POSITION: u8 = 50;

/// Numeric field sent as a string; anything else reads as absent.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct NumericField(pub Option<f64>);

impl NumericField {
    /// Value or `0.0`.
    pub fn or_zero(self) -> f64 {
        self.0.unwrap_or(0.0)
    }
}

impl<'de> Deserialize<'de> for NumericField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let parsed = match value {
            Value::String(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        };
        Ok(NumericField(parsed))
    }
}

/// String field; anything else reads as absent.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TextField(pub Option<String>);

impl<'de> Deserialize<'de> for TextField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(text) => Ok(TextField(Some(text))),
            _ => Ok(TextField(None)),
        }
    }
}

/// Boolean field; anything else reads as absent.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FlagField(pub Option<bool>);

impl<'de> Deserialize<'de> for FlagField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Bool(flag) => Ok(FlagField(Some(flag))),
            _ => Ok(FlagField(None)),
        }
    }
}

/// Nested `fifty_two_week` object.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FiftyTwoWeek {
    /// 52-week low.
    pub low: NumericField,
    /// 52-week high.
    pub high: NumericField,
}

fn lenient_range<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FiftyTwoWeek, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if value.is_object() {
        Ok(serde_json::from_value(value).unwrap_or_default())
    } else {
        Ok(FiftyTwoWeek::default())
    }
}

/// Quote payload as returned by the provider.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProviderQuote {
    /// Last/closing price.
    pub close: NumericField,
    /// Previous session close.
    pub previous_close: NumericField,
    /// Percent change reported by the provider.
    pub percent_change: NumericField,
    /// Session open.
    pub open: NumericField,
    /// Session high.
    pub high: NumericField,
    /// Session low.
    pub low: NumericField,
    /// Session volume.
    pub volume: NumericField,
    /// 52-week range.
    #[serde(deserialize_with = "lenient_range")]
    pub fifty_two_week: FiftyTwoWeek,
    /// Company name.
    pub name: TextField,
    /// Whether the market is open right now.
    pub is_market_open: FlagField,
}

impl ProviderQuote {
    /// Parse a response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, FetchError> {
        serde_json::from_slice(body).map_err(|e| FetchError::MalformedResponse(e.to_string()))
    }
}

/// Parsed state of one symbol at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRecord {
    /// Normalized symbol.
    pub symbol: Symbol,
    /// Last/closing price.
    pub close: f64,
    /// Previous session close.
    pub previous_close: f64,
    /// Percent change, from the provider or derived.
    pub percent_change: f64,
    /// Session open.
    pub open: f64,
    /// Session high.
    pub high: f64,
    /// Session low.
    pub low: f64,
    /// Session volume, never negative.
    pub volume: f64,
    /// 52-week low.
    pub fifty_two_week_low: f64,
    /// 52-week high.
    pub fifty_two_week_high: f64,
    /// Company name, possibly empty.
    pub name: String,
    /// Market-open flag reported with this quote.
    pub market_open: bool,
    /// Monotonic time the quote was fetched.
    pub fetched_at: Instant,
}

impl QuoteRecord {
    /// Build a record from a parsed payload. Absent numbers become `0.0`.
    pub fn from_payload(symbol: Symbol, payload: ProviderQuote, fetched_at: Instant) -> Self {
        let close = payload.close.or_zero();
        let previous_close = payload.previous_close.or_zero();
        let percent_change = payload
            .percent_change
            .0
            .unwrap_or_else(|| percent_change(close, previous_close));

        QuoteRecord {
            symbol,
            close,
            previous_close,
            percent_change,
            open: payload.open.or_zero(),
            high: payload.high.or_zero(),
            low: payload.low.or_zero(),
            volume: payload.volume.or_zero().max(0.0),
            fifty_two_week_low: payload.fifty_two_week.low.or_zero(),
            fifty_two_week_high: payload.fifty_two_week.high.or_zero(),
            name: payload.name.0.unwrap_or_default(),
            market_open: payload.is_market_open.0.unwrap_or(false),
            fetched_at,
        }
    }

    /// `false` for the all-zero record an empty payload produces.
    pub fn is_usable(&self) -> bool {
        self.close > 0.0
    }

    /// Close minus previous close.
    pub fn dollar_change(&self) -> f64 {
        self.close - self.previous_close
    }

    /// Position of the close inside the session range, 0..=100.
    pub fn day_range_position(&self) -> u8 {
        range_position(self.low, self.high, self.close)
    }

    /// Position of the close inside the 52-week range, 0..=100.
    pub fn fifty_two_week_position(&self) -> u8 {
        range_position(self.fifty_two_week_low, self.fifty_two_week_high, self.close)
    }

    /// Magnitude class used to scale the volume for display.
    pub fn volume_scale(&self) -> VolumeScale {
        VolumeScale::for_volume(self.volume)
    }

    /// Time since the quote was fetched.
    pub fn age(&self, now: Instant) -> std::time::Duration {
        now.saturating_duration_since(self.fetched_at)
    }
}

/// Percent change derived from close and previous close; `0.0` when the
/// previous close is zero.
pub fn percent_change(close: f64, previous_close: f64) -> f64 {
    if previous_close == 0.0 {
        0.0
    } else {
        100.0 * (close - previous_close) / previous_close
    }
}

/// Where `value` sits between `low` and `high`, rounded and clamped to 0..=100.
///
/// Returns [`NEUTRAL_POSITION`] when `high <= low` or any input is not a number.
pub fn range_position(low: f64, high: f64, value: f64) -> u8 {
    if !(high > low) || value.is_nan() {
        return NEUTRAL_POSITION;
    }
    let position = (100.0 * (value - low) / (high - low)).round();
    if position.is_nan() {
        return NEUTRAL_POSITION;
    }
    position.clamp(0.0, 100.0) as u8
}

/// Human-scale volume class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeScale {
    /// Divisor 1.
    Units,
    /// Divisor 1e3.
    Thousands,
    /// Divisor 1e6.
    Millions,
    /// Divisor 1e9.
    Billions,
}

impl VolumeScale {
    /// Largest class whose divisor does not exceed `volume`.
    pub fn for_volume(volume: f64) -> Self {
        if volume >= 1e9 {
            VolumeScale::Billions
        } else if volume >= 1e6 {
            VolumeScale::Millions
        } else if volume >= 1e3 {
            VolumeScale::Thousands
        } else {
            VolumeScale::Units
        }
    }

    /// Divisor for this class.
    pub fn divisor(self) -> f64 {
        match self {
            VolumeScale::Units => 1.0,
            VolumeScale::Thousands => 1e3,
            VolumeScale::Millions => 1e6,
            VolumeScale::Billions => 1e9,
        }
    }

    /// Short suffix, empty for units.
    pub fn suffix(self) -> &'static str {
        match self {
            VolumeScale::Units => "",
            VolumeScale::Thousands => "K",
            VolumeScale::Millions => "M",
            VolumeScale::Billions => "B",
        }
    }
}
