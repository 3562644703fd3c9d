//! Symbol normalization, the preset watch list and rotation-list parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::TickerError;

/// Longest accepted symbol, in characters.
pub const MAX_SYMBOL_LEN: usize = 10;
/// Most symbols a rotation list may hold.
pub const MAX_ROTATION_SYMBOLS: usize = 20;

/// Upper-cased, trimmed ticker symbol of 1 to [`MAX_SYMBOL_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Normalizes `raw` and validates its length.
    pub fn new(raw: &str) -> Result<Self, TickerError> {
        let normalized = raw.trim().to_uppercase();
        let len = normalized.chars().count();
        if len == 0 || len > MAX_SYMBOL_LEN {
            return Err(TickerError::InvalidSymbol(raw.to_string()));
        }
        Ok(Symbol(normalized))
    }

    /// Borrow the normalized text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = TickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = TickerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Symbol::new(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

/// Trait providing delimited-list parsing for symbols.
pub trait SymbolListParser: Sized {
    /// Parses a comma-delimited list.
    ///
    /// Tokens are trimmed and upper-cased; empty or over-length tokens are
    /// dropped rather than failing the whole list, and parsing stops once
    /// [`MAX_ROTATION_SYMBOLS`] entries have been collected.
    fn parse_list(raw: &str) -> Vec<Self>;
}

impl SymbolListParser for Symbol {
    fn parse_list(raw: &str) -> Vec<Self> {
        raw.split(',')
            .filter_map(|token| Symbol::new(token).ok())
            .take(MAX_ROTATION_SYMBOLS)
            .collect()
    }
}

/// Fixed watch list offered for one-tap selection.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Display, EnumString, EnumIter, Hash, Eq, PartialEq)]
#[strum(ascii_case_insensitive)]
pub enum Preset {
    MSFT,
    AAPL,
    GOOGL,
    AMZN,
    NVDA,
    TSLA,
    META,
    SPY,
    QQQ,
}

impl Preset {
    /// Preset at `index` in watch-list order.
    pub fn from_index(index: usize) -> Option<Self> {
        Preset::iter().nth(index)
    }

    /// The preset as a normalized symbol.
    pub fn symbol(self) -> Symbol {
        Symbol(self.to_string())
    }
}

/// Symbol shown when nothing has been persisted yet.
pub fn default_symbol() -> Symbol {
    Preset::MSFT.symbol()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_is_trimmed_and_upper_cased() {
        let symbol = Symbol::new("  brk.b ").unwrap();
        assert_eq!(symbol.as_str(), "BRK.B");
    }

    #[test]
    fn empty_and_long_symbols_are_rejected() {
        assert!(Symbol::new("   ").is_err());
        assert!(Symbol::new("ABCDEFGHIJK").is_err());
        assert!(Symbol::new("ABCDEFGHIJ").is_ok());
    }

    #[test]
    fn rotation_list_drops_bad_tokens() {
        let list = Symbol::parse_list(" aapl, ,msft,TOOLONGSYMBOL ,  nvda,");
        let names: Vec<&str> = list.iter().map(Symbol::as_str).collect();
        assert_eq!(names, ["AAPL", "MSFT", "NVDA"]);
    }

    #[test]
    fn rotation_list_is_capped() {
        let raw = (0..30).map(|i| format!("S{i}")).collect::<Vec<_>>().join(",");
        let list = Symbol::parse_list(&raw);
        assert_eq!(list.len(), MAX_ROTATION_SYMBOLS);
        assert_eq!(list[19].as_str(), "S19");
    }

    #[test]
    fn empty_rotation_list() {
        assert!(Symbol::parse_list("").is_empty());
    }

    #[test]
    fn presets_follow_watch_list_order() {
        assert_eq!(Preset::from_index(0), Some(Preset::MSFT));
        assert_eq!(Preset::from_index(8), Some(Preset::QQQ));
        assert_eq!(Preset::from_index(9), None);
        assert_eq!("tsla".parse::<Preset>().unwrap().symbol().as_str(), "TSLA");
    }
}
