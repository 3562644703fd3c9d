//! Tagged intents queued by the input side and drained by the control loop.
//!
//! Each user action is one variant, so two actions arriving in the same tick
//! never overwrite each other. Intents also parse from the short text commands
//! accepted on the console (`next`, `symbol aapl`, `rotate every 2`, ...).
use std::str::FromStr;

use strum_macros::{Display, EnumString};

use crate::error::TickerError;
use crate::symbol::{Preset, Symbol};

/// Direction of a manual rotation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    /// Next symbol in the list, wrapping to the first.
    Forward,
    /// Previous symbol in the list, wrapping to the last.
    Back,
}

/// Supported automatic rotation periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationInterval {
    /// One minute.
    One,
    /// Two minutes.
    Two,
    /// Five minutes.
    #[default]
    Five,
    /// Ten minutes.
    Ten,
}

impl RotationInterval {
    /// Interval length in minutes.
    pub fn minutes(self) -> u64 {
        match self {
            RotationInterval::One => 1,
            RotationInterval::Two => 2,
            RotationInterval::Five => 5,
            RotationInterval::Ten => 10,
        }
    }

    /// Interval as a duration.
    pub fn as_duration(self) -> std::time::Duration {
        std::time::Duration::from_secs(self.minutes() * 60)
    }
}

impl TryFrom<i64> for RotationInterval {
    type Error = TickerError;

    fn try_from(minutes: i64) -> Result<Self, Self::Error> {
        match minutes {
            1 => Ok(RotationInterval::One),
            2 => Ok(RotationInterval::Two),
            5 => Ok(RotationInterval::Five),
            10 => Ok(RotationInterval::Ten),
            other => Err(TickerError::InvalidInterval(other)),
        }
    }
}

/// One queued request for the control loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Show a symbol from the preset watch list.
    SelectPreset(Preset),
    /// Show an arbitrary symbol.
    ChangeSymbol(Symbol),
    /// Step through the rotation list.
    Advance(Direction),
    /// Fetch the displayed symbol now.
    Refresh,
    /// Replace the rotation list with a comma-delimited string.
    SetRotationList(String),
    /// Turn automatic rotation on or off.
    SetRotationEnabled(bool),
    /// Change the automatic rotation period.
    SetRotationInterval(RotationInterval),
    /// Replace the provider credential.
    SetApiKey(String),
    /// Stop the application.
    Quit,
}

impl FromStr for Intent {
    type Err = TickerError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let invalid = || TickerError::InvalidIntent(line.to_string());

        match verb.to_ascii_lowercase().as_str() {
            "next" | "forward" => Ok(Intent::Advance(Direction::Forward)),
            "prev" | "back" => Ok(Intent::Advance(Direction::Back)),
            "refresh" => Ok(Intent::Refresh),
            "quit" | "exit" => Ok(Intent::Quit),
            "symbol" => Ok(Intent::ChangeSymbol(Symbol::new(rest)?)),
            "preset" => {
                let preset = match rest.parse::<usize>() {
                    Ok(index) => Preset::from_index(index),
                    Err(_) => rest.parse::<Preset>().ok(),
                };
                preset.map(Intent::SelectPreset).ok_or_else(invalid)
            }
            "apikey" if !rest.is_empty() => Ok(Intent::SetApiKey(rest.to_string())),
            "rotate" => {
                let (option, value) = match rest.split_once(char::is_whitespace) {
                    Some((option, value)) => (option, value.trim()),
                    None => (rest, ""),
                };
                match option.to_ascii_lowercase().as_str() {
                    "on" => Ok(Intent::SetRotationEnabled(true)),
                    "off" => Ok(Intent::SetRotationEnabled(false)),
                    "list" => Ok(Intent::SetRotationList(value.to_string())),
                    "every" => {
                        let minutes = value.parse::<i64>().map_err(|_| invalid())?;
                        Ok(Intent::SetRotationInterval(RotationInterval::try_from(minutes)?))
                    }
                    _ => Err(invalid()),
                }
            }
            _ => Err(invalid()),
        }
    }
}
