//! Wall-clock time in the market's time zone.
use chrono::{Timelike, Utc};
use chrono_tz::Tz;

/// Source of the market-local time of day.
pub trait WallClock {
    /// Hour (0-23) and minute (0-59) in market-local time.
    fn hour_minute(&self) -> (u32, u32);

    /// Minutes since local midnight.
    fn minute_of_day(&self) -> u32 {
        let (hour, minute) = self.hour_minute();
        hour * 60 + minute
    }
}

/// System clock converted to the exchange time zone.
pub struct MarketClock {
    zone: Tz,
}

impl MarketClock {
    /// Clock for US equity markets (New York).
    pub fn new_york() -> Self {
        Self {
            zone: chrono_tz::America::New_York,
        }
    }
}

impl WallClock for MarketClock {
    fn hour_minute(&self) -> (u32, u32) {
        let now = Utc::now().with_timezone(&self.zone);
        (now.hour(), now.minute())
    }
}
