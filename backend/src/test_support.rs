//! Shared test doubles for unit tests inside the crate.

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

/// Clock frozen at one instant.
pub struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl FixtureClock {
    pub fn at(utc_now: DateTime<Utc>) -> Self {
        Self { utc_now }
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

/// Midday on a fixed date, used as "now" across unit tests.
pub fn noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}
