//! Wall-clock access for the store.
//!
//! Streaks depend on the local calendar day, sprints on milliseconds since the
//! epoch. Both come from a `Clock` so tests can move time forward.

use chrono::{DateTime, Datelike, Local, NaiveDate};

pub trait Clock {
    fn now(&self) -> DateTime<Local>;

    fn now_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The real local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Day key in the persisted `YYYY-M-D` form (no zero padding).
pub fn day_key(date: NaiveDate) -> String {
    format!("{}-{}-{}", date.year(), date.month(), date.day())
}

/// Parse a `YYYY-M-D` key. Zero-padded keys are accepted too.
pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    let mut parts = key.trim().splitn(3, '-');
    let year = parts.next()?.parse::<i32>().ok()?;
    let month = parts.next()?.parse::<u32>().ok()?;
    let day = parts.next()?.parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
