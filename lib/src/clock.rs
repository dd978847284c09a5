// lib/src/clock.rs
//! Source of "today". Status classification is always relative to it.

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, Offset, Utc};

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date in the hospital's local time zone.
    fn today(&self) -> NaiveDate;

    /// Offset that turns stored UTC timestamps into the same calendar as `today`.
    fn utc_offset(&self) -> FixedOffset;

    fn current_year(&self) -> i32 {
        self.today().year()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn utc_offset(&self) -> FixedOffset {
        Local::now().offset().fix()
    }
}

/// Pinned to one date; `now` is midday UTC on that date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    today: NaiveDate,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        FixedClock { today }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.today
            .and_hms_opt(12, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or_else(Utc::now)
    }

    fn today(&self) -> NaiveDate {
        self.today
    }

    fn utc_offset(&self) -> FixedOffset {
        Utc.fix()
    }
}
