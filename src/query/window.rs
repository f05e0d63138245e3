use chrono::{Days, NaiveDate};

/// A trailing aggregation window anchored on the server's current date.
///
/// The anchor date is always passed in explicitly rather than read from a
/// clock inside the query layer, so every aggregation stays a pure function
/// of (connection, site, window) and tests can pin dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// Exclusive lower bound: events strictly after midnight of this date
    /// are inside the window.
    pub start: NaiveDate,
    /// Exclusive upper bound: midnight of the day after `today`.
    pub end: NaiveDate,
    pub today: NaiveDate,
    pub yesterday: NaiveDate,
}

impl TimeWindow {
    /// A window covering the trailing `days` days up to and including `today`.
    pub fn trailing(today: NaiveDate, days: u32) -> Self {
        Self {
            start: today - Days::new(u64::from(days)),
            end: today + Days::new(1),
            today,
            yesterday: today - Days::new(1),
        }
    }
}

/// Day-over-day percentage change, rounded to one decimal.
///
/// Defined as zero when yesterday's count is zero. That is a deliberate
/// floor rather than a true rate: a site going from 0 to N views reads as
/// "0%", never a division error.
pub fn percent_change(today: u64, yesterday: u64) -> f64 {
    if yesterday == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = (today as f64 - yesterday as f64) / yesterday as f64;
    (ratio * 1000.0).round() / 10.0
}
