// SPDX-License-Identifier: MIT

//! Calendar-week arithmetic for rollup bucketing.
//!
//! Entries are bucketed into Monday-aligned ISO weeks. A calendar date is
//! canonicalized to midnight UTC of that date before any arithmetic, so the
//! same `YYYY-MM-DD` maps to the same week on every host regardless of the
//! process timezone.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};

/// Seconds in one week.
pub const WEEK_SECONDS: i64 = 7 * 24 * 3600;

/// The Monday-aligned week containing a given calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Week {
    /// Monday beginning the week.
    pub start: NaiveDate,
    /// ISO week-numbering year (differs from the calendar year around
    /// year boundaries).
    pub iso_year: i32,
    /// ISO week number, 1-53.
    pub iso_week: u32,
}

impl Week {
    /// Compute the week containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let days_since_monday = date.weekday().num_days_from_monday() as i64;
        let start = date - Duration::days(days_since_monday);
        let iso = date.iso_week();
        Self {
            start,
            iso_year: iso.year(),
            iso_week: iso.week(),
        }
    }

    /// Midnight-UTC epoch seconds of the week's Monday.
    pub fn start_ts(&self) -> i64 {
        date_to_ts(self.start)
    }

    /// Exclusive end of the week: midnight of the following Monday.
    pub fn end_ts(&self) -> i64 {
        self.start_ts() + WEEK_SECONDS
    }
}

/// Canonicalize a calendar date to midnight-UTC epoch seconds.
pub fn date_to_ts(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Inverse of [`date_to_ts`], for rendering stored timestamps.
pub fn ts_to_date(ts: i64) -> Option<NaiveDate> {
    chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_midweek_dates_share_a_monday() {
        // Tuesday and Thursday of the same week
        let tue = Week::containing(d("2014-06-17"));
        let thu = Week::containing(d("2014-06-19"));

        assert_eq!(tue.start, d("2014-06-16"));
        assert_eq!(thu.start, d("2014-06-16"));
        assert_eq!(tue.start_ts(), thu.start_ts());
    }

    #[test]
    fn test_monday_is_its_own_week_start() {
        let week = Week::containing(d("2014-06-16"));
        assert_eq!(week.start, d("2014-06-16"));
    }

    #[test]
    fn test_sunday_belongs_to_preceding_monday() {
        let week = Week::containing(d("2014-06-22"));
        assert_eq!(week.start, d("2014-06-16"));
    }

    #[test]
    fn test_week_window_is_seven_days() {
        let week = Week::containing(d("2014-06-18"));
        assert_eq!(week.end_ts() - week.start_ts(), WEEK_SECONDS);
        // The following Monday falls outside the window
        assert_eq!(week.end_ts(), date_to_ts(d("2014-06-23")));
    }

    #[test]
    fn test_iso_week_year_boundary() {
        // 2014-12-29 is a Monday belonging to ISO week 1 of 2015
        let week = Week::containing(d("2014-12-29"));
        assert_eq!(week.start, d("2014-12-29"));
        assert_eq!(week.iso_year, 2015);
        assert_eq!(week.iso_week, 1);
    }

    #[test]
    fn test_date_ts_round_trip() {
        let date = d("2014-06-17");
        assert_eq!(ts_to_date(date_to_ts(date)), Some(date));
    }

    #[test]
    fn test_containing_is_idempotent() {
        let week = Week::containing(d("2014-06-19"));
        assert_eq!(Week::containing(week.start), week);
    }
}
