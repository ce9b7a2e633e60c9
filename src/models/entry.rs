// SPDX-License-Identifier: MIT

//! Training entry model for storage and API.

use serde::Serialize;

use crate::week::ts_to_date;

/// Stored training entry row.
///
/// `date` is midnight-UTC epoch seconds of the entry's calendar date;
/// `time` is the elapsed duration in seconds. Both `distance` and `time`
/// are strictly positive for every persisted row.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Entry {
    /// Rowid assigned by the store
    pub id: i64,
    /// Owner (user id from the auth layer)
    pub uid: i64,
    /// Calendar date as midnight-UTC epoch seconds
    pub date: i64,
    /// Distance in miles
    pub distance: f64,
    /// Elapsed time in seconds
    pub time: i64,
}

impl Entry {
    /// Derived speed in miles per hour. `None` when `time == 0`;
    /// speed is never computed over a zero duration.
    pub fn speed_mph(&self) -> Option<f64> {
        if self.time == 0 {
            return None;
        }
        Some(3600.0 * self.distance / self.time as f64)
    }
}

/// Entry as presented to the API, with the derived speed annotated.
#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    pub id: i64,
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    /// Distance in miles
    pub distance: f64,
    /// Elapsed time in seconds
    pub time: i64,
    /// Speed in mph, rounded to one decimal; absent for zero-time rows
    pub speed: Option<f64>,
}

impl From<&Entry> for EntryView {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id,
            date: ts_to_date(entry.date)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            distance: entry.distance,
            time: entry.time,
            speed: entry.speed_mph().map(round_tenth),
        }
    }
}

/// Round to one decimal place for display.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(distance: f64, time: i64) -> Entry {
        Entry {
            id: 1,
            uid: 42,
            date: 1_402_963_200, // 2014-06-17
            distance,
            time,
        }
    }

    #[test]
    fn test_speed_ten_miles_in_thirty_minutes() {
        // 10 mi in 1800 s = 20 mph
        assert_eq!(entry(10.0, 1800).speed_mph(), Some(20.0));
    }

    #[test]
    fn test_speed_undefined_for_zero_time() {
        assert_eq!(entry(10.0, 0).speed_mph(), None);
    }

    #[test]
    fn test_view_rounds_speed_to_one_decimal() {
        // 10 mi in 2700 s = 13.333... mph
        let view = EntryView::from(&entry(10.0, 2700));
        assert_eq!(view.speed, Some(13.3));
        assert_eq!(view.date, "2014-06-17");
    }
}
