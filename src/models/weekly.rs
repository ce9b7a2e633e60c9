// SPDX-License-Identifier: MIT

//! Weekly rollup model: per-owner, per-week materialized aggregates.

use chrono::Datelike;
use serde::Serialize;

use crate::models::entry::round_tenth;
use crate::week::ts_to_date;

/// Stored rollup row, keyed by `(uid, week_start)`.
///
/// A materialized view over `entries`: its values always equal the
/// aggregate of the owner's entries in `[week_start, week_start + 7d)`.
/// Replaced wholesale on every recompute; a week with no entries has
/// no row.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct WeeklyRollup {
    /// Owner (user id from the auth layer)
    pub uid: i64,
    /// Monday of the week as midnight-UTC epoch seconds
    pub week_start: i64,
    /// Average speed in mph over the week (3600 * distance / time)
    pub avg_speed: f64,
    /// Total distance in miles over the week
    pub total_distance: f64,
}

/// Rollup as presented to the API.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyRollupView {
    /// Monday of the week, `YYYY-MM-DD`
    pub week_start: String,
    pub iso_year: i32,
    pub iso_week: u32,
    /// Total distance in miles
    pub total_distance: f64,
    /// Average speed in mph, rounded to one decimal
    pub avg_speed: f64,
}

impl From<&WeeklyRollup> for WeeklyRollupView {
    fn from(rollup: &WeeklyRollup) -> Self {
        let start = ts_to_date(rollup.week_start);
        let iso = start.map(|d| d.iso_week());
        Self {
            week_start: start
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            iso_year: iso.map(|w| w.year()).unwrap_or_default(),
            iso_week: iso.map(|w| w.week()).unwrap_or_default(),
            total_distance: rollup.total_distance,
            avg_speed: round_tenth(rollup.avg_speed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_formats_week_start_and_iso_pair() {
        let rollup = WeeklyRollup {
            uid: 42,
            week_start: 1_402_876_800, // 2014-06-16, a Monday
            avg_speed: 16.0,
            total_distance: 20.0,
        };

        let view = WeeklyRollupView::from(&rollup);
        assert_eq!(view.week_start, "2014-06-16");
        assert_eq!(view.iso_year, 2014);
        assert_eq!(view.iso_week, 25);
        assert_eq!(view.avg_speed, 16.0);
    }
}
