// SPDX-License-Identifier: MIT

//! Aggregation engine: validates raw entry input, stores the entry and
//! keeps the touched week's rollup consistent.
//!
//! The only mutation path in the application goes through
//! [`JournalService::add_entry`]; read paths never trigger recomputation.

use chrono::NaiveDate;

use crate::db::Db;
use crate::error::AppError;
use crate::models::{EntryView, WeeklyRollupView};
use crate::week::{date_to_ts, Week};

/// Orchestrates the entry store, week calculator and rollup store.
#[derive(Clone)]
pub struct JournalService {
    db: Db,
}

impl JournalService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Validate, store a new entry and refresh its week's rollup.
    ///
    /// `date_str` is `YYYY-MM-DD`; `time_str` is elapsed duration as
    /// *minutes:seconds* (two numeric groups); `distance_str` is miles.
    /// The returned rollup reflects all of the owner's entries in the
    /// affected week, including the one just added.
    pub async fn add_entry(
        &self,
        uid: i64,
        date_str: &str,
        distance_str: &str,
        time_str: &str,
    ) -> Result<(EntryView, Option<WeeklyRollupView>), AppError> {
        let date = parse_date(date_str)?;
        let time = parse_duration(time_str)?;
        let distance = parse_distance(distance_str)?;

        let week = Week::containing(date);
        let (entry, rollup) = self
            .db
            .add_entry_and_recompute(
                uid,
                date_to_ts(date),
                distance,
                time,
                week.start_ts(),
                week.end_ts(),
            )
            .await?;

        tracing::info!(
            uid,
            entry_id = entry.id,
            date = date_str,
            distance,
            time,
            iso_year = week.iso_year,
            iso_week = week.iso_week,
            "Entry added"
        );

        Ok((
            EntryView::from(&entry),
            rollup.as_ref().map(WeeklyRollupView::from),
        ))
    }

    /// List an owner's entries, optionally restricted to `[from, to]`
    /// inclusive, newest first.
    pub async fn list_entries(
        &self,
        uid: i64,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Vec<EntryView>, AppError> {
        let from = from.map(parse_date).transpose()?;
        let to = to.map(parse_date).transpose()?;

        if let (Some(from), Some(to)) = (from, to) {
            if to < from {
                return Err(AppError::validation("'to' date precedes 'from' date"));
            }
        }

        // Two statically defined queries selected by a branch; an open end
        // of the range falls back to the representable extreme.
        let entries = match (from, to) {
            (None, None) => self.db.list_entries(uid).await?,
            (from, to) => {
                let from_ts = from.map(date_to_ts).unwrap_or(i64::MIN);
                let to_ts = to.map(date_to_ts).unwrap_or(i64::MAX);
                self.db.list_entries_in_range(uid, from_ts, to_ts).await?
            }
        };

        Ok(entries.iter().map(EntryView::from).collect())
    }

    /// List an owner's weekly summaries, most recent week first.
    pub async fn list_weekly(&self, uid: i64) -> Result<Vec<WeeklyRollupView>, AppError> {
        let rollups = self.db.list_weekly(uid).await?;
        Ok(rollups.iter().map(WeeklyRollupView::from).collect())
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| AppError::validation("bad date"))
}

/// Parse an elapsed duration given as minutes:seconds, e.g. `"30:00"`.
///
/// Exactly two numeric groups are required; a duration of zero is
/// rejected because speed is undefined over zero time.
fn parse_duration(raw: &str) -> Result<i64, AppError> {
    let mut groups = raw.split(':');
    let (minutes, seconds) = match (groups.next(), groups.next(), groups.next()) {
        (Some(m), Some(s), None) => {
            let minutes: i64 = m.parse().map_err(|_| AppError::validation("bad time"))?;
            let seconds: i64 = s.parse().map_err(|_| AppError::validation("bad time"))?;
            (minutes, seconds)
        }
        _ => return Err(AppError::validation("bad time")),
    };

    if minutes < 0 || seconds < 0 {
        return Err(AppError::validation("bad time"));
    }
    let total = minutes
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds))
        .ok_or_else(|| AppError::validation("bad time"))?;
    if total == 0 {
        return Err(AppError::validation("zero time"));
    }
    Ok(total)
}

/// Parse a distance in miles; zero and negative values are rejected.
fn parse_distance(raw: &str) -> Result<f64, AppError> {
    let distance: f64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::validation("bad distance"))?;
    if !distance.is_finite() || distance < 0.0 {
        return Err(AppError::validation("bad distance"));
    }
    if distance == 0.0 {
        return Err(AppError::validation("zero distance"));
    }
    Ok(distance)
}
