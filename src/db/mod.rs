// SPDX-License-Identifier: MIT

//! Database layer (SQLite via sqlx).
//!
//! Two tables: `entries` holds raw training entries, `weekly` holds the
//! per-owner, per-week rollups materialized from them. The rollup for a
//! week is always recomputed by a full re-scan of that week's entries,
//! never patched incrementally, and the insert-rescan-upsert sequence runs
//! inside a single transaction so concurrent writers for the same
//! `(uid, week_start)` serialize instead of losing updates.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::{Entry, WeeklyRollup};

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const LIST_ENTRIES: &str = "SELECT id, uid, date, distance, time FROM entries \
     WHERE uid = ? ORDER BY date DESC, id DESC";

const LIST_ENTRIES_IN_RANGE: &str = "SELECT id, uid, date, distance, time FROM entries \
     WHERE uid = ? AND date >= ? AND date <= ? ORDER BY date DESC, id DESC";

/// Aggregate of one owner's entries inside a half-open time window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowTotals {
    pub count: i64,
    pub total_distance: f64,
    pub total_time: i64,
}

/// SQLite database handle. Cheap to clone (pool is Arc-backed).
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open (creating if missing) the database at `url` and run migrations.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let opts = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::Database(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePool::connect_with(opts)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        let db = Self { pool };
        db.migrate().await?;

        tracing::info!(url, "Database ready");
        Ok(db)
    }

    async fn migrate(&self) -> Result<(), AppError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                uid INTEGER NOT NULL,
                date INTEGER NOT NULL,
                distance REAL NOT NULL,
                time INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_entries_uid_date ON entries(uid, date);

            CREATE TABLE IF NOT EXISTS weekly (
                uid INTEGER NOT NULL,
                week_start INTEGER NOT NULL,
                avg_speed REAL NOT NULL,
                total_distance REAL NOT NULL,
                PRIMARY KEY (uid, week_start)
            );
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Migration failed: {}", e)))?;
        Ok(())
    }

    // ─── Entries ─────────────────────────────────────────────────

    /// List all entries for an owner, newest first.
    pub async fn list_entries(&self, uid: i64) -> Result<Vec<Entry>, AppError> {
        sqlx::query_as(LIST_ENTRIES)
            .bind(uid)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List entries for an owner with `date` in `[from, to]` inclusive,
    /// newest first.
    pub async fn list_entries_in_range(
        &self,
        uid: i64,
        from: i64,
        to: i64,
    ) -> Result<Vec<Entry>, AppError> {
        sqlx::query_as(LIST_ENTRIES_IN_RANGE)
            .bind(uid)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Aggregate an owner's entries inside `[start, end)`.
    /// Returns zeros (not an error) when nothing matches.
    pub async fn sum_in_window(
        &self,
        uid: i64,
        start: i64,
        end: i64,
    ) -> Result<WindowTotals, AppError> {
        sum_window(&self.pool, uid, start, end)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Weekly rollups ──────────────────────────────────────────

    /// All rollups for an owner, most recent week first.
    pub async fn list_weekly(&self, uid: i64) -> Result<Vec<WeeklyRollup>, AppError> {
        sqlx::query_as(
            "SELECT uid, week_start, avg_speed, total_distance FROM weekly \
             WHERE uid = ? ORDER BY week_start DESC",
        )
        .bind(uid)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch a single rollup row, if present.
    pub async fn get_weekly(
        &self,
        uid: i64,
        week_start: i64,
    ) -> Result<Option<WeeklyRollup>, AppError> {
        sqlx::query_as(
            "SELECT uid, week_start, avg_speed, total_distance FROM weekly \
             WHERE uid = ? AND week_start = ?",
        )
        .bind(uid)
        .bind(week_start)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Atomic entry processing ─────────────────────────────────

    /// Atomically insert an entry and refresh its week's rollup.
    ///
    /// The insert, the full re-scan of `[week_start, week_end)` and the
    /// rollup upsert run in one transaction. The insert is the first
    /// statement, so the write lock is held across the read-aggregate-upsert
    /// window and two concurrent adds touching the same week cannot
    /// overwrite each other with stale totals. On failure nothing is
    /// committed to either table.
    ///
    /// Returns the stored entry and the refreshed rollup. The rollup is
    /// `None` only in the defensive case of a zero total time, which cannot
    /// occur once the insert has succeeded.
    pub async fn add_entry_and_recompute(
        &self,
        uid: i64,
        date: i64,
        distance: f64,
        time: i64,
        week_start: i64,
        week_end: i64,
    ) -> Result<(Entry, Option<WeeklyRollup>), AppError> {
        if distance <= 0.0 || time <= 0 {
            return Err(AppError::validation(
                "entry requires positive distance and time",
            ));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO entries (uid, date, distance, time) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(uid)
        .bind(date)
        .bind(distance)
        .bind(time)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let totals = sum_window(&mut *tx, uid, week_start, week_end)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let rollup = if totals.total_time > 0 {
            let avg_speed = 3600.0 * totals.total_distance / totals.total_time as f64;
            upsert_weekly(&mut *tx, uid, week_start, avg_speed, totals.total_distance)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            Some(WeeklyRollup {
                uid,
                week_start,
                avg_speed,
                total_distance: totals.total_distance,
            })
        } else {
            None
        };

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(
            uid,
            entry_id = id,
            week_start,
            entries_in_week = totals.count,
            "Entry stored and week recomputed"
        );

        Ok((
            Entry {
                id,
                uid,
                date,
                distance,
                time,
            },
            rollup,
        ))
    }

    /// Recompute one week's rollup from scratch (maintenance path).
    ///
    /// Re-scans `[week_start, week_end)` and replaces the stored row; if the
    /// window holds no entries the row is deleted. Idempotent: running it
    /// twice with no intervening writes leaves identical stored values.
    pub async fn recompute_week(
        &self,
        uid: i64,
        week_start: i64,
        week_end: i64,
    ) -> Result<Option<WeeklyRollup>, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let totals = sum_window(&mut *tx, uid, week_start, week_end)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let rollup = if totals.total_time > 0 {
            let avg_speed = 3600.0 * totals.total_distance / totals.total_time as f64;
            upsert_weekly(&mut *tx, uid, week_start, avg_speed, totals.total_distance)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            Some(WeeklyRollup {
                uid,
                week_start,
                avg_speed,
                total_distance: totals.total_distance,
            })
        } else {
            sqlx::query("DELETE FROM weekly WHERE uid = ? AND week_start = ?")
                .bind(uid)
                .bind(week_start)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            None
        };

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rollup)
    }
}

/// Aggregate query shared by the transactional and standalone paths.
async fn sum_window<'e, E>(
    executor: E,
    uid: i64,
    start: i64,
    end: i64,
) -> Result<WindowTotals, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let (count, total_distance, total_time): (i64, f64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(distance), 0.0), COALESCE(SUM(time), 0) \
         FROM entries WHERE uid = ? AND date >= ? AND date < ?",
    )
    .bind(uid)
    .bind(start)
    .bind(end)
    .fetch_one(executor)
    .await?;

    Ok(WindowTotals {
        count,
        total_distance,
        total_time,
    })
}

/// Replace (or create) the rollup row for `(uid, week_start)`.
async fn upsert_weekly<'e, E>(
    executor: E,
    uid: i64,
    week_start: i64,
    avg_speed: f64,
    total_distance: f64,
) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        "INSERT INTO weekly (uid, week_start, avg_speed, total_distance) \
         VALUES (?, ?, ?, ?) \
         ON CONFLICT(uid, week_start) DO UPDATE SET \
           avg_speed = excluded.avg_speed, \
           total_distance = excluded.total_distance",
    )
    .bind(uid)
    .bind(week_start)
    .bind(avg_speed)
    .bind(total_distance)
    .execute(executor)
    .await?;
    Ok(())
}
