// SPDX-License-Identifier: MIT

//! API routes for authenticated users.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{EntryView, WeeklyRollupView};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/entries", post(add_entry).get(list_entries))
        .route("/api/v1/weekly", get(list_weekly))
}

// ─── Add entry ───────────────────────────────────────────────

/// New entry submission. All fields arrive as strings from the form.
#[derive(Deserialize)]
pub struct AddEntryRequest {
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    /// Distance in miles
    pub distance: String,
    /// Elapsed time as minutes:seconds, e.g. "30:00"
    pub time: String,
}

#[derive(Serialize)]
pub struct AddEntryResponse {
    pub entry: EntryView,
    /// Refreshed rollup for the entry's week
    pub rollup: Option<WeeklyRollupView>,
}

/// Store a new entry and return it with the refreshed weekly rollup.
async fn add_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<AddEntryRequest>,
) -> Result<Json<AddEntryResponse>> {
    let (entry, rollup) = state
        .journal
        .add_entry(user.uid, &req.date, &req.distance, &req.time)
        .await?;

    Ok(Json(AddEntryResponse { entry, rollup }))
}

// ─── List entries ────────────────────────────────────────────

#[derive(Deserialize)]
struct EntriesQuery {
    /// Inclusive lower bound, `YYYY-MM-DD`
    from: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`
    to: Option<String>,
}

#[derive(Serialize)]
pub struct EntriesResponse {
    pub entries: Vec<EntryView>,
}

/// Get the user's entries, optionally filtered by date range.
async fn list_entries(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<EntriesQuery>,
) -> Result<Json<EntriesResponse>> {
    tracing::debug!(
        uid = user.uid,
        from = ?params.from,
        to = ?params.to,
        "Fetching entries"
    );

    let entries = state
        .journal
        .list_entries(user.uid, params.from.as_deref(), params.to.as_deref())
        .await?;

    Ok(Json(EntriesResponse { entries }))
}

// ─── Weekly summaries ────────────────────────────────────────

#[derive(Serialize)]
pub struct WeeklyResponse {
    pub weeks: Vec<WeeklyRollupView>,
}

/// Get the user's weekly summaries, most recent week first.
async fn list_weekly(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<WeeklyResponse>> {
    let weeks = state.journal.list_weekly(user.uid).await?;
    Ok(Json(WeeklyResponse { weeks }))
}
