// SPDX-License-Identifier: MIT

//! Joggr: a running log with weekly performance summaries.
//!
//! This crate provides the backend API for recording running sessions and
//! maintaining per-user, per-week rollups of distance and average speed.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod week;

use config::Config;
use db::Db;
use services::JournalService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub journal: JournalService,
}
