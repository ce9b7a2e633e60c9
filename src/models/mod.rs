// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod entry;
pub mod weekly;

pub use entry::{Entry, EntryView};
pub use weekly::{WeeklyRollup, WeeklyRollupView};
