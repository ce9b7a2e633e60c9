// SPDX-License-Identifier: MIT

//! Service layer.

pub mod journal;

pub use journal::JournalService;
