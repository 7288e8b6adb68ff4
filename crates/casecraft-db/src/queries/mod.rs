//! Database query operations.
//!
//! Query functions take a borrowed SQLite connection and return
//! `casecraft_common::Result`. Lookups return `Option` for missing rows;
//! the [`crate::store`] layer turns those into `NotFound` errors.

pub mod images;
