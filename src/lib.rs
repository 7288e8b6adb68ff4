//! Casecraft: the phone case designer's frontend server and image metadata
//! store.
//!
//! Startup connects to the database and migrates the `images` table, then
//! serves the frontend directory over HTTP.

pub mod config;
pub mod database;
pub mod server;
