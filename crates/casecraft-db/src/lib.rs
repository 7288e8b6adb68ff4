//! Casecraft-DB: Image metadata schema, migrations, and query operations
//!
//! This crate owns the `images` table. It is reached through the
//! [`ImageStore`] trait, with two pooled backends:
//!
//! - [`SqliteStore`] - SQLite via rusqlite and r2d2 (local runs, tests)
//! - `PgStore` - PostgreSQL via postgres and r2d2 (feature `postgres`)
//!
//! # Modules
//!
//! - `schema` - Declarative column list for the `images` table
//! - `migrations` - Additive, idempotent schema reconciliation
//! - `pool` - SQLite connection pool management
//! - `models` - Rust models matching the database schema
//! - `queries` - SQLite query operations
//! - `store` - The backend-neutral store handle
//!
//! # Example
//!
//! ```
//! use casecraft_db::{ImageStore, SqliteStore};
//!
//! let store = SqliteStore::in_memory().unwrap();
//! store.migrate().unwrap();
//!
//! let image = store.create_image("a.png", "/imgs/a.png").unwrap();
//! assert_eq!(store.get_image(image.id).unwrap().filename, "a.png");
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod queries;
pub mod schema;
pub mod store;

pub use migrations::MigrationReport;
pub use models::Image;
#[cfg(feature = "postgres")]
pub use self::postgres::{PgConnectOptions, PgStore};
pub use store::{ImageStore, SharedStore, SqliteStore};
