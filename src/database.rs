//! Opening the image metadata store selected by the configuration.
//!
//! Both backends use blocking clients. Call these before the Tokio runtime
//! is started (or from `spawn_blocking`).

use std::sync::Arc;

use casecraft_common::Result;
use casecraft_db::{MigrationReport, PgStore, SharedStore, SqliteStore};

use crate::config::{DatabaseBackend, DatabaseConfig};

/// Connect to the configured backend. Unreachable servers and unopenable
/// files are reported as connection errors.
pub fn connect(config: &DatabaseConfig) -> Result<SharedStore> {
    let store: SharedStore = match config.backend {
        DatabaseBackend::Postgres => {
            let options = config.pg_options();
            tracing::info!("Connecting to PostgreSQL at {}", options.display_target());
            Arc::new(PgStore::connect(&options)?)
        }
        DatabaseBackend::Sqlite => {
            let path = shellexpand::tilde(&config.sqlite_path.to_string_lossy()).into_owned();
            tracing::info!("Opening SQLite database at {}", path);
            Arc::new(SqliteStore::open(&path, config.pool_size)?)
        }
    };
    Ok(store)
}

/// Connect, then bring the `images` table up to date.
pub fn connect_and_migrate(config: &DatabaseConfig) -> Result<(SharedStore, MigrationReport)> {
    let store = connect(config)?;
    let report = store.migrate()?;
    tracing::info!("Database migration: {}", report);
    Ok((store, report))
}
