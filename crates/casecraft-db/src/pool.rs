//! SQLite connection pool management.
//!
//! This module provides connection pooling for SQLite using r2d2. Building a
//! pool only connects; schema reconciliation is a separate step
//! ([`crate::migrations::run_migrations`]).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use casecraft_common::{Error, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;

/// Type alias for the database connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled database connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Default number of pooled connections.
pub const DEFAULT_POOL_SIZE: u32 = 4;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

static MEMORY_DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Initialize a new database pool with the given file path.
///
/// This function will:
/// - Create the SQLite database file if it doesn't exist
/// - Set up connection pooling with r2d2
/// - Switch the database to WAL mode and set a busy timeout so concurrent
///   writers wait instead of failing
///
/// # Arguments
///
/// * `db_path` - Path to the SQLite database file
/// * `pool_size` - Maximum number of pooled connections
///
/// # Returns
///
/// * `Ok(DbPool)` - Initialized connection pool
/// * `Err(Error::Connection)` - If the database cannot be opened
///
/// # Example
///
/// ```no_run
/// use casecraft_db::pool::init_pool;
///
/// let pool = init_pool("/var/lib/casecraft/casecraft.db", 4).unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_pool(db_path: &str, pool_size: u32) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
    });

    Pool::builder()
        .max_size(pool_size)
        .build(manager)
        .map_err(|e| Error::connection(format!("Failed to open SQLite database {}: {}", db_path, e)))
}

/// Initialize an in-memory database pool for testing.
///
/// Every connection of the pool sees the same database (a named shared-cache
/// in-memory database, unique per call). The database is lost when the pool
/// is dropped.
///
/// # Example
///
/// ```
/// use casecraft_db::pool::init_memory_pool;
///
/// let pool = init_memory_pool().unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_memory_pool() -> Result<DbPool> {
    let n = MEMORY_DB_COUNTER.fetch_add(1, Ordering::Relaxed);
    let uri = format!(
        "file:casecraft-mem-{}-{}?mode=memory&cache=shared",
        std::process::id(),
        n
    );

    let manager = SqliteConnectionManager::file(uri)
        .with_flags(
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));

    Pool::builder()
        .max_size(DEFAULT_POOL_SIZE)
        .build(manager)
        .map_err(|e| Error::connection(format!("Failed to create in-memory pool: {}", e)))
}

/// Get a connection from the pool.
///
/// This is a convenience wrapper around `pool.get()` that converts the
/// r2d2 error into our common Error type.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("Failed to get connection from pool: {}", e)))
}
