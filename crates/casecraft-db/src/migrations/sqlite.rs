//! SQLite schema reconciliation.

use std::collections::HashSet;

use rusqlite::Connection;

use super::{MigrationError, MigrationReport};
use crate::schema::{
    add_column_sql, create_deleted_at_index_sql, create_table_sql, Dialect, DELETED_AT_INDEX,
    IMAGES_TABLE, IMAGE_COLUMNS,
};

/// Lower-cased names of the columns `table` currently has. Empty when the
/// table does not exist.
fn existing_columns(conn: &Connection, table: &str) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(names.into_iter().map(|n| n.to_ascii_lowercase()).collect())
}

fn index_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Bring the `images` table up to date.
///
/// This function will:
/// 1. Create the table if it doesn't exist
/// 2. Add any column of [`IMAGE_COLUMNS`] the table lacks
/// 3. Create the `deleted_at` index if it doesn't exist
///
/// All steps run in one transaction, so a failure leaves the schema as it
/// was.
///
/// # Returns
///
/// * `Ok(MigrationReport)` - What was changed; a no-op report on an
///   up-to-date schema
/// * `Err(MigrationError)` - If a statement fails or a required column
///   cannot be added
pub fn run_migrations(conn: &Connection) -> Result<MigrationReport, MigrationError> {
    let tx = conn.unchecked_transaction()?;
    let mut report = MigrationReport::default();

    let existing = existing_columns(&tx, IMAGES_TABLE)?;
    if existing.is_empty() {
        tx.execute_batch(&create_table_sql(Dialect::Sqlite))?;
        report.table_created = true;
    } else {
        for column in IMAGE_COLUMNS {
            if existing.contains(column.name) {
                continue;
            }
            let sql = add_column_sql(Dialect::Sqlite, column).ok_or(
                MigrationError::CannotAddColumn {
                    table: IMAGES_TABLE,
                    column: column.name,
                },
            )?;
            tx.execute(&sql, [])?;
            report.columns_added.push(column.name);
        }
    }

    if !index_exists(&tx, DELETED_AT_INDEX)? {
        tx.execute(&create_deleted_at_index_sql(), [])?;
        report.indexes_created.push(DELETED_AT_INDEX);
    }

    tx.commit()?;

    if report.is_noop() {
        tracing::debug!("SQLite schema up to date");
    } else {
        tracing::info!("Migrated SQLite schema: {}", report);
    }

    Ok(report)
}
