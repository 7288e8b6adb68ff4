//! PostgreSQL schema reconciliation.

use std::collections::HashSet;

use ::postgres::GenericClient;

use super::{MigrationError, MigrationReport};
use crate::schema::{
    add_column_sql, create_deleted_at_index_sql, create_table_sql, Dialect, DELETED_AT_INDEX,
    IMAGES_TABLE, IMAGE_COLUMNS,
};

fn existing_columns<C: GenericClient>(
    client: &mut C,
    table: &str,
) -> Result<HashSet<String>, ::postgres::Error> {
    let rows = client.query(
        "SELECT column_name FROM information_schema.columns
         WHERE table_schema = current_schema() AND table_name = $1",
        &[&table],
    )?;

    Ok(rows
        .iter()
        .map(|row| row.get::<_, String>(0).to_ascii_lowercase())
        .collect())
}

fn index_exists<C: GenericClient>(client: &mut C, name: &str) -> Result<bool, ::postgres::Error> {
    let row = client.query_one(
        "SELECT COUNT(*) FROM pg_indexes
         WHERE schemaname = current_schema() AND indexname = $1",
        &[&name],
    )?;
    Ok(row.get::<_, i64>(0) > 0)
}

/// Bring the `images` table up to date inside a single transaction.
///
/// Same contract as the SQLite variant: create the table when absent, add
/// missing columns, add the `deleted_at` index, never remove anything.
pub fn run_migrations(client: &mut ::postgres::Client) -> Result<MigrationReport, MigrationError> {
    let mut tx = client.transaction()?;
    let mut report = MigrationReport::default();

    let existing = existing_columns(&mut tx, IMAGES_TABLE)?;
    if existing.is_empty() {
        tx.batch_execute(&create_table_sql(Dialect::Postgres))?;
        report.table_created = true;
    } else {
        for column in IMAGE_COLUMNS {
            if existing.contains(column.name) {
                continue;
            }
            let sql = add_column_sql(Dialect::Postgres, column).ok_or(
                MigrationError::CannotAddColumn {
                    table: IMAGES_TABLE,
                    column: column.name,
                },
            )?;
            tx.batch_execute(&sql)?;
            report.columns_added.push(column.name);
        }
    }

    if !index_exists(&mut tx, DELETED_AT_INDEX)? {
        tx.batch_execute(&create_deleted_at_index_sql())?;
        report.indexes_created.push(DELETED_AT_INDEX);
    }

    tx.commit()?;

    if report.is_noop() {
        tracing::debug!("PostgreSQL schema up to date");
    } else {
        tracing::info!("Migrated PostgreSQL schema: {}", report);
    }

    Ok(report)
}
