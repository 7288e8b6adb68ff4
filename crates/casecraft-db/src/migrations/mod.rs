//! Database migrations module
//!
//! Migrations reconcile a live database with [`crate::schema::IMAGE_COLUMNS`].
//! They are additive only: a missing table is created, missing columns and
//! indexes are added, and nothing is ever dropped, renamed, or retyped.
//! Running them against an up-to-date schema is a no-op.

#[cfg(feature = "postgres")]
pub mod postgres;
pub mod sqlite;

pub use sqlite::run_migrations;

use thiserror::Error;

/// Migration error types
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] ::postgres::Error),

    #[error("Column {column} is missing from existing table {table} and cannot be added")]
    CannotAddColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl From<MigrationError> for casecraft_common::Error {
    fn from(e: MigrationError) -> Self {
        casecraft_common::Error::migration(e.to_string())
    }
}

/// What a migration run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// The table did not exist and was created.
    pub table_created: bool,
    /// Columns added to a pre-existing table.
    pub columns_added: Vec<&'static str>,
    /// Indexes that were missing and have been created.
    pub indexes_created: Vec<&'static str>,
}

impl MigrationReport {
    /// True when the schema was already up to date.
    pub fn is_noop(&self) -> bool {
        !self.table_created && self.columns_added.is_empty() && self.indexes_created.is_empty()
    }

    /// Number of individual schema changes applied.
    pub fn changes(&self) -> usize {
        usize::from(self.table_created) + self.columns_added.len() + self.indexes_created.len()
    }
}

impl std::fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_noop() {
            return write!(f, "schema up to date");
        }

        let mut parts = Vec::new();
        if self.table_created {
            parts.push("created table images".to_string());
        }
        if !self.columns_added.is_empty() {
            parts.push(format!("added columns {}", self.columns_added.join(", ")));
        }
        if !self.indexes_created.is_empty() {
            parts.push(format!("created indexes {}", self.indexes_created.join(", ")));
        }
        write!(f, "{}", parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_noop() {
        let report = MigrationReport::default();
        assert!(report.is_noop());
        assert_eq!(report.changes(), 0);
        assert_eq!(report.to_string(), "schema up to date");
    }

    #[test]
    fn test_report_changes() {
        let report = MigrationReport {
            table_created: false,
            columns_added: vec!["filename", "filepath"],
            indexes_created: vec!["idx_images_deleted_at"],
        };
        assert!(!report.is_noop());
        assert_eq!(report.changes(), 3);
        assert_eq!(
            report.to_string(),
            "added columns filename, filepath; created indexes idx_images_deleted_at"
        );
    }

    #[test]
    fn test_error_converts_to_migration_error() {
        let err: casecraft_common::Error = MigrationError::CannotAddColumn {
            table: "images",
            column: "id",
        }
        .into();
        assert!(matches!(err, casecraft_common::Error::Migration(_)));
    }
}
