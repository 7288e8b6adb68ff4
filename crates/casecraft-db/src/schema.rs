//! Declarative schema for the `images` table.
//!
//! The column list is the single source of truth; each backend renders it
//! into its own DDL. Migrations compare a live table against this list and
//! only ever add what is missing.

/// Name of the table holding image records.
pub const IMAGES_TABLE: &str = "images";

/// Index backing the soft-delete filter.
pub const DELETED_AT_INDEX: &str = "idx_images_deleted_at";

/// SQL dialect a statement is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

/// Storage shape of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Store-assigned surrogate key.
    PrimaryKey,
    /// Non-null point in time.
    Timestamp,
    /// Nullable point in time.
    NullableTimestamp,
    /// Non-null text.
    Text,
}

/// A column of the `images` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

/// Every column an `images` table must have, in creation order.
pub const IMAGE_COLUMNS: &[Column] = &[
    Column {
        name: "id",
        kind: ColumnKind::PrimaryKey,
    },
    Column {
        name: "created_at",
        kind: ColumnKind::Timestamp,
    },
    Column {
        name: "updated_at",
        kind: ColumnKind::Timestamp,
    },
    Column {
        name: "deleted_at",
        kind: ColumnKind::NullableTimestamp,
    },
    Column {
        name: "filename",
        kind: ColumnKind::Text,
    },
    Column {
        name: "filepath",
        kind: ColumnKind::Text,
    },
];

/// Column list in model order, used by every `SELECT` and `RETURNING`.
pub const IMAGE_SELECT_COLUMNS: &str = "id, created_at, updated_at, deleted_at, filename, filepath";

impl ColumnKind {
    /// Type and constraints used when the whole table is created.
    pub fn create_definition(self, dialect: Dialect) -> &'static str {
        match (dialect, self) {
            (Dialect::Sqlite, Self::PrimaryKey) => "INTEGER PRIMARY KEY AUTOINCREMENT",
            (Dialect::Sqlite, Self::Timestamp) => "TEXT NOT NULL",
            (Dialect::Sqlite, Self::NullableTimestamp) => "TEXT",
            (Dialect::Postgres, Self::PrimaryKey) => "BIGSERIAL PRIMARY KEY",
            (Dialect::Postgres, Self::Timestamp) => "TIMESTAMPTZ NOT NULL",
            (Dialect::Postgres, Self::NullableTimestamp) => "TIMESTAMPTZ",
            (_, Self::Text) => "TEXT NOT NULL",
        }
    }

    /// Type and constraints used when the column is added to an existing
    /// table, or `None` if it cannot be added after the fact.
    ///
    /// Existing rows need a value, so non-null columns carry a default.
    /// SQLite only accepts constant defaults in `ADD COLUMN`.
    pub fn add_definition(self, dialect: Dialect) -> Option<&'static str> {
        match (dialect, self) {
            (_, Self::PrimaryKey) => None,
            (Dialect::Sqlite, Self::Timestamp) => {
                Some("TEXT NOT NULL DEFAULT '1970-01-01T00:00:00+00:00'")
            }
            (Dialect::Sqlite, Self::NullableTimestamp) => Some("TEXT"),
            (Dialect::Postgres, Self::Timestamp) => Some("TIMESTAMPTZ NOT NULL DEFAULT now()"),
            (Dialect::Postgres, Self::NullableTimestamp) => Some("TIMESTAMPTZ"),
            (_, Self::Text) => Some("TEXT NOT NULL DEFAULT ''"),
        }
    }
}

/// `CREATE TABLE IF NOT EXISTS` statement for the full table.
pub fn create_table_sql(dialect: Dialect) -> String {
    let columns = IMAGE_COLUMNS
        .iter()
        .map(|c| format!("    {} {}", c.name, c.kind.create_definition(dialect)))
        .collect::<Vec<_>>()
        .join(",\n");

    format!("CREATE TABLE IF NOT EXISTS {} (\n{}\n)", IMAGES_TABLE, columns)
}

/// `ALTER TABLE ... ADD COLUMN` statement, or `None` for columns that
/// cannot be added to a populated table.
pub fn add_column_sql(dialect: Dialect, column: &Column) -> Option<String> {
    column.kind.add_definition(dialect).map(|definition| {
        format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            IMAGES_TABLE, column.name, definition
        )
    })
}

/// Index on `deleted_at`; the same text is valid for both dialects.
pub fn create_deleted_at_index_sql() -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} (deleted_at)",
        DELETED_AT_INDEX, IMAGES_TABLE
    )
}
