//! Image database queries.
//!
//! This module provides create, read, update, and soft-delete operations on
//! the `images` table. Normal reads skip soft-deleted rows; the `_unscoped`
//! variant does not.

use casecraft_common::{Error, ImageId, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension};

use crate::models::Image;
use crate::schema::IMAGE_SELECT_COLUMNS;

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Parse an image from a database row.
///
/// Expects columns in order: id, created_at, updated_at, deleted_at, filename, filepath.
fn parse_image_row(row: &rusqlite::Row) -> rusqlite::Result<Image> {
    let deleted_at = row
        .get::<_, Option<String>>(3)?
        .map(|s| parse_timestamp(3, &s))
        .transpose()?;

    Ok(Image {
        id: ImageId::from(row.get::<_, i64>(0)?),
        created_at: parse_timestamp(1, &row.get::<_, String>(1)?)?,
        updated_at: parse_timestamp(2, &row.get::<_, String>(2)?)?,
        deleted_at,
        filename: row.get(4)?,
        filepath: row.get(5)?,
    })
}

/// Insert a new image record.
///
/// The store assigns the id; `created_at` and `updated_at` are both set to
/// now and `deleted_at` starts out null.
///
/// # Arguments
///
/// * `conn` - Database connection
/// * `filename` - Original file name
/// * `filepath` - Where the file is stored, relative or absolute
///
/// # Returns
///
/// * `Ok(Image)` - The inserted image as stored
/// * `Err(Error)` - If a database error occurs
pub fn insert_image(conn: &Connection, filename: &str, filepath: &str) -> Result<Image> {
    let now = Utc::now().to_rfc3339();

    conn.query_row(
        &format!(
            "INSERT INTO images (created_at, updated_at, deleted_at, filename, filepath) VALUES (:now, :now, NULL, :filename, :filepath) RETURNING {}",
            IMAGE_SELECT_COLUMNS
        ),
        rusqlite::named_params! {
            ":now": now,
            ":filename": filename,
            ":filepath": filepath,
        },
        parse_image_row,
    )
    .map_err(|e| Error::database(e.to_string()))
}

/// Get an active (not soft-deleted) image by ID.
///
/// # Returns
///
/// * `Ok(Some(Image))` - The image if found and not deleted
/// * `Ok(None)` - If the image does not exist or has been soft-deleted
/// * `Err(Error)` - If a database error occurs
pub fn get_image(conn: &Connection, id: ImageId) -> Result<Option<Image>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM images WHERE id = :id AND deleted_at IS NULL",
            IMAGE_SELECT_COLUMNS
        ),
        rusqlite::named_params! { ":id": id.get() },
        parse_image_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Get an image by ID regardless of its soft-delete state.
pub fn get_image_unscoped(conn: &Connection, id: ImageId) -> Result<Option<Image>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM images WHERE id = :id",
            IMAGE_SELECT_COLUMNS
        ),
        rusqlite::named_params! { ":id": id.get() },
        parse_image_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Replace the filename and filepath of an active image.
///
/// `updated_at` is refreshed in the same statement.
///
/// # Returns
///
/// * `Ok(Some(Image))` - The updated image
/// * `Ok(None)` - If the image does not exist or has been soft-deleted
/// * `Err(Error)` - If a database error occurs
pub fn update_image(
    conn: &Connection,
    id: ImageId,
    filename: &str,
    filepath: &str,
) -> Result<Option<Image>> {
    conn.query_row(
        &format!(
            "UPDATE images SET filename = :filename, filepath = :filepath, updated_at = :now WHERE id = :id AND deleted_at IS NULL RETURNING {}",
            IMAGE_SELECT_COLUMNS
        ),
        rusqlite::named_params! {
            ":id": id.get(),
            ":filename": filename,
            ":filepath": filepath,
            ":now": Utc::now().to_rfc3339(),
        },
        parse_image_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Soft-delete an image by stamping `deleted_at`.
///
/// The row stays in the table. An image that is already deleted is treated
/// like a missing one.
///
/// # Returns
///
/// * `Ok(true)` - If the image was active and is now deleted
/// * `Ok(false)` - If the image did not exist or was already deleted
/// * `Err(Error)` - If a database error occurs
pub fn soft_delete_image(conn: &Connection, id: ImageId) -> Result<bool> {
    let rows_affected = conn
        .execute(
            "UPDATE images SET deleted_at = :now, updated_at = :now
             WHERE id = :id AND deleted_at IS NULL",
            rusqlite::named_params! {
                ":id": id.get(),
                ":now": Utc::now().to_rfc3339(),
            },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;
    use crate::pool::{get_conn, init_memory_pool, DbPool};

    fn migrated_pool() -> DbPool {
        let pool = init_memory_pool().unwrap();
        run_migrations(&get_conn(&pool).unwrap()).unwrap();
        pool
    }

    #[test]
    fn test_insert_image() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();

        let image = insert_image(&conn, "a.png", "/imgs/a.png").unwrap();
        assert_eq!(image.filename, "a.png");
        assert_eq!(image.filepath, "/imgs/a.png");
        assert_eq!(image.created_at, image.updated_at);
        assert!(image.deleted_at.is_none());
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();

        let first = insert_image(&conn, "a.png", "a.png").unwrap();
        let second = insert_image(&conn, "a.png", "a.png").unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn test_get_image() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();

        let created = insert_image(&conn, "b.jpg", "uploads/b.jpg").unwrap();
        let found = get_image(&conn, created.id).unwrap().unwrap();
        assert_eq!(found, created);
    }

    #[test]
    fn test_get_image_not_found() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();

        assert!(get_image(&conn, ImageId::from(999)).unwrap().is_none());
    }

    #[test]
    fn test_soft_delete_hides_row() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();

        let created = insert_image(&conn, "c.png", "/imgs/c.png").unwrap();
        assert!(soft_delete_image(&conn, created.id).unwrap());

        assert!(get_image(&conn, created.id).unwrap().is_none());

        let raw = get_image_unscoped(&conn, created.id).unwrap().unwrap();
        assert!(raw.deleted_at.is_some());
        assert_eq!(raw.deleted_at, Some(raw.updated_at));
        assert_eq!(raw.created_at, created.created_at);
    }

    #[test]
    fn test_soft_delete_twice() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();

        let created = insert_image(&conn, "d.png", "d.png").unwrap();
        assert!(soft_delete_image(&conn, created.id).unwrap());
        let first = get_image_unscoped(&conn, created.id).unwrap().unwrap();

        assert!(!soft_delete_image(&conn, created.id).unwrap());
        let second = get_image_unscoped(&conn, created.id).unwrap().unwrap();
        assert_eq!(first.deleted_at, second.deleted_at);
    }

    #[test]
    fn test_soft_delete_not_found() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();

        assert!(!soft_delete_image(&conn, ImageId::from(42)).unwrap());
    }

    #[test]
    fn test_update_image() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();

        let created = insert_image(&conn, "e.png", "tmp/e.png").unwrap();
        let updated = update_image(&conn, created.id, "e-final.png", "imgs/e-final.png")
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.filename, "e-final.png");
        assert_eq!(updated.filepath, "imgs/e-final.png");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[test]
    fn test_update_deleted_image() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();

        let created = insert_image(&conn, "f.png", "f.png").unwrap();
        soft_delete_image(&conn, created.id).unwrap();

        assert!(update_image(&conn, created.id, "g.png", "g.png")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_duplicate_filenames_allowed() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();

        let a = insert_image(&conn, "same.png", "one/same.png").unwrap();
        let b = insert_image(&conn, "same.png", "two/same.png").unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_corrupt_timestamp_is_database_error() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();

        conn.execute(
            "INSERT INTO images (created_at, updated_at, filename, filepath)
             VALUES ('yesterday', 'yesterday', 'x.png', 'x.png')",
            [],
        )
        .unwrap();
        let id = ImageId::from(conn.last_insert_rowid());

        let err = get_image(&conn, id).unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }
}
