//! Backend-neutral handle to the image metadata store.
//!
//! The process builds one store at startup and shares it as a
//! [`SharedStore`]. Every backend is pool-backed, so a handle can be used
//! from many requests at once. Methods block; async callers should run them
//! on `tokio::task::spawn_blocking`.

use std::sync::Arc;

use casecraft_common::{Error, ImageId, Result};

use crate::migrations::{run_migrations, MigrationReport};
use crate::models::Image;
use crate::pool::{get_conn, init_memory_pool, init_pool, DbPool};
use crate::queries::images;

/// Operations on image metadata.
pub trait ImageStore: Send + Sync {
    /// Short backend name for logs ("sqlite", "postgres").
    fn backend_name(&self) -> &'static str;

    /// Ensure the `images` table exists with every required column.
    ///
    /// Additive and idempotent: a second call reports no changes.
    fn migrate(&self) -> Result<MigrationReport>;

    /// Insert a new record and return it as stored.
    fn create_image(&self, filename: &str, filepath: &str) -> Result<Image>;

    /// Fetch an active record. Soft-deleted rows are `NotFound`.
    fn get_image(&self, id: ImageId) -> Result<Image>;

    /// Fetch a record even if it has been soft-deleted.
    fn get_image_unscoped(&self, id: ImageId) -> Result<Image>;

    /// Rewrite filename and filepath of an active record.
    fn update_image(&self, id: ImageId, filename: &str, filepath: &str) -> Result<Image>;

    /// Mark an active record as deleted. Unknown and already-deleted ids are
    /// `NotFound`.
    fn soft_delete_image(&self, id: ImageId) -> Result<()>;
}

/// Store handle shared between the components of the process.
pub type SharedStore = Arc<dyn ImageStore>;

pub(crate) fn image_not_found(id: ImageId) -> Error {
    Error::not_found(format!("image {}", id))
}

/// SQLite-backed store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    /// Open (or create) a database file.
    pub fn open(path: &str, pool_size: u32) -> Result<Self> {
        let pool = init_pool(path, pool_size)?;
        tracing::debug!("Opened SQLite database at {}", path);
        Ok(Self { pool })
    }

    /// Fresh in-memory database; nothing is migrated yet.
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            pool: init_memory_pool()?,
        })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl ImageStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn migrate(&self) -> Result<MigrationReport> {
        let conn = get_conn(&self.pool)?;
        Ok(run_migrations(&conn)?)
    }

    fn create_image(&self, filename: &str, filepath: &str) -> Result<Image> {
        let conn = get_conn(&self.pool)?;
        let image = images::insert_image(&conn, filename, filepath)?;
        tracing::debug!(id = %image.id, filename, "Created image record");
        Ok(image)
    }

    fn get_image(&self, id: ImageId) -> Result<Image> {
        let conn = get_conn(&self.pool)?;
        images::get_image(&conn, id)?.ok_or_else(|| image_not_found(id))
    }

    fn get_image_unscoped(&self, id: ImageId) -> Result<Image> {
        let conn = get_conn(&self.pool)?;
        images::get_image_unscoped(&conn, id)?.ok_or_else(|| image_not_found(id))
    }

    fn update_image(&self, id: ImageId, filename: &str, filepath: &str) -> Result<Image> {
        let conn = get_conn(&self.pool)?;
        images::update_image(&conn, id, filename, filepath)?.ok_or_else(|| image_not_found(id))
    }

    fn soft_delete_image(&self, id: ImageId) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        if images::soft_delete_image(&conn, id)? {
            tracing::debug!(id = %id, "Soft-deleted image record");
            Ok(())
        } else {
            Err(image_not_found(id))
        }
    }
}
