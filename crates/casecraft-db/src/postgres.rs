//! PostgreSQL backend.
//!
//! Connections are pooled with r2d2. TLS is not negotiated (`sslmode=disable`
//! semantics); put the database on a trusted network or terminate TLS in
//! front of it.

use std::fmt;

use ::postgres::config::SslMode;
use ::postgres::{Config, NoTls, Row};
use casecraft_common::{Error, ImageId, Result};
use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_postgres::PostgresConnectionManager;

use crate::migrations::{self, MigrationReport};
use crate::models::Image;
use crate::schema::IMAGE_SELECT_COLUMNS;
use crate::pool::DEFAULT_POOL_SIZE;
use crate::store::{image_not_found, ImageStore};

/// Conventional PostgreSQL port.
pub const DEFAULT_PORT: u16 = 5432;

/// Type alias for the PostgreSQL connection pool.
pub type PgPool = Pool<PostgresConnectionManager<NoTls>>;

/// Parameters needed to reach the database.
#[derive(Clone, PartialEq, Eq)]
pub struct PgConnectOptions {
    pub host: String,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub port: u16,
    pub pool_size: u32,
}

impl Default for PgConnectOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            dbname: "postgres".to_string(),
            port: DEFAULT_PORT,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

// Keeps the password out of logs.
impl fmt::Debug for PgConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConnectOptions")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .field("port", &self.port)
            .field("pool_size", &self.pool_size)
            .finish()
    }
}

impl PgConnectOptions {
    pub fn to_config(&self) -> Config {
        let mut config = Config::new();
        config
            .host(&self.host)
            .user(&self.user)
            .dbname(&self.dbname)
            .port(self.port)
            .ssl_mode(SslMode::Disable)
            .application_name("casecraft");
        if !self.password.is_empty() {
            config.password(&self.password);
        }
        config
    }

    /// `host:port/dbname` for log lines.
    pub fn display_target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.dbname)
    }
}

fn parse_image_row(row: &Row) -> std::result::Result<Image, ::postgres::Error> {
    Ok(Image {
        id: ImageId::from(row.try_get::<_, i64>("id")?),
        created_at: row.try_get::<_, DateTime<Utc>>("created_at")?,
        updated_at: row.try_get::<_, DateTime<Utc>>("updated_at")?,
        deleted_at: row.try_get::<_, Option<DateTime<Utc>>>("deleted_at")?,
        filename: row.try_get("filename")?,
        filepath: row.try_get("filepath")?,
    })
}

fn db_error(e: ::postgres::Error) -> Error {
    Error::database(e.to_string())
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Build the connection pool.
    ///
    /// The pool opens its connections eagerly, so unreachable hosts and bad
    /// credentials surface here as [`Error::Connection`]. There is no retry.
    pub fn connect(options: &PgConnectOptions) -> Result<Self> {
        let manager = PostgresConnectionManager::new(options.to_config(), NoTls);

        let pool = Pool::builder()
            .max_size(options.pool_size)
            .build(manager)
            .map_err(|e| {
                Error::connection(format!(
                    "Failed to connect to PostgreSQL at {}: {}",
                    options.display_target(),
                    e
                ))
            })?;

        tracing::debug!("Connected to PostgreSQL at {}", options.display_target());
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn conn(&self) -> Result<r2d2::PooledConnection<PostgresConnectionManager<NoTls>>> {
        self.pool
            .get()
            .map_err(|e| Error::database(format!("Failed to get connection from pool: {}", e)))
    }
}

impl ImageStore for PgStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    fn migrate(&self) -> Result<MigrationReport> {
        let mut conn = self.conn()?;
        Ok(migrations::postgres::run_migrations(&mut conn)?)
    }

    fn create_image(&self, filename: &str, filepath: &str) -> Result<Image> {
        let mut conn = self.conn()?;
        let now = Utc::now();
        let row = conn
            .query_one(
                format!(
                    "INSERT INTO images (created_at, updated_at, deleted_at, filename, filepath) VALUES ($1, $1, NULL, $2, $3) RETURNING {}",
                    IMAGE_SELECT_COLUMNS
                ).as_str(),
                &[&now, &filename, &filepath],
            )
            .map_err(db_error)?;

        let image = parse_image_row(&row).map_err(db_error)?;
        tracing::debug!(id = %image.id, filename, "Created image record");
        Ok(image)
    }

    fn get_image(&self, id: ImageId) -> Result<Image> {
        let mut conn = self.conn()?;
        let row = conn
            .query_opt(
                format!(
                    "SELECT {} FROM images WHERE id = $1 AND deleted_at IS NULL",
                    IMAGE_SELECT_COLUMNS
                ).as_str(),
                &[&id.get()],
            )
            .map_err(db_error)?
            .ok_or_else(|| image_not_found(id))?;

        parse_image_row(&row).map_err(db_error)
    }

    fn get_image_unscoped(&self, id: ImageId) -> Result<Image> {
        let mut conn = self.conn()?;
        let row = conn
            .query_opt(
                format!(
                    "SELECT {} FROM images WHERE id = $1",
                    IMAGE_SELECT_COLUMNS
                ).as_str(),
                &[&id.get()],
            )
            .map_err(db_error)?
            .ok_or_else(|| image_not_found(id))?;

        parse_image_row(&row).map_err(db_error)
    }

    fn update_image(&self, id: ImageId, filename: &str, filepath: &str) -> Result<Image> {
        let mut conn = self.conn()?;
        let row = conn
            .query_opt(
                format!(
                    "UPDATE images SET filename = $2, filepath = $3, updated_at = $4 WHERE id = $1 AND deleted_at IS NULL RETURNING {}",
                    IMAGE_SELECT_COLUMNS
                ).as_str(),
                &[&id.get(), &filename, &filepath, &Utc::now()],
            )
            .map_err(db_error)?
            .ok_or_else(|| image_not_found(id))?;

        parse_image_row(&row).map_err(db_error)
    }

    fn soft_delete_image(&self, id: ImageId) -> Result<()> {
        let mut conn = self.conn()?;
        let rows_affected = conn
            .execute(
                "UPDATE images SET deleted_at = $2, updated_at = $2
                 WHERE id = $1 AND deleted_at IS NULL",
                &[&id.get(), &Utc::now()],
            )
            .map_err(db_error)?;

        if rows_affected == 0 {
            return Err(image_not_found(id));
        }

        tracing::debug!(id = %id, "Soft-deleted image record");
        Ok(())
    }
}
