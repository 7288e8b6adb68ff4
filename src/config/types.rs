use casecraft_db::pool::DEFAULT_POOL_SIZE;
use casecraft_db::postgres::DEFAULT_PORT;
use casecraft_db::PgConnectOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served at `/`. Relative paths resolve against the working
    /// directory of the process.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// File served when a directory is requested
    #[serde(default = "default_index_file")]
    pub index_file: String,

    /// List directory contents when a directory has no index file
    /// (otherwise 404)
    #[serde(default = "default_directory_listing")]
    pub directory_listing: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_static_dir() -> PathBuf {
    PathBuf::from("../")
}
fn default_index_file() -> String {
    "index.html".to_string()
}
fn default_directory_listing() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            index_file: default_index_file(),
            directory_listing: default_directory_listing(),
        }
    }
}

/// Which relational database holds the image metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    Sqlite,
}

impl fmt::Display for DatabaseBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Postgres => write!(f, "postgres"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: DatabaseBackend,

    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_db_name")]
    pub dbname: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Database file used by the sqlite backend
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,
}

fn default_db_host() -> String {
    "localhost".to_string()
}
fn default_db_user() -> String {
    "postgres".to_string()
}
fn default_db_name() -> String {
    "postgres".to_string()
}
fn default_db_port() -> u16 {
    DEFAULT_PORT
}
fn default_pool_size() -> u32 {
    DEFAULT_POOL_SIZE
}
fn default_sqlite_path() -> PathBuf {
    PathBuf::from("casecraft.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::default(),
            host: default_db_host(),
            user: default_db_user(),
            password: String::new(),
            dbname: default_db_name(),
            port: default_db_port(),
            pool_size: default_pool_size(),
            sqlite_path: default_sqlite_path(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .field("port", &self.port)
            .field("pool_size", &self.pool_size)
            .field("sqlite_path", &self.sqlite_path)
            .finish()
    }
}

impl DatabaseConfig {
    pub fn pg_options(&self) -> PgConnectOptions {
        PgConnectOptions {
            host: self.host.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            dbname: self.dbname.clone(),
            port: self.port,
            pool_size: self.pool_size,
        }
    }
}
