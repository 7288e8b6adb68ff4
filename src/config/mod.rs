mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Environment variables read once at startup. They take precedence over
/// the config file.
pub const ENV_DB_HOST: &str = "POSTGRES_HOST";
pub const ENV_DB_USER: &str = "POSTGRES_USER";
pub const ENV_DB_PASSWORD: &str = "POSTGRES_PASSWORD";
pub const ENV_DB_NAME: &str = "POSTGRES_DB";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./casecraft.toml",
        "~/.config/casecraft/config.toml",
        "/etc/casecraft/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// The configuration the process runs with: the config file (or defaults)
/// with `POSTGRES_*` variables applied on top. Not validated.
pub fn load_effective_config(custom_path: Option<&Path>) -> Result<Config> {
    let mut config = load_config_or_default(custom_path)?;

    let applied = apply_env_overrides(&mut config);
    if !applied.is_empty() {
        tracing::debug!("Database settings from environment: {}", applied.join(", "));
    }

    Ok(config)
}

/// Apply `POSTGRES_*` variables from the process environment.
///
/// Returns the names of the variables that were set.
pub fn apply_env_overrides(config: &mut Config) -> Vec<&'static str> {
    apply_env_overrides_with(config, |key| std::env::var(key).ok())
}

/// Apply database overrides from an arbitrary lookup. A variable that is set
/// overrides the file value even when empty.
pub fn apply_env_overrides_with<F>(config: &mut Config, lookup: F) -> Vec<&'static str>
where
    F: Fn(&str) -> Option<String>,
{
    let db = &mut config.database;
    let targets: [(&'static str, &mut String); 4] = [
        (ENV_DB_HOST, &mut db.host),
        (ENV_DB_USER, &mut db.user),
        (ENV_DB_PASSWORD, &mut db.password),
        (ENV_DB_NAME, &mut db.dbname),
    ];

    let mut applied = Vec::new();
    for (key, field) in targets {
        if let Some(value) = lookup(key) {
            *field = value;
            applied.push(key);
        }
    }
    applied
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    let index = &config.server.index_file;
    if index.is_empty() || index.contains('/') || index.contains('\\') {
        anyhow::bail!("Index file must be a plain file name, got {:?}", index);
    }

    if !config.server.static_dir.is_dir() {
        tracing::warn!(
            "Static directory does not exist: {:?}",
            config.server.static_dir
        );
    }

    if config.database.pool_size == 0 {
        anyhow::bail!("Database pool size must be at least 1");
    }

    match config.database.backend {
        DatabaseBackend::Postgres => {
            if config.database.host.is_empty() {
                anyhow::bail!("Database host cannot be empty (set {})", ENV_DB_HOST);
            }
            if config.database.port == 0 {
                anyhow::bail!("Database port cannot be 0");
            }
        }
        DatabaseBackend::Sqlite => {
            if config.database.sqlite_path.as_os_str().is_empty() {
                anyhow::bail!("sqlite_path cannot be empty");
            }
        }
    }

    Ok(())
}
