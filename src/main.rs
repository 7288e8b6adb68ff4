mod cli;

use casecraft::{
    config::{self, Config, DatabaseBackend},
    database,
    server::{self, AppContext},
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn start(
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
    static_dir: Option<PathBuf>,
) -> Result<()> {
    let mut config = config::load_effective_config(config_path)?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(dir) = static_dir {
        config.server.static_dir = dir;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting Casecraft");

    // The database clients block, so the store is opened before the runtime
    // exists and is dropped after it.
    let (store, _) = database::connect_and_migrate(&config.database)
        .context("Failed to initialize image store")?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(server::start_server(AppContext::new(config, store.clone())))
}

fn migrate(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_effective_config(config_path)?;
    config::validate_config(&config)?;

    let (store, report) = database::connect_and_migrate(&config.database)
        .context("Failed to migrate image store")?;

    println!("{} ({})", report, store.backend_name());
    Ok(())
}

fn validate(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => println!("Validating config: {:?}", p),
        None => println!("No config file specified, searching default locations"),
    }

    let config = config::load_effective_config(path)?;
    config::validate_config(&config)?;
    println!("✓ Configuration is valid");
    print_summary(&config);

    Ok(())
}

fn print_summary(config: &Config) {
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Static dir: {:?}", config.server.static_dir);
    println!("  Directory listing: {}", config.server.directory_listing);
    println!("  Database backend: {}", config.database.backend);
    match config.database.backend {
        DatabaseBackend::Postgres => println!(
            "  Database: {}",
            config.database.pg_options().display_target()
        ),
        DatabaseBackend::Sqlite => {
            println!("  Database: {:?}", config.database.sqlite_path)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Start {
            host,
            port,
            static_dir,
        } => start(cli.config.as_deref(), host, port, static_dir),
        Commands::Migrate => migrate(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate(path.as_deref())
        }
        Commands::Version => {
            println!("casecraft {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "casecraft=trace,casecraft_db=debug,casecraft_common=debug,tower_http=debug".to_string()
        } else {
            "casecraft=info,casecraft_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt().with_env_filter(&env_filter).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
