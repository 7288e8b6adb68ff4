use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "casecraft")]
#[command(author, version, about = "Phone case designer frontend server and image store")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to the database, migrate it, and serve the frontend
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory to serve (overrides config)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Bring the database schema up to date and exit
    Migrate,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_start_overrides() {
        let cli = Cli::try_parse_from([
            "casecraft",
            "start",
            "--port",
            "9000",
            "--static-dir",
            "/srv/www",
        ])
        .unwrap();

        match cli.command {
            Commands::Start {
                host,
                port,
                static_dir,
            } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(9000));
                assert_eq!(static_dir, Some(PathBuf::from("/srv/www")));
            }
            _ => panic!("expected start"),
        }
    }

    #[test]
    fn parse_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["casecraft", "migrate", "--config", "c.toml", "-v"]).unwrap();
        assert!(matches!(cli.command, Commands::Migrate));
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
        assert!(cli.verbose);
    }
}
