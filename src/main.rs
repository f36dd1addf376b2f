// ABOUTME: CLI entry point for postgres-schema-drift
// ABOUTME: Parses commands and routes to appropriate handlers

use clap::{Parser, Subcommand};
use postgres_schema_drift::commands;
use postgres_schema_drift::config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "postgres-schema-drift")]
#[command(
    about = "Detect drift between an expected PostgreSQL schema and a live database",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Path to schema-drift.toml (defaults to ./schema-drift.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare the expected schema with the target database (exit code 1 on drift)
    Check {
        /// Connection string of a reference database, or path to a tbls JSON document
        #[arg(long)]
        expected: String,
        #[arg(long)]
        target: String,
    },
    /// Print the normalized schema of a database as JSON
    Inspect {
        #[arg(long)]
        target: String,
    },
    /// Check that tbls is installed and the target database is reachable
    Validate {
        #[arg(long)]
        target: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Check { expected, target } => {
            let differences = commands::check(&expected, &target, &config).await?;
            if !differences.is_empty() {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Inspect { target } => commands::inspect(&target, &config).await,
        Commands::Validate { target } => commands::validate(&target, &config).await,
    }
}
