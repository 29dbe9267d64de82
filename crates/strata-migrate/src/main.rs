//! strata-migrate CLI
//!
//! Command-line tool for inspecting the migration version table.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use strata_core::client::ClientConfig;
use strata_migrate::prelude::*;
use strata_migrate::timestamp_version;
use strata_sqlite::SqliteOptions;

/// Versioned, reversible schema migrations.
#[derive(Parser)]
#[command(name = "strata-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL.
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:strata.db")]
    database: String,

    /// Schema holding the version table.
    #[arg(short, long)]
    schema: Option<String>,

    /// Version table name.
    #[arg(short, long)]
    table: Option<String>,

    /// Migration group.
    #[arg(short, long)]
    group: Option<String>,

    /// JSON file with the version table configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the version table.
    Init,

    /// Show applied versions.
    Status {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Print a timestamp version for a new migration.
    NewVersion,
}

#[derive(Serialize)]
struct StatusReport<'a> {
    table: &'a str,
    group: &'a str,
    current_version: i64,
    applied: Vec<i64>,
}

impl Cli {
    fn version_table_config(&self) -> anyhow::Result<VersionTableConfig> {
        let mut config = match self.config {
            Some(ref path) => VersionTableConfig::from_json(&std::fs::read_to_string(path)?)?,
            None => VersionTableConfig::new(),
        };
        if let Some(ref schema) = self.schema {
            config = config.schema(schema);
        }
        if let Some(ref table) = self.table {
            config = config.table_name(table);
        }
        if let Some(ref group) = self.group {
            config = config.group(group);
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if matches!(cli.command, Commands::NewVersion) {
        println!("{}", timestamp_version(Utc::now()));
        return Ok(());
    }

    let config = cli.version_table_config()?;
    let mut client = strata_sqlite::connect(
        &SqliteOptions::new(&cli.database),
        config.schema.clone(),
        ClientConfig::default(),
    )?;
    let repository = VersionRepository::new(config);

    match cli.command {
        Commands::Init => {
            info!("Initializing version table...");
            repository.ensure_version_table(&mut client)?;
            info!(table = %repository.table(&client), "Version table ready.");
        }

        Commands::Status { json } => {
            let applied = repository.applied_versions(&mut client)?;
            let table = repository.table(&client);
            let report = StatusReport {
                table: &table,
                group: repository.group(),
                current_version: applied.last().copied().unwrap_or(0),
                applied: applied.into_iter().collect(),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if report.applied.is_empty() {
                info!(group = %report.group, "No migrations have been applied yet.");
            } else {
                println!("\nApplied versions ({}, group '{}'):", report.table, report.group);
                println!("{:-<60}", "");
                for version in &report.applied {
                    println!(" [X] {version}");
                }
                println!("\nCurrent version: {}\n", report.current_version);
            }
        }

        Commands::NewVersion => {}
    }

    client.close()?;
    Ok(())
}
