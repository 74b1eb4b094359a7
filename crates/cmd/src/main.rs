// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use cmd::commands;
use cmd::common::{DEFAULT_CATALOG_DB, ShipContext};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "deltabridge")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// DuckDB catalog database
    #[arg(long, global = true, default_value = DEFAULT_CATALOG_DB)]
    catalog_db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a CSV file as a table and register it
    Write {
        namespace: String,
        table: String,
        /// CSV file with a header row
        csv: PathBuf,
    },
    /// Print a table's current contents
    Read {
        namespace: String,
        table: String,
        /// Comma-separated columns to keep
        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,
    },
    /// List registered tables
    Registry,
}

#[tokio::main]
async fn main() -> Result<()> {
    diagnostics::init_diagnostics();

    let cli = Cli::parse();
    let ship = ShipContext::new(
        cli.config.as_deref(),
        cli.catalog_db,
        std::env::current_dir()?,
    )?;

    let output = match cli.command {
        Commands::Write {
            namespace,
            table,
            csv,
        } => commands::write_command(&ship, &namespace, &table, &csv).await?,
        Commands::Read {
            namespace,
            table,
            columns,
        } => commands::read_command(&ship, &namespace, &table, columns).await?,
        Commands::Registry => commands::registry_command(&ship)?,
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
