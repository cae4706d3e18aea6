//! Command-line interface for wireless temperature logger data.
//!
//! The `wltdb` binary imports logger export files into a local SQLite
//! database and writes a pivoted CSV report with one column per configured
//! device.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ingest` | Import `*.log` exports, optionally moving them to a backup directory |
//! | `devices` | List device ids in the database |
//! | `report` | Write the CSV report for a date window |
//! | `alias` | Choose, order and title the report columns |
//! | `config` | Show, locate or initialize the configuration file |
//! | `info` | Database location and statistics |
//! | `completions` | Generate shell completions |
//!
//! # Configuration
//!
//! Settings live in `~/.config/wltdb/config.toml` (or platform equivalent),
//! overridable with `--config` or `WLTDB_CONFIG`:
//!
//! ```toml
//! report_day_range = 3
//! report_filename = "Temperature.csv"
//!
//! [report]
//! encoding = "windows-1252"
//! line_ending = "native"
//!
//! [[aliases]]
//! device_id = "SENSOR1"
//! alias = "Living Room"
//! ```
//!
//! # Examples
//!
//! ```bash
//! wltdb ingest ~/Downloads/logs --backup
//! wltdb devices --new
//! wltdb alias add SENSOR1
//! wltdb alias set SENSOR1 "Living Room"
//! wltdb report --from 2024-01-01 --to 2024-01-07
//! ```

use std::io;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;
use wltdb_store::Store;

mod cli;
mod commands;
mod config;
mod util;

use cli::{Cli, Commands};
use commands::{
    IngestArgs, ReportArgs, cmd_alias, cmd_config, cmd_devices, cmd_info, cmd_ingest, cmd_report,
};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "wltdb", &mut io::stdout());
        return Ok(());
    }

    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path);
    let db_path = config.db_path(cli.db.as_deref());

    match cli.command {
        Commands::Ingest {
            paths,
            backup,
            format,
        } => {
            let args = IngestArgs {
                paths,
                backup,
                format,
            };
            cmd_ingest(args, &config, &db_path, cli.quiet).await?;
        }
        Commands::Devices { new, format } => {
            let store = Store::open(&db_path).context("Failed to open database")?;
            cmd_devices(&store, new, format, &config)?;
            store.close().context("Failed to close database")?;
        }
        Commands::Report {
            from,
            to,
            output,
            encoding,
            format,
        } => {
            let args = ReportArgs {
                from,
                to,
                output,
                encoding,
                format,
            };
            cmd_report(args, &config, &config_path, &db_path, cli.quiet).await?;
        }
        Commands::Alias { action } => cmd_alias(action, &config_path, cli.quiet)?,
        Commands::Config { action } => cmd_config(action, &config_path, cli.quiet)?,
        Commands::Info { format } => cmd_info(&db_path, &config_path, format)?,
        Commands::Completions { .. } => unreachable!("handled before tracing init"),
    }

    Ok(())
}
