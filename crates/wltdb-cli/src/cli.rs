//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use time::Date;

use crate::util::parse_date;

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "wltdb")]
#[command(author, version, about = "Wireless temperature logger database", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file to use instead of the default location
    #[arg(long, global = true, env = "WLTDB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database file, overrides `db_path` from the configuration
    #[arg(long, global = true, env = "WLTDB_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import logger export files into the database
    Ingest {
        /// Log files or directories (defaults to the configured log directory)
        paths: Vec<PathBuf>,

        /// Move each ingested file into the backup directory
        #[arg(short, long)]
        backup: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List device ids known to the database
    Devices {
        /// Only devices that are not yet report columns
        #[arg(short, long)]
        new: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Write the pivoted CSV report
    Report {
        /// First day (YYYY-MM-DD), defaults to `report_day_range` days before --to
        #[arg(long, value_parser = parse_date)]
        from: Option<Date>,

        /// Last day (YYYY-MM-DD), defaults to today
        #[arg(long, value_parser = parse_date)]
        to: Option<Date>,

        /// Output file, defaults to the configured report directory and file name
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output text encoding label (e.g. windows-1252, shift_jis, utf-8)
        #[arg(short, long)]
        encoding: Option<String>,

        /// Output format for the summary
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Manage report columns (device aliases)
    Alias {
        #[command(subcommand)]
        action: AliasAction,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show database location and statistics
    Info {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Subcommand)]
pub enum AliasAction {
    /// List report columns in order
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Append devices as report columns, titled with their id
    Add {
        /// Device ids
        #[arg(required = true)]
        device_ids: Vec<String>,
    },
    /// Set the column title of a device
    Set { device_id: String, alias: String },
    /// Remove a device from the report
    Remove { device_id: String },
    /// Move a column one place to the left
    Up { device_id: String },
    /// Move a column one place to the right
    Down { device_id: String },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file and create its directories
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
