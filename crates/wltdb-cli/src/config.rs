//! Configuration file management.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;
use wltdb_store::report::check_output_encoding;
use wltdb_store::{LineEnding, ReportOptions, TimestampUniverse, encoding_for_label};
use wltdb_types::{AliasList, DateFormat, Encoding};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Database file (defaults to the platform data directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,

    /// Directory scanned for `*.log` files when `ingest` gets no paths
    #[serde(default = "default_log_directory")]
    pub log_directory: PathBuf,

    /// Where ingested logs are moved with `ingest --backup`
    #[serde(default = "default_backup_directory")]
    pub backup_directory: PathBuf,

    /// Directory the report is written to
    #[serde(default = "default_report_directory")]
    pub report_directory: PathBuf,

    /// Report file name inside `report_directory`
    #[serde(default = "default_report_filename")]
    pub report_filename: String,

    /// Days before today included in the default report window
    #[serde(default = "default_report_day_range")]
    pub report_day_range: u32,

    /// Report output settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Log input settings
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Report columns, in order
    #[serde(default)]
    pub aliases: AliasList,
}

/// `[report]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// WHATWG label of the output encoding
    #[serde(default = "default_report_encoding")]
    pub encoding: String,

    #[serde(default)]
    pub line_ending: LineEnding,

    /// `time` format description of the date part of logger timestamps
    #[serde(default = "default_date_format")]
    pub date_format: String,

    #[serde(default)]
    pub universe: TimestampUniverse,
}

/// `[ingest]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// WHATWG label of the log file encoding
    #[serde(default = "default_log_encoding")]
    pub log_encoding: String,
}

fn base_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wltdb")
}

fn default_log_directory() -> PathBuf {
    base_directory().join("logs")
}

fn default_backup_directory() -> PathBuf {
    default_log_directory().join("backup")
}

fn default_report_directory() -> PathBuf {
    base_directory().join("reports")
}

fn default_report_filename() -> String {
    "Temperature.csv".to_string()
}

fn default_report_day_range() -> u32 {
    3
}

fn default_report_encoding() -> String {
    "windows-1252".to_string()
}

fn default_date_format() -> String {
    DateFormat::DEFAULT_PATTERN.to_string()
}

fn default_log_encoding() -> String {
    "utf-8".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            log_directory: default_log_directory(),
            backup_directory: default_backup_directory(),
            report_directory: default_report_directory(),
            report_filename: default_report_filename(),
            report_day_range: default_report_day_range(),
            report: ReportConfig::default(),
            ingest: IngestConfig::default(),
            aliases: AliasList::new(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            encoding: default_report_encoding(),
            line_ending: LineEnding::default(),
            date_format: default_date_format(),
            universe: TimestampUniverse::default(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            log_encoding: default_log_encoding(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wltdb")
            .join("config.toml")
    }

    /// Load config from file, or return default if not found
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        warn!("Failed to parse config {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Failed to read config {}: {}", path.display(), e);
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Database file, `override_path` taking precedence over the config value
    pub fn db_path(&self, override_path: Option<&Path>) -> PathBuf {
        override_path
            .map(Path::to_path_buf)
            .or_else(|| self.db_path.clone())
            .unwrap_or_else(wltdb_store::default_db_path)
    }

    /// Default report destination
    pub fn report_path(&self) -> PathBuf {
        self.report_directory.join(&self.report_filename)
    }

    /// Encoding of log files
    pub fn log_encoding(&self) -> Result<&'static Encoding> {
        encoding_for_label(&self.ingest.log_encoding).context("Invalid [ingest] log_encoding")
    }

    /// Report options, with an optional encoding label overriding the config
    pub fn report_options(&self, encoding: Option<&str>) -> Result<ReportOptions> {
        let label = encoding.unwrap_or(&self.report.encoding);
        let encoding = encoding_for_label(label).context("Invalid report encoding")?;
        check_output_encoding(encoding).context("Invalid report encoding")?;
        let date_format =
            DateFormat::parse(&self.report.date_format).context("Invalid [report] date_format")?;

        Ok(ReportOptions {
            encoding,
            line_ending: self.report.line_ending,
            universe: self.report.universe,
            date_format,
        })
    }

    /// Create the log, backup and report directories
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            &self.log_directory,
            &self.backup_directory,
            &self.report_directory,
        ] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }
}
