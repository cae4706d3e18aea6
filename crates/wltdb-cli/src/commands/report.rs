//! Report command - write the pivoted CSV report.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use time::Date;
use tracing::{debug, warn};
use wltdb_store::{ReportSummary, Store, report};
use wltdb_types::DateWindow;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::util::today;

/// Arguments for the report command.
pub struct ReportArgs {
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub output: Option<PathBuf>,
    pub encoding: Option<String>,
    pub format: OutputFormat,
}

/// Resolve the report window from the arguments and the configured day range.
pub fn resolve_window(from: Option<Date>, to: Option<Date>, day_range: u32) -> Result<DateWindow> {
    let to = to.unwrap_or_else(today);
    let from = from.unwrap_or_else(|| DateWindow::ending_at(to, day_range).from());
    DateWindow::new(from, to).context("Invalid report window")
}

/// Days between the first and last day of `window`.
pub fn day_range(window: &DateWindow) -> u32 {
    let days = (window.to() - window.from()).whole_days();
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// Store the day range of an explicit window as the new default.
fn remember_day_range(config: &Config, config_path: &Path, window: &DateWindow) {
    let days = day_range(window);
    if days == config.report_day_range {
        return;
    }

    let mut updated = config.clone();
    updated.report_day_range = days;
    match updated.save(config_path) {
        Ok(()) => debug!("Saved report_day_range = {}", days),
        Err(e) => warn!("Failed to save report day range: {:#}", e),
    }
}

/// Execute the report command.
///
/// When both `--from` and `--to` are given, the width of that window becomes
/// the configured `report_day_range`.
pub async fn cmd_report(
    args: ReportArgs,
    config: &Config,
    config_path: &Path,
    db_path: &Path,
    quiet: bool,
) -> Result<()> {
    let explicit = args.from.is_some() && args.to.is_some();
    let window = resolve_window(args.from, args.to, config.report_day_range)?;
    let options = config.report_options(args.encoding.as_deref())?;

    let path = match args.output {
        Some(path) => path,
        None => {
            fs::create_dir_all(&config.report_directory).with_context(|| {
                format!(
                    "Failed to create report directory: {}",
                    config.report_directory.display()
                )
            })?;
            config.report_path()
        }
    };

    if config.aliases.is_empty() {
        warn!("No report columns configured. Add some with 'wltdb alias add <DEVICE>'");
    }

    let aliases = config.aliases.clone();
    let db_path = db_path.to_path_buf();
    let summary = tokio::task::spawn_blocking(move || -> Result<ReportSummary> {
        let store = Store::open(&db_path).context("Failed to open database")?;
        let summary = report::generate_report(&store, &window, &aliases, &path, &options)
            .context("Failed to generate report")?;
        store.close().context("Failed to close database")?;
        Ok(summary)
    })
    .await
    .context("Report worker panicked")??;

    if explicit {
        remember_day_range(config, config_path, &window);
    }

    match args.format {
        OutputFormat::Json => {
            let result = serde_json::json!({
                "from": window.from().to_string(),
                "to": window.to().to_string(),
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text if !quiet => {
            let path = summary
                .path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            println!(
                "Wrote {} rows x {} columns for {} to {}",
                summary.rows, summary.columns, window, path
            );
        }
        OutputFormat::Text => {}
    }

    Ok(())
}
