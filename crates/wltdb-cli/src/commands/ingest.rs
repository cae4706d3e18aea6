//! Ingest command - import logger exports into the database.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result, bail};
use tabled::{builder::Builder, settings::Style};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use wltdb_store::{IngestOptions, IngestSummary, Store};

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::util::{collect_log_files, move_to_backup};

/// Arguments for the ingest command.
pub struct IngestArgs {
    pub paths: Vec<PathBuf>,
    pub backup: bool,
    pub format: OutputFormat,
}

/// Execute the ingest command.
pub async fn cmd_ingest(args: IngestArgs, config: &Config, db_path: &Path, quiet: bool) -> Result<()> {
    let inputs = if args.paths.is_empty() {
        vec![config.log_directory.clone()]
    } else {
        args.paths
    };
    let files = collect_log_files(&inputs)?;
    let encoding = config.log_encoding()?;

    if files.is_empty() && args.format == OutputFormat::Text {
        if !quiet {
            println!("No log files found.");
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping after the current file");
                cancel.cancel();
            }
        })
    };

    let total = files.len();
    let processed = AtomicUsize::new(0);
    let options = IngestOptions::new()
        .encoding(encoding)
        .cancel_token(cancel)
        .with_progress(move |outcome| {
            let n = processed.fetch_add(1, Ordering::Relaxed) + 1;
            info!("[{}/{}] {}", n, total, outcome.path.display());
        });
    let db_path = db_path.to_path_buf();
    let summary = tokio::task::spawn_blocking(move || -> Result<IngestSummary> {
        let store = Store::open(&db_path).context("Failed to open database")?;
        let summary = store.ingest(&files, &options).context("Ingest aborted")?;
        store.close().context("Failed to close database")?;
        Ok(summary)
    })
    .await
    .context("Ingest worker panicked")??;
    ctrl_c.abort();

    let backups: Vec<Option<PathBuf>> = summary
        .files
        .iter()
        .map(|file| {
            if !args.backup || !file.is_ok() {
                return None;
            }
            match move_to_backup(&file.path, &config.backup_directory) {
                Ok(target) => Some(target),
                Err(e) => {
                    warn!("Failed to move {} to backup: {}", file.path.display(), e);
                    None
                }
            }
        })
        .collect();

    match args.format {
        OutputFormat::Json => {
            let files: Vec<_> = summary
                .files
                .iter()
                .zip(&backups)
                .map(|(file, backup)| {
                    serde_json::json!({
                        "path": file.path,
                        "readings": file.readings,
                        "error": file.error.as_ref().map(|e| e.to_string()),
                        "backup": backup,
                    })
                })
                .collect();
            let result = serde_json::json!({
                "files": files,
                "total_readings": summary.total_readings(),
                "cancelled": summary.cancelled,
                "skipped": summary.skipped,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text if !quiet => {
            let mut builder = Builder::default();
            builder.push_record(["File", "Readings", "Status"]);
            for (file, backup) in summary.files.iter().zip(&backups) {
                let status = match (&file.error, backup) {
                    (Some(e), _) => format!("failed: {}", e),
                    (None, Some(target)) => format!("ok, moved to {}", target.display()),
                    (None, None) => "ok".to_string(),
                };
                builder.push_record([
                    file.path.display().to_string(),
                    file.readings.to_string(),
                    status,
                ]);
            }
            let mut table = builder.build();
            table.with(Style::rounded());
            println!("{}", table);
            println!(
                "Ingested {} readings from {} file(s)",
                summary.total_readings(),
                summary.succeeded().count()
            );
        }
        OutputFormat::Text => {}
    }

    if summary.cancelled {
        bail!("Ingest cancelled, {} file(s) not processed", summary.skipped);
    }
    let failed = summary.failed().count();
    if failed > 0 {
        bail!("{} file(s) failed to ingest", failed);
    }

    Ok(())
}
