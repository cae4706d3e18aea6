//! Utility functions for CLI operations.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// Parse a `YYYY-MM-DD` date argument.
pub fn parse_date(s: &str) -> Result<Date, String> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|e| format!("invalid date '{}' (expected YYYY-MM-DD): {}", s, e))
}

/// Today's date in the local time zone, or UTC when the offset is unknown.
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

fn is_log_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("log"))
}

/// Expand ingest arguments into the list of files to process.
///
/// Directories contribute their top-level `*.log` files (extension matched
/// case-insensitively) in name order; explicit file paths are always taken.
/// A file name seen earlier in the batch, compared case-insensitively, is
/// dropped.
pub fn collect_log_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(path)
                .with_context(|| format!("Failed to read directory: {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| is_log_file(p))
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }

    let mut seen = HashSet::new();
    files.retain(|file| {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_uppercase())
            .unwrap_or_default();
        let keep = seen.insert(name);
        if !keep {
            tracing::debug!("Skipping duplicate file name {}", file.display());
        }
        keep
    });

    Ok(files)
}

/// Move `file` into `backup_dir`, replacing a file of the same name there.
pub fn move_to_backup(file: &Path, backup_dir: &Path) -> io::Result<PathBuf> {
    let name = file
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let target = backup_dir.join(name);
    if target == file {
        return Ok(target);
    }

    fs::create_dir_all(backup_dir)?;
    if target.exists() {
        fs::remove_file(&target)?;
    }

    // rename fails across file systems
    if fs::rename(file, &target).is_err() {
        fs::copy(file, &target)?;
        fs::remove_file(file)?;
    }

    Ok(target)
}
