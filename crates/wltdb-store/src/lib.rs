//! Local storage and reporting for temperature logger readings.
//!
//! This crate keeps every reading exactly once per `(device, timestamp)` in a
//! single SQLite file and turns stored readings into pivoted CSV reports.
//!
//! # Features
//!
//! - Idempotent upsert: re-ingesting a file never duplicates rows
//! - Batch ingest of logger exports with per-file failure isolation
//! - Dense pivot over a date window with ordered, aliased columns
//! - Configurable legacy text encoding for spreadsheet compatibility
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use wltdb_store::{IngestOptions, ReportOptions, Store, report};
//! use wltdb_types::{AliasList, DateWindow};
//!
//! let store = Store::open_default()?;
//! let summary = store.ingest(&[Path::new("logs/0001.log")], &IngestOptions::default())?;
//! println!("{} readings", summary.total_readings());
//!
//! let mut aliases = AliasList::new();
//! aliases.add("SENSOR1")?;
//! aliases.rename("SENSOR1", "Living Room")?;
//!
//! let window = DateWindow::day(time::macros::date!(2024 - 01 - 01));
//! report::generate_report(&store, &window, &aliases, Path::new("Temperature.csv"), &ReportOptions::default())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
pub mod ingest;
mod models;
mod queries;
pub mod report;
mod schema;
mod store;

pub use encoding_rs::Encoding;
pub use error::{Error, Result};
pub use ingest::{FileOutcome, IngestOptions, IngestSummary, ProgressCallback};
pub use models::{PivotRow, StoreStats};
pub use queries::{PivotQuery, TimestampUniverse};
pub use report::{LineEnding, ReportOptions, ReportSummary};
pub use store::Store;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/wltdb/wltdb.db3`
/// - macOS: `~/Library/Application Support/wltdb/wltdb.db3`
/// - Windows: `C:\Users\<user>\AppData\Local\wltdb\wltdb.db3`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("wltdb")
        .join("wltdb.db3")
}

/// Look up a text encoding by its WHATWG label (`"windows-1252"`, `"shift_jis"`, ...).
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| Error::UnknownEncoding(label.to_string()))
}
