//! Info command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use wltdb_store::Store;

use crate::cli::OutputFormat;

pub fn cmd_info(db_path: &Path, config_path: &Path, format: OutputFormat) -> Result<()> {
    let store = Store::open(db_path).context("Failed to open database")?;
    let stats = store.stats()?;
    let size = std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);

    match format {
        OutputFormat::Json => {
            let result = serde_json::json!({
                "database": db_path,
                "size_bytes": size,
                "config": config_path,
                "stats": stats,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => {
            println!("Database: {}", db_path.display());
            println!("  Size: {} bytes", size);
            println!("Config:   {}", config_path.display());
            println!();
            println!("Readings: {}", stats.readings);
            println!("Devices:  {}", stats.devices);
            if let (Some(first), Some(last)) = (&stats.first_timestamp, &stats.last_timestamp) {
                println!("Range:    {} .. {}", first, last);
            }
        }
    }

    store.close().context("Failed to close database")?;
    Ok(())
}
