//! Devices command - list device ids found in the database.

use anyhow::Result;
use tabled::{builder::Builder, settings::Style};
use wltdb_store::Store;

use crate::cli::OutputFormat;
use crate::config::Config;

/// Execute the devices command.
pub fn cmd_devices(store: &Store, new_only: bool, format: OutputFormat, config: &Config) -> Result<()> {
    let devices: Vec<(String, Option<&str>)> = store
        .distinct_device_ids()?
        .into_iter()
        .map(|id| {
            let alias = config.aliases.get(&id);
            (id, alias)
        })
        .filter(|(_, alias)| !new_only || alias.is_none())
        .collect();

    match format {
        OutputFormat::Json => {
            let result: Vec<_> = devices
                .iter()
                .map(|(id, alias)| serde_json::json!({ "device_id": id, "alias": alias }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => {
            if devices.is_empty() {
                if new_only {
                    println!("No new devices.");
                } else {
                    println!("No devices in database. Run 'wltdb ingest' to import logs.");
                }
                return Ok(());
            }

            let mut builder = Builder::default();
            builder.push_record(["Device", "Alias"]);
            for (id, alias) in &devices {
                builder.push_record([id.as_str(), alias.unwrap_or("-")]);
            }
            let mut table = builder.build();
            table.with(Style::rounded());
            println!("{}", table);

            if new_only {
                println!();
                println!("Add them as report columns with: wltdb alias add <DEVICE>...");
            }
        }
    }

    Ok(())
}
