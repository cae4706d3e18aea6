//! Alias command implementation.
//!
//! The alias list is the ordered set of report columns: which devices appear
//! in the report, in which order, and under which title.

use std::path::Path;

use anyhow::{Context, Result};
use tabled::{builder::Builder, settings::Style};
use wltdb_types::{AliasError, AliasList};

use crate::cli::{AliasAction, OutputFormat};
use crate::config::Config;

pub fn cmd_alias(action: AliasAction, config_path: &Path, quiet: bool) -> Result<()> {
    let mut config = Config::load(config_path);

    if let AliasAction::List { format } = action {
        return list_aliases(&config.aliases, format);
    }

    let message = apply(&mut config.aliases, action)?;
    config.save(config_path)?;
    if !quiet {
        println!("{}", message);
    }

    Ok(())
}

fn list_aliases(aliases: &AliasList, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(aliases)?);
        }
        OutputFormat::Text => {
            if aliases.is_empty() {
                println!("No report columns configured.");
                println!();
                println!("Add one with: wltdb alias add <DEVICE>");
                return Ok(());
            }

            let mut builder = Builder::default();
            builder.push_record(["#", "Device", "Alias"]);
            for (index, alias) in aliases.iter().enumerate() {
                builder.push_record([
                    (index + 1).to_string(),
                    alias.device_id.clone(),
                    alias.alias.clone(),
                ]);
            }
            let mut table = builder.build();
            table.with(Style::rounded());
            println!("{}", table);
        }
    }
    Ok(())
}

/// Apply an editing action, returning a one-line description of the change.
fn apply(aliases: &mut AliasList, action: AliasAction) -> Result<String> {
    let message = match action {
        AliasAction::List { .. } => String::new(),
        AliasAction::Add { device_ids } => {
            let mut added = Vec::new();
            for id in device_ids {
                match aliases.add(&id) {
                    Ok(()) => added.push(id),
                    Err(AliasError::AlreadyPresent(id)) => {
                        tracing::warn!("'{}' is already a report column", id);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            if added.is_empty() {
                "No columns added".to_string()
            } else {
                format!("Added {}", added.join(", "))
            }
        }
        AliasAction::Set { device_id, alias } => {
            aliases
                .rename(&device_id, &alias)
                .with_context(|| format!("Cannot set alias of '{}'", device_id))?;
            format!("Set alias of '{}' to '{}'", device_id, alias.trim())
        }
        AliasAction::Remove { device_id } => {
            let removed = aliases.remove(&device_id)?;
            format!("Removed '{}' ({})", removed.device_id, removed.alias)
        }
        AliasAction::Up { device_id } => {
            if aliases.move_up(&device_id)? {
                format!("Moved '{}' up", device_id)
            } else {
                format!("'{}' is already the first column", device_id)
            }
        }
        AliasAction::Down { device_id } => {
            if aliases.move_down(&device_id)? {
                format!("Moved '{}' down", device_id)
            } else {
                format!("'{}' is already the last column", device_id)
            }
        }
    };
    Ok(message)
}
