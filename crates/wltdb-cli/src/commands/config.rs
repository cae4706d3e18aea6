//! Config command - inspect and initialize the configuration file.

use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::cli::ConfigAction;
use crate::config::Config;

pub fn cmd_config(action: ConfigAction, config_path: &Path, quiet: bool) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load(config_path);
            let content = toml::to_string_pretty(&config).context("Failed to serialize config")?;
            print!("{}", content);
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                bail!(
                    "Config file already exists: {} (use --force to overwrite)",
                    config_path.display()
                );
            }
            let config = Config::default();
            config.save(config_path)?;
            config.ensure_directories()?;
            if !quiet {
                println!("Wrote {}", config_path.display());
                println!("  Logs:    {}", config.log_directory.display());
                println!("  Backup:  {}", config.backup_directory.display());
                println!("  Reports: {}", config.report_directory.display());
            }
        }
    }
    Ok(())
}
