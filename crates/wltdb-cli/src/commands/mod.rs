//! Command implementations for the CLI.

mod alias;
mod config;
mod devices;
mod info;
mod ingest;
mod report;

pub use alias::cmd_alias;
pub use config::cmd_config;
pub use devices::cmd_devices;
pub use info::cmd_info;
pub use ingest::{IngestArgs, cmd_ingest};
pub use report::{ReportArgs, cmd_report};
