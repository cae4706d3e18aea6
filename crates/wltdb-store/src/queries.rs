//! Query builder for pivoted report data.
//!
//! # Example
//!
//! ```
//! use wltdb_store::{PivotQuery, Store, TimestampUniverse};
//! use wltdb_types::DateWindow;
//! use time::macros::date;
//!
//! let store = Store::open_in_memory()?;
//! let window = DateWindow::new(date!(2024 - 01 - 01), date!(2024 - 01 - 07))?;
//!
//! let query = PivotQuery::new(window)
//!     .device("SENSOR1")
//!     .device("SENSOR2")
//!     .universe(TimestampUniverse::AllDevices);
//!
//! let rows = store.query(&query)?;
//! assert!(rows.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};
use wltdb_types::{DateFormat, DateWindow};

/// Which readings decide the set of report rows.
///
/// With [`AllDevices`](Self::AllDevices) a report lists every timestamp at
/// which *any* logger recorded a value, including loggers that are not
/// report columns, so a row may have only empty cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimestampUniverse {
    /// Timestamps of all devices in the store.
    #[default]
    AllDevices,
    /// Only timestamps of the requested devices.
    RequestedDevices,
}

/// Fluent builder for [`Store::query`](crate::Store::query).
///
/// Device ids are kept in the order given, duplicates included; each one
/// becomes a value column of the resulting rows.
#[derive(Debug, Clone)]
pub struct PivotQuery {
    /// Inclusive date range.
    pub window: DateWindow,
    /// Requested devices in column order.
    pub device_ids: Vec<String>,
    /// Source of the row timestamps.
    pub universe: TimestampUniverse,
    /// How the date part of stored timestamps is written.
    pub date_format: DateFormat,
}

impl PivotQuery {
    /// Create a query over `window` with no device columns.
    pub fn new(window: DateWindow) -> Self {
        Self {
            window,
            device_ids: Vec::new(),
            universe: TimestampUniverse::default(),
            date_format: DateFormat::default(),
        }
    }

    /// Append one device column.
    pub fn device(mut self, device_id: &str) -> Self {
        self.device_ids.push(device_id.to_string());
        self
    }

    /// Append several device columns.
    pub fn devices<I, S>(mut self, device_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.device_ids.extend(device_ids.into_iter().map(Into::into));
        self
    }

    /// Choose where row timestamps come from.
    pub fn universe(mut self, universe: TimestampUniverse) -> Self {
        self.universe = universe;
        self
    }

    /// Set the date format of stored timestamps.
    pub fn date_format(mut self, date_format: DateFormat) -> Self {
        self.date_format = date_format;
        self
    }

    /// Lower and upper timestamp bounds, both inclusive.
    pub(crate) fn bounds(&self) -> crate::Result<(String, String)> {
        Ok(self.window.bounds(&self.date_format)?)
    }
}
