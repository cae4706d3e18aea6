//! Data models returned by store queries.

use serde::Serialize;

/// One report row: a timestamp and a value per requested device.
///
/// `values` is aligned with the device list of the
/// [`PivotQuery`](crate::PivotQuery) that produced it. `None` marks a device
/// with no reading at this timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    /// Timestamp exactly as stored.
    pub timestamp: String,
    /// Value per requested device, in request order.
    pub values: Vec<Option<f64>>,
}

/// Summary of store contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    /// Total number of stored readings.
    pub readings: u64,
    /// Number of distinct devices.
    pub devices: u64,
    /// Earliest timestamp, if any readings exist.
    pub first_timestamp: Option<String>,
    /// Latest timestamp, if any readings exist.
    pub last_timestamp: Option<String>,
}
