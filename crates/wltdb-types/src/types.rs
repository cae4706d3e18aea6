//! Core types for logged temperature data.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::format_description::OwnedFormatItem;
use time::macros::format_description;
use time::{Date, Duration};

use crate::error::{AliasError, DateFormatError, WindowError};

/// A single temperature sample from one logger.
///
/// `timestamp` is kept exactly as the logger wrote it. Its fixed-width
/// `YYYY-MM-DD HH:MM:SS` shape makes lexicographic order chronological.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reading {
    /// Logger-assigned device identifier (case-sensitive).
    pub device_id: String,
    /// Date and time of the sample.
    pub timestamp: String,
    /// Temperature value.
    pub value: f64,
}

impl Reading {
    /// Create a new reading.
    pub fn new(device_id: impl Into<String>, timestamp: impl Into<String>, value: f64) -> Self {
        Self {
            device_id: device_id.into(),
            timestamp: timestamp.into(),
            value,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.device_id, self.timestamp, self.value)
    }
}

/// A display name for a device in reports.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceAlias {
    /// Device identifier as stored.
    pub device_id: String,
    /// Column header used in reports.
    pub alias: String,
}

impl DeviceAlias {
    /// Create a new alias.
    pub fn new(device_id: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            alias: alias.into(),
        }
    }
}

/// Ordered list of device aliases.
///
/// The order is the report column order. Lists built with [`AliasList::add`]
/// never contain the same device twice, but a list deserialized from a
/// hand-edited file may, and the report engine keeps such duplicates as
/// separate columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AliasList(Vec<DeviceAlias>);

impl AliasList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, DeviceAlias> {
        self.0.iter()
    }

    /// Whether `device_id` has an alias.
    pub fn contains(&self, device_id: &str) -> bool {
        self.position(device_id).is_some()
    }

    /// Look up the alias of `device_id`.
    pub fn get(&self, device_id: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|a| a.device_id == device_id)
            .map(|a| a.alias.as_str())
    }

    /// Device identifiers in display order.
    pub fn device_ids(&self) -> Vec<String> {
        self.0.iter().map(|a| a.device_id.clone()).collect()
    }

    /// Append a device, using its identifier as the initial alias.
    pub fn add(&mut self, device_id: &str) -> Result<(), AliasError> {
        if self.contains(device_id) {
            return Err(AliasError::AlreadyPresent(device_id.to_string()));
        }
        self.0.push(DeviceAlias::new(device_id, device_id));
        Ok(())
    }

    /// Change the alias of a device. Surrounding whitespace is trimmed.
    pub fn rename(&mut self, device_id: &str, alias: &str) -> Result<(), AliasError> {
        let alias = alias.trim();
        if alias.is_empty() {
            return Err(AliasError::EmptyAlias(device_id.to_string()));
        }
        let index = self.require(device_id)?;
        self.0[index].alias = alias.to_string();
        Ok(())
    }

    /// Remove a device from the list.
    pub fn remove(&mut self, device_id: &str) -> Result<DeviceAlias, AliasError> {
        let index = self.require(device_id)?;
        Ok(self.0.remove(index))
    }

    /// Move a device one column to the left.
    ///
    /// Returns `false` if it is already first.
    pub fn move_up(&mut self, device_id: &str) -> Result<bool, AliasError> {
        let index = self.require(device_id)?;
        if index == 0 {
            return Ok(false);
        }
        self.0.swap(index, index - 1);
        Ok(true)
    }

    /// Move a device one column to the right.
    ///
    /// Returns `false` if it is already last.
    pub fn move_down(&mut self, device_id: &str) -> Result<bool, AliasError> {
        let index = self.require(device_id)?;
        if index + 1 >= self.0.len() {
            return Ok(false);
        }
        self.0.swap(index, index + 1);
        Ok(true)
    }

    fn position(&self, device_id: &str) -> Option<usize> {
        self.0.iter().position(|a| a.device_id == device_id)
    }

    fn require(&self, device_id: &str) -> Result<usize, AliasError> {
        self.position(device_id)
            .ok_or_else(|| AliasError::NotFound(device_id.to_string()))
    }
}

impl From<Vec<DeviceAlias>> for AliasList {
    fn from(aliases: Vec<DeviceAlias>) -> Self {
        Self(aliases)
    }
}

impl FromIterator<DeviceAlias> for AliasList {
    fn from_iter<I: IntoIterator<Item = DeviceAlias>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a AliasList {
    type Item = &'a DeviceAlias;
    type IntoIter = std::slice::Iter<'a, DeviceAlias>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// How the date part of logger timestamps is written.
///
/// Report bounds are built by formatting a calendar date with this pattern
/// and appending the time of day, so it must match the logger's own format
/// for lexicographic range comparison to work.
#[derive(Debug, Clone)]
pub struct DateFormat {
    pattern: String,
    items: OwnedFormatItem,
}

impl DateFormat {
    /// The default pattern, `YYYY-MM-DD`.
    pub const DEFAULT_PATTERN: &'static str = "[year]-[month]-[day]";

    /// Parse a `time` format description such as `[year]/[month]/[day]`.
    pub fn parse(pattern: &str) -> Result<Self, DateFormatError> {
        let items = time::format_description::parse_owned::<2>(pattern).map_err(|source| {
            DateFormatError::Invalid {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        let format = Self {
            pattern: pattern.to_string(),
            items,
        };
        // Reject patterns with time-of-day or offset components up front.
        format.format(time::macros::date!(2000 - 01 - 01))?;
        Ok(format)
    }

    /// The pattern this format was parsed from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Format a date.
    pub fn format(&self, date: Date) -> Result<String, DateFormatError> {
        date.format(&self.items)
            .map_err(|source| DateFormatError::Unformattable {
                pattern: self.pattern.clone(),
                source,
            })
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self {
            pattern: Self::DEFAULT_PATTERN.to_string(),
            items: OwnedFormatItem::from(format_description!("[year]-[month]-[day]")),
        }
    }
}

/// Inclusive range of calendar days selected for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    from: Date,
    to: Date,
}

impl DateWindow {
    /// Create a window covering `from` through `to`, both inclusive.
    pub fn new(from: Date, to: Date) -> Result<Self, WindowError> {
        if from > to {
            return Err(WindowError::Inverted { from, to });
        }
        Ok(Self { from, to })
    }

    /// A window covering a single day.
    pub fn day(date: Date) -> Self {
        Self {
            from: date,
            to: date,
        }
    }

    /// A window ending at `to` and starting `days` days earlier.
    pub fn ending_at(to: Date, days: u32) -> Self {
        let from = to
            .checked_sub(Duration::days(i64::from(days)))
            .unwrap_or(Date::MIN);
        Self { from, to }
    }

    /// First day of the window.
    pub fn from(&self) -> Date {
        self.from
    }

    /// Last day of the window.
    pub fn to(&self) -> Date {
        self.to
    }

    /// Timestamp bounds `"<from> 00:00:00"` and `"<to> 23:59:59"`.
    pub fn bounds(&self, format: &DateFormat) -> Result<(String, String), DateFormatError> {
        Ok((
            format!("{} 00:00:00", format.format(self.from)?),
            format!("{} 23:59:59", format.format(self.to)?),
        ))
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.from, self.to)
    }
}
