//! Error types for wltdb-types.

use thiserror::Error;
use time::Date;

/// Errors that can occur while reading a logger export.
///
/// Malformed or irrelevant lines are not errors; the parser skips them.
/// Only a failure of the underlying reader ends a parse early.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The log could not be read.
    #[error("Failed to read log: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using wltdb-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Errors from building a [`DateWindow`](crate::DateWindow).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    /// The start date lies after the end date.
    #[error("Invalid date range: {from} is after {to}")]
    Inverted { from: Date, to: Date },
}

/// Errors from a date format description.
#[derive(Debug, Error)]
pub enum DateFormatError {
    /// The pattern is not a valid `time` format description.
    #[error("Invalid date format '{pattern}': {source}")]
    Invalid {
        pattern: String,
        source: time::error::InvalidFormatDescription,
    },

    /// The pattern asks for components a calendar date does not have.
    #[error("Date format '{pattern}' cannot format a date: {source}")]
    Unformattable {
        pattern: String,
        source: time::error::Format,
    },
}

/// Errors from editing an [`AliasList`](crate::AliasList).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AliasError {
    /// The device is already in the list.
    #[error("Device '{0}' already has an alias")]
    AlreadyPresent(String),

    /// The device is not in the list.
    #[error("Device '{0}' has no alias")]
    NotFound(String),

    /// Aliases must contain at least one non-whitespace character.
    #[error("Alias for '{0}' must not be empty")]
    EmptyAlias(String),
}
