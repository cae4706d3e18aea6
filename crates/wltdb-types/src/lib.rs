//! Domain types and log parser for wireless temperature logger exports.
//!
//! This crate holds everything that does not need a database: the
//! [`Reading`] record, report column configuration ([`AliasList`]), report
//! date windows ([`DateWindow`], [`DateFormat`]) and the line parser for
//! logger export files ([`parser`]).
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use wltdb_types::parser::LogParser;
//!
//! let export = "\"H3\",x,x,x,\"SENSOR1\"\n\"SD\",\"2024-01-01 08:00:00\",\"21.5\",x\n";
//! let readings = LogParser::new(Cursor::new(export))
//!     .collect::<Result<Vec<_>, _>>()?;
//! assert_eq!(readings[0].device_id, "SENSOR1");
//! # Ok::<(), wltdb_types::ParseError>(())
//! ```

pub mod error;
pub mod parser;
pub mod types;

pub use encoding_rs::Encoding;
pub use error::{AliasError, DateFormatError, ParseError, ParseResult, WindowError};
pub use parser::{LogParser, ParserState, UNKNOWN_DEVICE};
pub use types::{AliasList, DateFormat, DateWindow, DeviceAlias, Reading};
