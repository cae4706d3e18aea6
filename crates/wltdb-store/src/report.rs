//! Pivoted CSV reports.
//!
//! A report has one `LogDate` column followed by one column per configured
//! alias, in alias order. Each row is one timestamp in the report window:
//!
//! ```text
//! "LogDate","Living Room","Garage"
//! "2024-01-01 08:00:00",21.5,4
//! "2024-01-01 09:00:00",21.75,
//! ```
//!
//! Text cells are quoted with embedded quotes doubled, values are written
//! unquoted and missing values leave the cell empty. The file is encoded
//! with a legacy code page so that older spreadsheet tools open it directly.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, WINDOWS_1252};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wltdb_types::{AliasList, DateFormat, DateWindow};

use crate::error::{Error, Result};
use crate::queries::{PivotQuery, TimestampUniverse};
use crate::store::Store;

/// Title of the first report column.
pub const DATE_COLUMN: &str = "LogDate";

/// Line terminator written after every report line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// `\r\n` on Windows, `\n` elsewhere.
    #[default]
    Native,
    Crlf,
    Lf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Crlf => "\r\n",
            LineEnding::Lf => "\n",
            LineEnding::Native if cfg!(windows) => "\r\n",
            LineEnding::Native => "\n",
        }
    }
}

/// Options for [`write_report`] and [`generate_report`].
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Output text encoding.
    pub encoding: &'static Encoding,
    pub line_ending: LineEnding,
    pub universe: TimestampUniverse,
    /// Date part of the stored timestamps, used for the window bounds.
    pub date_format: DateFormat,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            encoding: WINDOWS_1252,
            line_ending: LineEnding::default(),
            universe: TimestampUniverse::default(),
            date_format: DateFormat::default(),
        }
    }
}

/// What a report contained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    /// Data rows, header excluded.
    pub rows: usize,
    /// Value columns, `LogDate` excluded.
    pub columns: usize,
    /// Whether some characters had no mapping in the output encoding.
    pub unmappable: bool,
    /// Output file, when written by [`generate_report`].
    pub path: Option<PathBuf>,
}

/// Check that reports can be encoded with `encoding`.
///
/// `encoding_rs` encodes UTF-16 and `replacement` text as UTF-8, so those
/// labels are refused rather than written under the wrong encoding.
pub fn check_output_encoding(encoding: &'static Encoding) -> Result<()> {
    if encoding.output_encoding() == encoding {
        Ok(())
    } else {
        Err(Error::UnsupportedOutputEncoding(encoding.name()))
    }
}

/// Write a report for `window` to `out`.
///
/// Columns are the devices of `aliases` in list order, titled with their
/// aliases. A store error aborts the report before anything is written.
pub fn write_report<W: Write>(
    store: &Store,
    window: &DateWindow,
    aliases: &AliasList,
    out: &mut W,
    options: &ReportOptions,
) -> Result<ReportSummary> {
    check_output_encoding(options.encoding)?;
    let query = PivotQuery::new(*window)
        .devices(aliases.device_ids())
        .universe(options.universe)
        .date_format(options.date_format.clone());
    let rows = store.query(&query)?;

    let eol = options.line_ending.as_str();
    let mut encoder = LineEncoder::new(options.encoding);

    let mut line = String::new();
    push_quoted(&mut line, DATE_COLUMN);
    for alias in aliases {
        line.push(',');
        push_quoted(&mut line, &alias.alias);
    }
    line.push_str(eol);
    encoder.write_line(out, &line)?;

    for row in &rows {
        line.clear();
        push_quoted(&mut line, &row.timestamp);
        for value in &row.values {
            line.push(',');
            if let Some(value) = value {
                line.push_str(&value.to_string());
            }
        }
        line.push_str(eol);
        encoder.write_line(out, &line)?;
    }

    if encoder.unmappable {
        warn!(
            "Some report text cannot be represented in {} and was written as character references",
            options.encoding.name()
        );
    }

    debug!("Report for {} has {} rows", window, rows.len());

    Ok(ReportSummary {
        rows: rows.len(),
        columns: aliases.len(),
        unmappable: encoder.unmappable,
        path: None,
    })
}

/// Write a report to `path`, creating or truncating the file.
pub fn generate_report(
    store: &Store,
    window: &DateWindow,
    aliases: &AliasList,
    path: &Path,
    options: &ReportOptions,
) -> Result<ReportSummary> {
    check_output_encoding(options.encoding)?;
    let file = File::create(path).map_err(|e| Error::DestinationUnwritable {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut writer = BufWriter::new(file);
    let mut summary = write_report(store, window, aliases, &mut writer, options)?;
    writer.flush().map_err(Error::Write)?;

    info!(
        "Wrote report {} ({} rows, {} columns)",
        path.display(),
        summary.rows,
        summary.columns
    );

    summary.path = Some(path.to_path_buf());
    Ok(summary)
}

struct LineEncoder {
    encoding: &'static Encoding,
    unmappable: bool,
}

impl LineEncoder {
    fn new(encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            unmappable: false,
        }
    }

    fn write_line<W: Write>(&mut self, out: &mut W, line: &str) -> Result<()> {
        let (bytes, _, unmappable) = self.encoding.encode(line);
        self.unmappable |= unmappable;
        out.write_all(&bytes).map_err(Error::Write)
    }
}

/// Append `field` wrapped in double quotes, doubling embedded quotes.
fn push_quoted(buf: &mut String, field: &str) {
    buf.push('"');
    for c in field.chars() {
        if c == '"' {
            buf.push('"');
        }
        buf.push(c);
    }
    buf.push('"');
}
