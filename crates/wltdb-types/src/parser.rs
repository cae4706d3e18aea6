//! Line parser for logger export files.
//!
//! An export is comma-separated text in which every field may be wrapped in
//! double quotes. Two line shapes carry data:
//!
//! - `"H3",...` header lines name the logger that produced the following
//!   samples in their fifth field.
//! - `"SD",<timestamp>,<value>,...` sample lines carry one measurement.
//!
//! Everything else is ignored. Because the device is only named by header
//! lines, parsing is a fold over the lines of one file: [`ParserState::step`]
//! takes the state and one line and returns the next state plus an optional
//! [`Reading`]. [`LogParser`] threads that state over a reader.
//!
//! # Example
//!
//! ```
//! use wltdb_types::parser::parse_lines;
//!
//! let lines = [
//!     r#""H3",x,x,x,"SENSOR1""#,
//!     r#""SD","2024-01-01 08:00:00","21.5",x"#,
//! ];
//! let readings: Vec<_> = parse_lines(lines).collect();
//! assert_eq!(readings.len(), 1);
//! assert_eq!(readings[0].device_id, "SENSOR1");
//! assert_eq!(readings[0].value, 21.5);
//! ```

use std::io::{BufRead, ErrorKind};

use encoding_rs::{CoderResult, Decoder, Encoding, UTF_8};
use tracing::{debug, trace};

use crate::error::{ParseError, ParseResult};
use crate::types::Reading;

/// Device id used for samples that appear before any header line.
pub const UNKNOWN_DEVICE: &str = "UNKNOWN";

const HEADER_TAG: &str = "H3";
const SAMPLE_TAG: &str = "SD";
const HEADER_MIN_FIELDS: usize = 5;
const SAMPLE_MIN_FIELDS: usize = 4;
const HEADER_DEVICE_FIELD: usize = 4;

/// Remove one layer of surrounding double quotes.
///
/// Fields that do not both start and end with a quote are returned as is.
pub fn strip_quotes(field: &str) -> &str {
    if field.len() >= 2 && field.starts_with('"') && field.ends_with('"') {
        &field[1..field.len() - 1]
    } else {
        field
    }
}

/// Why a line produced no reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The first field is neither `H3` nor `SD`.
    UnrecognizedTag,
    /// A data line with fewer fields than its tag needs.
    TooFewFields { found: usize, required: usize },
    /// A sample line with an empty timestamp.
    EmptyTimestamp,
    /// A sample line whose value is not a finite decimal number.
    InvalidValue(String),
}

/// Classification of a single line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind<'a> {
    /// A header line. `None` when its device field is empty.
    Header { device_id: Option<&'a str> },
    /// A sample line.
    Sample { timestamp: &'a str, value: f64 },
    /// Anything that yields no reading.
    Skip(SkipReason),
}

/// Classify one line without regard to parser state.
pub fn classify(line: &str) -> LineKind<'_> {
    let fields: Vec<&str> = line.split(',').collect();
    let tag = strip_quotes(fields[0]);

    match tag {
        HEADER_TAG => {
            if fields.len() < HEADER_MIN_FIELDS {
                return LineKind::Skip(SkipReason::TooFewFields {
                    found: fields.len(),
                    required: HEADER_MIN_FIELDS,
                });
            }
            let device_id = strip_quotes(fields[HEADER_DEVICE_FIELD]);
            LineKind::Header {
                device_id: (!device_id.is_empty()).then_some(device_id),
            }
        }
        SAMPLE_TAG => {
            if fields.len() < SAMPLE_MIN_FIELDS {
                return LineKind::Skip(SkipReason::TooFewFields {
                    found: fields.len(),
                    required: SAMPLE_MIN_FIELDS,
                });
            }
            let timestamp = strip_quotes(fields[1]);
            if timestamp.is_empty() {
                return LineKind::Skip(SkipReason::EmptyTimestamp);
            }
            let raw_value = strip_quotes(fields[2]).trim();
            match raw_value.parse::<f64>() {
                Ok(value) if value.is_finite() => LineKind::Sample { timestamp, value },
                _ => LineKind::Skip(SkipReason::InvalidValue(raw_value.to_string())),
            }
        }
        _ => LineKind::Skip(SkipReason::UnrecognizedTag),
    }
}

/// Parser state carried from one line to the next within a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserState {
    current_device_id: String,
}

impl Default for ParserState {
    fn default() -> Self {
        Self::with_device(UNKNOWN_DEVICE)
    }
}

impl ParserState {
    /// State at the start of a file.
    pub fn new() -> Self {
        Self::default()
    }

    /// State with a known current device.
    pub fn with_device(device_id: impl Into<String>) -> Self {
        Self {
            current_device_id: device_id.into(),
        }
    }

    /// Device that the next sample line will be attributed to.
    pub fn current_device_id(&self) -> &str {
        &self.current_device_id
    }

    /// Consume one line, returning the next state and the reading it holds.
    pub fn step(self, line: &str) -> (Self, Option<Reading>) {
        match classify(line) {
            LineKind::Header {
                device_id: Some(device_id),
            } => (Self::with_device(device_id), None),
            LineKind::Header { device_id: None } => (self, None),
            LineKind::Sample { timestamp, value } => {
                let reading = Reading::new(self.current_device_id.as_str(), timestamp, value);
                (self, Some(reading))
            }
            LineKind::Skip(reason) => {
                trace!(?reason, line, "Skipping line");
                (self, None)
            }
        }
    }
}

/// Parse already-split lines of one file.
pub fn parse_lines<I>(lines: I) -> impl Iterator<Item = Reading>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    lines
        .into_iter()
        .scan(ParserState::new(), |state, line| {
            let (next, reading) = std::mem::take(state).step(line.as_ref());
            *state = next;
            Some(reading)
        })
        .flatten()
}

/// Lazy reading iterator over one log file.
///
/// The byte stream is decoded with the configured encoding before it is split
/// into lines, so multi-byte encodings such as UTF-16 work. A leading byte
/// order mark is removed and bytes that do not decode are replaced with
/// U+FFFD. A read failure is yielded once as [`ParseError::Io`] and ends the
/// iteration.
pub struct LogParser<R> {
    reader: R,
    decoder: Decoder,
    pending: String,
    eof: bool,
    state: ParserState,
    line_number: usize,
    done: bool,
}

impl<R: BufRead> LogParser<R> {
    /// Parse UTF-8 text.
    pub fn new(reader: R) -> Self {
        Self::with_encoding(reader, UTF_8)
    }

    /// Parse text in the given encoding.
    pub fn with_encoding(reader: R, encoding: &'static Encoding) -> Self {
        Self {
            reader,
            decoder: encoding.new_decoder_with_bom_removal(),
            pending: String::new(),
            eof: false,
            state: ParserState::new(),
            line_number: 0,
            done: false,
        }
    }

    /// Current parser state.
    pub fn state(&self) -> &ParserState {
        &self.state
    }

    /// Number of lines consumed so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    fn next_line(&mut self) -> Option<std::io::Result<String>> {
        loop {
            if let Some(pos) = self.pending.find('\n') {
                let mut line: String = self.pending.drain(..=pos).collect();
                line.pop();
                if line.ends_with('\r') {
                    line.pop();
                }
                self.line_number += 1;
                return Some(Ok(line));
            }

            if self.eof {
                if self.pending.is_empty() {
                    return None;
                }
                self.line_number += 1;
                return Some(Ok(std::mem::take(&mut self.pending)));
            }

            if let Err(e) = self.decode_chunk() {
                return Some(Err(e));
            }
        }
    }

    /// Decode the next buffered chunk of input into `pending`.
    fn decode_chunk(&mut self) -> std::io::Result<()> {
        let chunk = match self.reader.fill_buf() {
            Ok(chunk) => chunk,
            Err(e) if e.kind() == ErrorKind::Interrupted => return Ok(()),
            Err(e) => return Err(e),
        };
        let last = chunk.is_empty();

        let needed = self
            .decoder
            .max_utf8_buffer_length(chunk.len())
            .unwrap_or(chunk.len() * 3 + 16);
        self.pending.reserve(needed);

        let (result, read, had_errors) = self.decoder.decode_to_string(chunk, &mut self.pending, last);
        self.reader.consume(read);

        if had_errors {
            debug!(
                line = self.line_number + 1,
                encoding = self.decoder.encoding().name(),
                "Replaced undecodable bytes"
            );
        }
        if last && matches!(result, CoderResult::InputEmpty) {
            self.eof = true;
        }
        Ok(())
    }
}

impl<R: BufRead> Iterator for LogParser<R> {
    type Item = ParseResult<Reading>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            match self.next_line() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(ParseError::Io(e)));
                }
                Some(Ok(line)) => {
                    let (next, reading) = std::mem::take(&mut self.state).step(&line);
                    self.state = next;
                    if let Some(reading) = reading {
                        return Some(Ok(reading));
                    }
                }
            }
        }
    }
}
