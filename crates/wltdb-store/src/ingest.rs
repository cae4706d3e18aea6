//! Batch ingest of logger export files.
//!
//! Every file is ingested inside its own transaction. A file that cannot be
//! opened or fails part way through is rolled back and recorded in the
//! [`IngestSummary`]; the batch carries on with the next file. Database
//! errors abort the whole batch.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use encoding_rs::{Encoding, UTF_8};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wltdb_types::{LogParser, ParseError};

use crate::error::{Error, Result};
use crate::store::{Store, upsert_on};

/// Called after each file with its outcome.
pub type ProgressCallback = Arc<dyn Fn(&FileOutcome) + Send + Sync>;

/// Options for [`Store::ingest`].
#[derive(Clone)]
pub struct IngestOptions {
    /// Encoding of the log files.
    pub encoding: &'static Encoding,
    /// Checked before each file; once cancelled the remaining files are skipped.
    pub cancel: Option<CancellationToken>,
    pub progress_callback: Option<ProgressCallback>,
}

impl std::fmt::Debug for IngestOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestOptions")
            .field("encoding", &self.encoding.name())
            .field("cancel", &self.cancel)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            encoding: UTF_8,
            cancel: None,
            progress_callback: None,
        }
    }
}

impl IngestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log file encoding.
    pub fn encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Stop between files once `token` is cancelled.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Set a callback run after every processed file.
    #[must_use]
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&FileOutcome) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    fn report_progress(&self, outcome: &FileOutcome) {
        if let Some(cb) = &self.progress_callback {
            cb(outcome);
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }
}

/// Result of ingesting one file.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    /// Readings written. Zero when the file failed.
    pub readings: usize,
    /// Why the file was rolled back, if it was.
    pub error: Option<Error>,
}

impl FileOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a batch ingest.
#[derive(Debug, Default)]
pub struct IngestSummary {
    /// One entry per processed file, in input order.
    pub files: Vec<FileOutcome>,
    /// Whether the batch stopped early on cancellation.
    pub cancelled: bool,
    /// Files left unprocessed because of cancellation.
    pub skipped: usize,
}

impl IngestSummary {
    /// Readings written across all files.
    pub fn total_readings(&self) -> usize {
        self.files.iter().map(|f| f.readings).sum()
    }

    /// Files that were fully ingested.
    pub fn succeeded(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.is_ok())
    }

    /// Files that were rolled back.
    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| !f.is_ok())
    }

    /// True when every file was processed and none failed.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.failed().next().is_none()
    }
}

impl Store {
    /// Ingest a batch of log files in the given order.
    ///
    /// Returns `Err` only for errors that are not confined to one file; see
    /// [`Error::is_per_file`].
    pub fn ingest<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &IngestOptions,
    ) -> Result<IngestSummary> {
        let mut summary = IngestSummary::default();

        for (index, path) in paths.iter().enumerate() {
            if options.is_cancelled() {
                summary.cancelled = true;
                summary.skipped = paths.len() - index;
                warn!("Ingest cancelled, {} file(s) skipped", summary.skipped);
                break;
            }

            let path = path.as_ref();
            let outcome = match self.ingest_file(path, options.encoding) {
                Ok(readings) => FileOutcome {
                    path: path.to_path_buf(),
                    readings,
                    error: None,
                },
                Err(e) if e.is_per_file() => {
                    warn!("Skipping {}: {}", path.display(), e);
                    FileOutcome {
                        path: path.to_path_buf(),
                        readings: 0,
                        error: Some(e),
                    }
                }
                Err(e) => return Err(e),
            };
            options.report_progress(&outcome);
            summary.files.push(outcome);
        }

        info!(
            "Ingested {} readings from {} file(s), {} failed",
            summary.total_readings(),
            summary.succeeded().count(),
            summary.failed().count()
        );

        Ok(summary)
    }

    /// Ingest one log file in a single transaction.
    pub fn ingest_file(&self, path: &Path, encoding: &'static Encoding) -> Result<usize> {
        let read_error = |source: ParseError| Error::ReadLog {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(|e| read_error(ParseError::Io(e)))?;
        let readings = self
            .ingest_reader(BufReader::new(file), encoding)
            .map_err(|e| match e {
                Error::Parse(source) => read_error(source),
                other => other,
            })?;

        debug!("Ingested {} readings from {}", readings, path.display());
        Ok(readings)
    }

    /// Ingest one log stream in a single transaction.
    ///
    /// Nothing is committed unless the whole stream is read.
    pub fn ingest_reader<R: BufRead>(&self, reader: R, encoding: &'static Encoding) -> Result<usize> {
        let tx = self.connection().unchecked_transaction()?;
        let mut count = 0;

        for reading in LogParser::with_encoding(reader, encoding) {
            upsert_on(&tx, &reading?)?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }
}
