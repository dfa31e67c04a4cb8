//! Row sinks: where exported rows end up.
//!
//! [`CsvSink`] writes delimiter-separated rows to a file named after the
//! run's start time.

use crate::error::{ExporterError, Result};
use chrono::{DateTime, Local};
use std::fs::File;
use std::path::{Path, PathBuf};

/// File name format of an output file, from the run-start local time
pub const OUTPUT_FILE_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Append-only, row-oriented output
///
/// A sink is owned by exactly one thread. [`finish`](RowSink::finish)
/// consumes the sink, so it can only be closed once.
pub trait RowSink: Send {
    /// Append one row
    fn write_row(&mut self, cells: &[String]) -> Result<()>;

    /// Flush and close the sink
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Path of the output file for a run started at `started`
pub fn output_path(dir: impl AsRef<Path>, started: DateTime<Local>) -> PathBuf {
    dir.as_ref()
        .join(format!("{}.csv", started.format(OUTPUT_FILE_FORMAT)))
}

/// CSV file sink
pub struct CsvSink {
    writer: csv::Writer<File>,
    path: PathBuf,
    rows_written: u64,
}

impl CsvSink {
    /// Create (or truncate) the file at `path`
    pub fn create(path: impl Into<PathBuf>, delimiter: u8) -> Result<Self> {
        let path = path.into();
        let writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(&path)
            .map_err(|e| {
                ExporterError::Sink(format!("Failed to create {}: {}", path.display(), e))
            })?;

        tracing::info!("CsvSink opened file: {:?}", path);
        Ok(Self {
            writer,
            path,
            rows_written: 0,
        })
    }

    /// Path of the file being written
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowSink for CsvSink {
    fn write_row(&mut self, cells: &[String]) -> Result<()> {
        self.writer.write_record(cells)?;
        self.rows_written += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        self.writer.flush()?;
        tracing::info!(
            "CsvSink closed {:?} after {} rows",
            self.path,
            self.rows_written
        );
        Ok(())
    }
}
