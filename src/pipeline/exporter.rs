//! Row exporter: drains the hand-off queue into a row sink.
//!
//! The exporter runs on its own thread and owns the sink for the whole
//! run. It writes the header first, then pops and writes up to
//! `samples_count` rows in arrival order. The sink is finished exactly once
//! on every exit path: all rows written, queue closed early, or a write
//! failure.

use crate::config::DumpPropertySpec;
use crate::error::{ExporterError, Result};
use crate::pipeline::queue::RowReceiver;
use crate::pipeline::sink::RowSink;
use std::thread::JoinHandle;

/// Name of the exporter thread
pub const EXPORTER_THREAD_NAME: &str = "row-exporter";

/// Callback invoked with `(rows_written, rows_expected)` after each row
pub type ProgressReporter = Box<dyn FnMut(u64, u64) + Send>;

/// Progress reporter printing `written/total` lines to stdout
pub fn stdout_progress() -> ProgressReporter {
    Box::new(|written, total| println!("{}/{}", written, total))
}

/// Result of a finished export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    /// Data rows written after the header
    pub rows_written: u64,
    /// Data rows the run asked for
    pub rows_expected: u64,
}

impl ExportReport {
    /// Whether every expected row was written
    pub fn is_complete(&self) -> bool {
        self.rows_written == self.rows_expected
    }
}

/// Writes queued rows to a sink
pub struct RowExporter {
    sink: Box<dyn RowSink>,
    header: Vec<String>,
    samples_count: u64,
    progress: Option<ProgressReporter>,
}

impl RowExporter {
    /// Create an exporter writing the header derived from `spec`
    pub fn new(sink: Box<dyn RowSink>, spec: &DumpPropertySpec, samples_count: u64) -> Self {
        Self {
            sink,
            header: spec.header(),
            samples_count,
            progress: None,
        }
    }

    /// Report progress after every row
    pub fn with_progress(mut self, reporter: ProgressReporter) -> Self {
        self.progress = Some(reporter);
        self
    }

    /// Run the export loop on a dedicated thread
    pub fn spawn(self, queue: RowReceiver) -> Result<JoinHandle<Result<ExportReport>>> {
        std::thread::Builder::new()
            .name(EXPORTER_THREAD_NAME.to_string())
            .spawn(move || self.run(queue))
            .map_err(|e| {
                ExporterError::Io(e).with_context("Failed to spawn the row exporter thread")
            })
    }

    /// Run the export loop on the current thread
    pub fn run(self, mut queue: RowReceiver) -> Result<ExportReport> {
        let RowExporter {
            mut sink,
            header,
            samples_count,
            mut progress,
        } = self;

        let exported = export_rows(sink.as_mut(), &header, samples_count, &mut queue, &mut progress);
        let closed = sink.finish();

        match (exported, closed) {
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    tracing::warn!("Closing the sink after a failure also failed: {}", close_err);
                }
                tracing::error!("Export aborted: {}", e);
                Err(e)
            }
            (Ok(_), Err(e)) => {
                tracing::error!("Failed to close the sink: {}", e);
                Err(e)
            }
            (Ok(report), Ok(())) => Ok(report),
        }
    }
}

fn export_rows(
    sink: &mut dyn RowSink,
    header: &[String],
    samples_count: u64,
    queue: &mut RowReceiver,
    progress: &mut Option<ProgressReporter>,
) -> Result<ExportReport> {
    sink.write_row(header)?;

    let mut rows_written = 0;
    while rows_written < samples_count {
        let Some(row) = queue.pop() else {
            tracing::warn!(
                "Sample producer stopped early: exported {} of {} rows",
                rows_written,
                samples_count
            );
            break;
        };

        sink.write_row(row.cells())?;
        rows_written += 1;

        if let Some(report) = progress.as_mut() {
            report(rows_written, samples_count);
        }
    }

    Ok(ExportReport {
        rows_written,
        rows_expected: samples_count,
    })
}
