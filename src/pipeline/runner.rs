//! Run orchestration.
//!
//! [`Application::run`] drives one complete run:
//!
//! ```text
//! Discovery ─► CapabilityValidator ─► open sink ─► spawn RowExporter
//!                                                        ▲
//!            SampleProducer (this thread) ── hand-off ───┘
//! ```
//!
//! Discovery and validation finish before any thread is spawned. The
//! producer runs on the calling thread, the exporter on one worker thread,
//! and both are joined before `run` returns.

use crate::backend::{CapabilityValidator, DeviceNetwork, Discovery};
use crate::config::{ConfigSettings, RunSettings};
use crate::error::{ExporterError, Result, ResultExt};
use crate::pipeline::exporter::{stdout_progress, ExportReport, ProgressReporter, RowExporter};
use crate::pipeline::producer::SampleProducer;
use crate::pipeline::queue::handoff_queue;
use crate::pipeline::sink::{output_path, CsvSink};
use crate::types::NodeHandle;
use std::path::PathBuf;

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Node that was sampled
    pub node: NodeHandle,
    /// File the rows were written to
    pub output_path: PathBuf,
    /// Rows pushed by the producer
    pub rows_produced: u64,
    /// What the exporter wrote
    pub export: ExportReport,
}

/// One discovery + sampling run against a device network
pub struct Application<N: DeviceNetwork> {
    network: N,
    config: ConfigSettings,
    settings: RunSettings,
    progress: Option<ProgressReporter>,
}

impl<N: DeviceNetwork> Application<N> {
    /// Create a run; the network is injected and lives as long as the run
    ///
    /// With `print_progress` set, progress goes to stdout unless another
    /// reporter is installed through [`with_progress`](Self::with_progress).
    pub fn new(network: N, config: ConfigSettings, settings: RunSettings) -> Self {
        let progress = settings.print_progress.then(stdout_progress);
        Self {
            network,
            config,
            settings,
            progress,
        }
    }

    /// Report exporter progress through `reporter`
    pub fn with_progress(mut self, reporter: ProgressReporter) -> Self {
        self.progress = Some(reporter);
        self
    }

    /// The device network this run talks to
    pub fn network(&self) -> &N {
        &self.network
    }

    /// Wait for the target device
    ///
    /// A timeout is reported as [`ExporterError::DiscoveryTimeout`].
    pub fn discover(&self) -> Result<NodeHandle> {
        let timeout = self.settings.wait_device_timeout();
        tracing::info!(
            "Waiting up to {} ms for the target device",
            timeout.as_millis()
        );

        Discovery::from_settings(
            &self.network,
            &self.config.target_device_properties,
            &self.settings,
        )
        .wait_for_target(timeout)
        .non_null()
        .ok_or(ExporterError::DiscoveryTimeout {
            timeout_ms: self.settings.wait_device_timeout_ms,
        })
    }

    /// Run discovery, validation and the sampling pipeline
    pub fn run(self) -> Result<RunSummary> {
        let started = chrono::Local::now();

        let node = self.discover()?;
        CapabilityValidator::new(&self.network)
            .check(node, &self.config.dump_properties)
            .context("Target device cannot supply the dump properties")?;

        let path = output_path(&self.settings.output_dir, started);
        let sink = CsvSink::create(&path, self.settings.delimiter)?;

        let Application {
            network,
            config,
            settings,
            progress,
        } = self;

        let (tx, rx) = handoff_queue();
        let mut exporter = RowExporter::new(
            Box::new(sink),
            &config.dump_properties,
            settings.samples_count,
        );
        if let Some(reporter) = progress {
            exporter = exporter.with_progress(reporter);
        }
        let exporter = exporter.spawn(rx)?;

        let produced =
            SampleProducer::new(&network, node, &config.dump_properties, &settings).run(tx);

        let exported = exporter
            .join()
            .map_err(|_| ExporterError::Channel("row exporter thread panicked".to_string()))?;

        // A write failure also makes the producer's push fail; report the cause
        let export = exported.context("Export failed")?;
        let rows_produced = produced?;
        if !export.is_complete() {
            return Err(ExporterError::Starved {
                expected: export.rows_expected,
                received: export.rows_written,
            });
        }

        tracing::info!(
            "Exported {} samples of {} to {:?}",
            export.rows_written,
            node,
            path
        );
        Ok(RunSummary {
            node,
            output_path: path,
            rows_produced,
            export,
        })
    }
}
