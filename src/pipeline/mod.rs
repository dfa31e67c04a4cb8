//! Periodic sampling pipeline.
//!
//! Rows flow from a producer on the calling thread to an exporter on a
//! dedicated thread through a single ordered queue:
//!
//! ```text
//! [SampleProducer] ──► handoff queue ──► [RowExporter] ──► [CsvSink]
//! ```
//!
//! # Design
//!
//! - **Single producer, single consumer**: neither queue end is cloneable,
//!   so rows reach the sink in capture order.
//! - **Unbounded queue**: pushing never blocks the sampling clock.
//! - **Close on drop**: when the producer stops early the queue closes and
//!   the exporter finishes with a truncated but valid file.

pub mod exporter;
pub mod producer;
pub mod queue;
pub mod runner;
pub mod sink;

pub use exporter::{stdout_progress, ExportReport, ProgressReporter, RowExporter};
pub use producer::SampleProducer;
pub use queue::{handoff_queue, RowReceiver, RowSender};
pub use runner::{Application, RunSummary};
pub use sink::{output_path, CsvSink, RowSink};
