//! # Properties Exporter
//!
//! Finds one device on a dynamically enumerated device network, checks that
//! it exposes every property the user wants, then samples those properties
//! at a fixed period and streams timestamped rows to a CSV file.
//!
//! ## Architecture
//!
//! - **Backend**: device-network seam, target matching, discovery and
//!   capability validation (synchronous, single-threaded)
//! - **Pipeline**: fixed-period sample producer on the calling thread,
//!   row exporter on a worker thread, joined by an ordered hand-off queue
//! - **Communication**: a crossbeam channel between producer and exporter
//!
//! ## Configuration
//!
//! The configuration file names the target device properties and the
//! properties to dump; see [`config`] for the format. Run parameters live
//! in [`RunSettings`].
//!
//! ## Example
//!
//! ```ignore
//! use properties_exporter::{
//!     backend::{NetworkFilter, SimulatedNetwork},
//!     config::{ConfigSettings, RunSettings},
//!     pipeline::Application,
//! };
//!
//! fn main() -> properties_exporter::Result<()> {
//!     let config = ConfigSettings::load("device.json")?;
//!     let settings = RunSettings::default().with_samples_count(100);
//!     let network = SimulatedNetwork::load("network.json", NetworkFilter::from_settings(&settings))?;
//!
//!     let summary = Application::new(network, config, settings).run()?;
//!     println!("wrote {:?}", summary.output_path);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

// Re-export commonly used types
pub use backend::{DeviceNetwork, NetworkFilter, PropertyTask, SimulatedNetwork};
pub use config::{ConfigSettings, DumpProperty, DumpPropertySpec, RunSettings};
pub use error::{ExporterError, Result};
pub use pipeline::{Application, RunSummary};
pub use types::{NodeHandle, NodeStatus, SampleRow, Transport};
