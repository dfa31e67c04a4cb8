//! Backend module for device-network access
//!
//! This module owns everything that talks to the device network: the
//! collaborator traits, the simulated network, and the discovery logic that
//! runs before a sampling pipeline is started. All of it is synchronous and
//! single-threaded.
//!
//! # Components
//!
//! - [`DeviceNetwork`] / [`PropertyTask`] - Interface to the device network
//! - [`SimulatedNetwork`] - In-process network for tests and dry runs
//! - [`DeviceMatcher`] - Candidate and target-rule predicates
//! - [`Discovery`] - Deadline-bounded polling for the target node
//! - [`CapabilityValidator`] - Checks the target can supply every dump property
//!
//! # Example
//!
//! ```ignore
//! use properties_exporter::backend::{CapabilityValidator, Discovery, SimulatedNetwork};
//!
//! let network = SimulatedNetwork::load("network.json", filter)?;
//! let node = Discovery::new(&network, &config.target_device_properties)
//!     .wait_for_target(Duration::from_secs(2));
//!
//! if CapabilityValidator::new(&network).validate(node, &config.dump_properties) {
//!     // start sampling
//! }
//! ```

pub mod discovery;
pub mod matcher;
pub mod network;
pub mod simulated;
pub mod validator;

pub use discovery::Discovery;
pub use matcher::DeviceMatcher;
pub use network::{DeviceNetwork, NetworkFilter, PropertyTask};
pub use simulated::{NetworkFixture, SimulatedNetwork, SimulatedNode, SimulatedProperty, ValuePattern};
pub use validator::CapabilityValidator;
