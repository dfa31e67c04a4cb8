//! DeviceNetwork trait for the device-network collaborator
//!
//! This module provides the interface the exporter uses to talk to a device
//! network, enabling both a vendor-backed network and the in-process
//! [`SimulatedNetwork`](super::SimulatedNetwork) used for tests and dry runs.
//! Every node operation goes through these traits; a [`NodeHandle`] is never
//! dereferenced directly.

use crate::config::RunSettings;
use crate::error::Result;
use crate::types::{NodeHandle, NodeStatus, Transport};
use std::sync::Arc;

/// Unified interface for device networks
///
/// A network enumerates its current nodes, reports their status and exposes
/// per-node string properties. Grouped reads go through a [`PropertyTask`].
///
/// # Example
///
/// ```ignore
/// fn serials(network: &dyn DeviceNetwork) -> Vec<Result<String>> {
///     network
///         .nodes()
///         .into_iter()
///         .map(|node| network.node_string_property(node, "Serial"))
///         .collect()
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait DeviceNetwork {
    /// Snapshot of the nodes currently present, in enumeration order
    fn nodes(&self) -> Vec<NodeHandle>;

    /// Current status of a node
    fn node_status(&self, node: NodeHandle) -> Result<NodeStatus>;

    /// Read a string property directly from a node
    fn node_string_property(&self, node: NodeHandle, key: &str) -> Result<String>;

    /// Open a task grouping property reads on one node
    ///
    /// Fails if the node is gone or no longer supports grouped reads.
    /// The task is released when dropped.
    fn open_property_task(&self, node: NodeHandle) -> Result<Box<dyn PropertyTask>>;
}

/// A scoped session of property reads on one node
#[cfg_attr(test, mockall::automock)]
pub trait PropertyTask {
    /// Node this task was opened on
    fn node(&self) -> NodeHandle;

    /// Read a string property through the task
    fn string_property(&mut self, key: &str) -> Result<String>;
}

impl<N: DeviceNetwork + ?Sized> DeviceNetwork for &N {
    fn nodes(&self) -> Vec<NodeHandle> {
        (**self).nodes()
    }

    fn node_status(&self, node: NodeHandle) -> Result<NodeStatus> {
        (**self).node_status(node)
    }

    fn node_string_property(&self, node: NodeHandle, key: &str) -> Result<String> {
        (**self).node_string_property(node, key)
    }

    fn open_property_task(&self, node: NodeHandle) -> Result<Box<dyn PropertyTask>> {
        (**self).open_property_task(node)
    }
}

impl<N: DeviceNetwork + ?Sized> DeviceNetwork for Arc<N> {
    fn nodes(&self) -> Vec<NodeHandle> {
        (**self).nodes()
    }

    fn node_status(&self, node: NodeHandle) -> Result<NodeStatus> {
        (**self).node_status(node)
    }

    fn node_string_property(&self, node: NodeHandle, key: &str) -> Result<String> {
        (**self).node_string_property(node, key)
    }

    fn open_property_task(&self, node: NodeHandle) -> Result<Box<dyn PropertyTask>> {
        (**self).open_property_task(node)
    }
}

/// Which kinds of devices a network includes
///
/// USB devices are always part of the network; IP devices only when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkFilter {
    usb: bool,
    ip: bool,
}

impl Default for NetworkFilter {
    fn default() -> Self {
        Self::usb_only()
    }
}

impl NetworkFilter {
    /// All USB devices, no IP devices
    pub fn usb_only() -> Self {
        Self {
            usb: true,
            ip: false,
        }
    }

    /// Include or exclude all IP devices
    pub fn with_ip_devices(mut self, enabled: bool) -> Self {
        self.ip = enabled;
        self
    }

    /// Build the filter a run asks for
    pub fn from_settings(settings: &RunSettings) -> Self {
        let filter = Self::usb_only().with_ip_devices(settings.enable_ip_devices);
        if filter.ip {
            tracing::info!("Adding all IP devices to the device network filter");
        }
        filter
    }

    /// Check whether a node on this transport belongs to the network
    pub fn accepts(&self, transport: Transport) -> bool {
        match transport {
            Transport::Usb => self.usb,
            Transport::Ip => self.ip,
        }
    }
}
