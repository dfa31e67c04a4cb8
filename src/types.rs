//! Core data types for the properties exporter
//!
//! # Main Types
//!
//! - [`NodeHandle`] - Opaque identifier of a device-network node, with a null value
//! - [`NodeStatus`] - Node state as reported by the device network
//! - [`Transport`] - How a node is attached to the device network
//! - [`SampleRow`] - One timestamped capture of all dump properties

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Column header of the wall-clock timestamp column
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// Column header of the elapsed-milliseconds column
pub const ELAPSED_COLUMN: &str = "ElapsedTime_ms";

/// Number of leading columns that precede the property values in every row
pub const LEADING_COLUMNS: usize = 2;

/// Format of the timestamp cell of each sample row
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Opaque identifier of a node in the device network
///
/// The handle is owned by the device network; the value `0` is reserved as
/// the null handle meaning "no node". A handle may go stale at any time, in
/// which case operations on it fail through the [`DeviceNetwork`] seam.
///
/// [`DeviceNetwork`]: crate::backend::DeviceNetwork
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeHandle(u32);

impl NodeHandle {
    /// The distinguished "no node" value
    pub const NULL: NodeHandle = NodeHandle(0);

    /// Wrap a raw identifier
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw identifier
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check whether this is the null handle
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Convert to `None` for the null handle
    pub fn non_null(self) -> Option<NodeHandle> {
        if self.is_null() {
            None
        } else {
            Some(self)
        }
    }
}

impl Default for NodeHandle {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null node")
        } else {
            write!(f, "node #{}", self.0)
        }
    }
}

/// Status of a node in the device network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Not claimed by any task, eligible for property operations
    #[default]
    Idle,
    /// A task is currently running on the node
    Busy,
    /// The node is being torn down or is otherwise unusable
    Invalid,
}

impl NodeStatus {
    /// Only idle nodes are discovery candidates
    pub fn is_idle(self) -> bool {
        self == NodeStatus::Idle
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeStatus::Idle => write!(f, "Idle"),
            NodeStatus::Busy => write!(f, "Busy"),
            NodeStatus::Invalid => write!(f, "Invalid"),
        }
    }
}

/// How a node is attached to the device network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Locally attached USB device
    #[default]
    Usb,
    /// Device reachable over IP
    Ip,
}

/// One captured sample: `[timestamp, elapsed_ms, value_1, ..., value_n]`
///
/// Values are positionally matched to the dump property order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRow {
    cells: Vec<String>,
}

impl SampleRow {
    /// Start a row with its leading timestamp and elapsed-time cells
    pub fn new(timestamp: impl Into<String>, elapsed: Duration, value_count: usize) -> Self {
        let mut cells = Vec::with_capacity(LEADING_COLUMNS + value_count);
        cells.push(timestamp.into());
        cells.push(elapsed.as_millis().to_string());
        Self { cells }
    }

    /// Build a row directly from its cells
    pub fn from_cells(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Append the next property value
    pub fn push_value(&mut self, value: impl Into<String>) {
        self.cells.push(value.into());
    }

    /// All cells, in column order
    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    /// Timestamp cell
    pub fn timestamp(&self) -> Option<&str> {
        self.cells.first().map(String::as_str)
    }

    /// Elapsed milliseconds since sampling start
    pub fn elapsed_ms(&self) -> Option<u128> {
        self.cells.get(1).and_then(|c| c.parse().ok())
    }

    /// Property values (everything after the leading columns)
    pub fn values(&self) -> &[String] {
        self.cells.get(LEADING_COLUMNS..).unwrap_or(&[])
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the row has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Consume the row and return its cells
    pub fn into_cells(self) -> Vec<String> {
        self.cells
    }
}
