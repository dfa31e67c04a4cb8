//! Simulated Device Network
//!
//! This module provides an in-process device network that can be used to
//! run the exporter without vendor hardware. It simulates a dynamically
//! enumerated set of nodes with string properties.
//!
//! # Features
//!
//! - **Dynamic enumeration**: nodes can appear after a delay, change status or vanish
//! - **Transport filtering**: IP nodes are hidden unless the filter includes them
//! - **Pattern-based values**: properties can be fixed strings, counters or sine waves
//! - **Failure injection**: a property can start failing after N successful reads,
//!   and a node can refuse grouped reads altogether
//!
//! # Property Patterns
//!
//! - [`SimulatedProperty::Fixed`] - Constant string (identification properties)
//! - [`SimulatedProperty::Pattern`] with [`ValuePattern::Counter`] - Value increases on every read
//! - [`SimulatedProperty::Pattern`] with [`ValuePattern::Sine`] - Sinusoid over network uptime
//!
//! # Fixture Files
//!
//! A network can be described in JSON or TOML and loaded with
//! [`SimulatedNetwork::load`]:
//!
//! ```json
//! {
//!     "nodes": [
//!         {
//!             "id": 1,
//!             "properties": {
//!                 "sys/HardwareName": "Tag",
//!                 "temp": { "pattern": "sine", "frequency": 0.5, "amplitude": 2.0, "offset": 21.0 }
//!             }
//!         },
//!         { "id": 2, "transport": "ip", "status": "busy", "appearAfterMs": 500 }
//!     ]
//! }
//! ```
//!
//! # Task Semantics
//!
//! Opening a property task requires the node to be visible, idle and to
//! support grouped reads. While the task is alive the node reports
//! [`NodeStatus::Busy`]; dropping the task releases the node.

use super::network::{DeviceNetwork, NetworkFilter, PropertyTask};
use crate::config::ConfigFormat;
use crate::error::{ExporterError, Result, ResultExt};
use crate::types::{NodeHandle, NodeStatus, Transport};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Pattern for generating property values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pattern", rename_all = "snake_case")]
pub enum ValuePattern {
    /// Integer that advances by `step` on every successful read
    Counter {
        #[serde(default)]
        start: i64,
        #[serde(default = "default_step")]
        step: i64,
    },
    /// Sine wave over the time since the network was created
    Sine {
        frequency: f64,
        amplitude: f64,
        #[serde(default)]
        offset: f64,
    },
}

fn default_step() -> i64 {
    1
}

fn default_true() -> bool {
    true
}

/// Value source of a simulated property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SimulatedProperty {
    /// Constant string
    Fixed(String),
    /// Generated value
    Pattern(ValuePattern),
}

impl SimulatedProperty {
    /// Value after `reads` successful reads; `None` when a counter overflows
    fn render(&self, reads: u64, uptime: Duration) -> Option<String> {
        match self {
            SimulatedProperty::Fixed(value) => Some(value.clone()),
            SimulatedProperty::Pattern(ValuePattern::Counter { start, step }) => i64::try_from(reads)
                .ok()
                .and_then(|reads| step.checked_mul(reads))
                .and_then(|delta| start.checked_add(delta))
                .map(|value| value.to_string()),
            SimulatedProperty::Pattern(ValuePattern::Sine {
                frequency,
                amplitude,
                offset,
            }) => {
                let t = uptime.as_secs_f64();
                let value =
                    offset + amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin();
                Some(format!("{:.3}", value))
            }
        }
    }
}

impl From<&str> for SimulatedProperty {
    fn from(value: &str) -> Self {
        SimulatedProperty::Fixed(value.to_string())
    }
}

impl From<String> for SimulatedProperty {
    fn from(value: String) -> Self {
        SimulatedProperty::Fixed(value)
    }
}

impl From<ValuePattern> for SimulatedProperty {
    fn from(pattern: ValuePattern) -> Self {
        SimulatedProperty::Pattern(pattern)
    }
}

/// Configuration of one simulated node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedNode {
    /// Raw node identifier (0 is reserved for the null handle)
    pub id: u32,

    /// Initial status
    #[serde(default)]
    pub status: NodeStatus,

    /// How the node is attached
    #[serde(default)]
    pub transport: Transport,

    /// String properties exposed by the node
    #[serde(default)]
    pub properties: BTreeMap<String, SimulatedProperty>,

    /// Whether property tasks can be opened on the node
    #[serde(default = "default_true")]
    pub grouped_reads: bool,

    /// Delay after network creation before the node is enumerated
    #[serde(default)]
    pub appear_after_ms: u64,

    /// Property key to number of successful reads before reads start failing
    #[serde(default)]
    pub fail_after: BTreeMap<String, u64>,
}

impl SimulatedNode {
    /// Create an idle USB node without properties
    pub fn new(id: u32) -> Self {
        Self {
            id,
            status: NodeStatus::Idle,
            transport: Transport::Usb,
            properties: BTreeMap::new(),
            grouped_reads: true,
            appear_after_ms: 0,
            fail_after: BTreeMap::new(),
        }
    }

    /// Handle of this node
    pub fn handle(&self) -> NodeHandle {
        NodeHandle::new(self.id)
    }

    /// Add a property
    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<SimulatedProperty>,
    ) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set the initial status
    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the transport
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Refuse property tasks on this node
    pub fn without_grouped_reads(mut self) -> Self {
        self.grouped_reads = false;
        self
    }

    /// Enumerate the node only after `delay` has passed
    pub fn appearing_after(mut self, delay: Duration) -> Self {
        self.appear_after_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Make reads of `key` fail once `successful_reads` reads have succeeded
    pub fn failing_after(mut self, key: impl Into<String>, successful_reads: u64) -> Self {
        self.fail_after.insert(key.into(), successful_reads);
        self
    }
}

/// Description of a whole simulated network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkFixture {
    /// Nodes in enumeration order
    #[serde(default)]
    pub nodes: Vec<SimulatedNode>,
}

impl NetworkFixture {
    /// Parse a fixture in the given format
    pub fn parse(text: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Json => Ok(serde_json::from_str(text)?),
            ConfigFormat::Toml => Ok(toml::from_str(text)?),
        }
    }
}

#[derive(Debug)]
struct SimState {
    nodes: Vec<SimulatedNode>,
    reads: HashMap<(NodeHandle, String), u64>,
}

impl SimState {
    fn node(&self, handle: NodeHandle) -> Option<&SimulatedNode> {
        self.nodes.iter().find(|n| n.handle() == handle)
    }

    fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut SimulatedNode> {
        self.nodes.iter_mut().find(|n| n.handle() == handle)
    }
}

/// In-process device network
///
/// Cloning yields another handle to the same network, so tests can change
/// node state while discovery or sampling runs elsewhere.
#[derive(Debug, Clone)]
pub struct SimulatedNetwork {
    state: Arc<Mutex<SimState>>,
    filter: NetworkFilter,
    created: Instant,
}

impl Default for SimulatedNetwork {
    fn default() -> Self {
        Self::new(NetworkFilter::default())
    }
}

impl SimulatedNetwork {
    /// Create an empty network
    pub fn new(filter: NetworkFilter) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                nodes: Vec::new(),
                reads: HashMap::new(),
            })),
            filter,
            created: Instant::now(),
        }
    }

    /// Create a network populated from a fixture
    pub fn from_fixture(fixture: NetworkFixture, filter: NetworkFilter) -> Result<Self> {
        let network = Self::new(filter);
        for node in fixture.nodes {
            network.add_node(node)?;
        }
        Ok(network)
    }

    /// Load a fixture file (JSON, or TOML by extension)
    pub fn load(path: impl AsRef<Path>, filter: NetworkFilter) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not open network fixture {}", path.display()))?;
        let fixture = NetworkFixture::parse(&content, ConfigFormat::from_path(path))
            .with_context(|| format!("Invalid network fixture {}", path.display()))?;

        tracing::info!(
            "Loaded simulated device network {:?} with {} node(s)",
            path,
            fixture.nodes.len()
        );
        Self::from_fixture(fixture, filter)
    }

    /// Add a node at the end of the enumeration order
    pub fn add_node(&self, node: SimulatedNode) -> Result<()> {
        if node.handle().is_null() {
            return Err(ExporterError::Config(
                "node id 0 is reserved for the null handle".to_string(),
            ));
        }
        let mut state = self.lock();
        if state.node(node.handle()).is_some() {
            return Err(ExporterError::Config(format!(
                "duplicate simulated node id {}",
                node.id
            )));
        }
        tracing::debug!("Simulated network: added {}", node.handle());
        state.nodes.push(node);
        Ok(())
    }

    /// Remove a node, making its handle stale
    pub fn remove_node(&self, handle: NodeHandle) -> bool {
        let mut state = self.lock();
        let before = state.nodes.len();
        state.nodes.retain(|n| n.handle() != handle);
        before != state.nodes.len()
    }

    /// Change a node's status
    pub fn set_status(&self, handle: NodeHandle, status: NodeStatus) -> bool {
        match self.lock().node_mut(handle) {
            Some(node) => {
                node.status = status;
                true
            }
            None => false,
        }
    }

    /// Number of successful reads of `key` on a node
    pub fn read_count(&self, handle: NodeHandle, key: &str) -> u64 {
        self.lock()
            .reads
            .get(&(handle, key.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_visible(&self, node: &SimulatedNode) -> bool {
        self.filter.accepts(node.transport)
            && self.created.elapsed() >= Duration::from_millis(node.appear_after_ms)
    }

    fn read(&self, handle: NodeHandle, key: &str) -> Result<String> {
        let uptime = self.created.elapsed();
        let mut state = self.lock();

        let node = state
            .node(handle)
            .filter(|n| self.is_visible(n))
            .ok_or(ExporterError::NodeUnavailable(handle))?;
        let property = node
            .properties
            .get(key)
            .cloned()
            .ok_or_else(|| ExporterError::property(handle, key, "property not found"))?;
        let limit = node.fail_after.get(key).copied();

        let reads = state.reads.entry((handle, key.to_string())).or_insert(0);
        if limit.is_some_and(|limit| *reads >= limit) {
            return Err(ExporterError::property(handle, key, "device stopped responding"));
        }
        let value = property
            .render(*reads, uptime)
            .ok_or_else(|| ExporterError::property(handle, key, "counter overflowed"))?;
        *reads += 1;
        Ok(value)
    }

    fn release(&self, handle: NodeHandle) {
        if let Some(node) = self.lock().node_mut(handle) {
            if node.status == NodeStatus::Busy {
                node.status = NodeStatus::Idle;
            }
        }
    }
}

impl DeviceNetwork for SimulatedNetwork {
    fn nodes(&self) -> Vec<NodeHandle> {
        self.lock()
            .nodes
            .iter()
            .filter(|n| self.is_visible(n))
            .map(SimulatedNode::handle)
            .collect()
    }

    fn node_status(&self, node: NodeHandle) -> Result<NodeStatus> {
        self.lock()
            .node(node)
            .filter(|n| self.is_visible(n))
            .map(|n| n.status)
            .ok_or(ExporterError::NodeUnavailable(node))
    }

    fn node_string_property(&self, node: NodeHandle, key: &str) -> Result<String> {
        self.read(node, key)
    }

    fn open_property_task(&self, node: NodeHandle) -> Result<Box<dyn PropertyTask>> {
        {
            let mut state = self.lock();
            let visible = state.node(node).is_some_and(|n| self.is_visible(n));
            let entry = match state.node_mut(node) {
                Some(entry) if visible => entry,
                _ => return Err(ExporterError::NodeUnavailable(node)),
            };
            if !entry.grouped_reads || entry.status != NodeStatus::Idle {
                return Err(ExporterError::TaskUnavailable(node));
            }
            entry.status = NodeStatus::Busy;
        }

        Ok(Box::new(SimulatedTask {
            network: self.clone(),
            node,
        }))
    }
}

/// Property task on a simulated node; releases the node on drop
struct SimulatedTask {
    network: SimulatedNetwork,
    node: NodeHandle,
}

impl PropertyTask for SimulatedTask {
    fn node(&self) -> NodeHandle {
        self.node
    }

    fn string_property(&mut self, key: &str) -> Result<String> {
        self.network.read(self.node, key)
    }
}

impl Drop for SimulatedTask {
    fn drop(&mut self) {
        self.network.release(self.node);
    }
}
