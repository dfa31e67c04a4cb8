//! Simulated network construction helpers

use properties_exporter::backend::{SimulatedNetwork, SimulatedNode, ValuePattern};
use properties_exporter::NetworkFilter;

/// Hardware name every test target carries
pub const TARGET_NAME: &str = "Tag";

/// An idle USB node identifying as the test target with a `temp` property
pub fn target_node(id: u32) -> SimulatedNode {
    SimulatedNode::new(id)
        .with_property("sys/HardwareName", TARGET_NAME)
        .with_property("temp", ValuePattern::Counter { start: 20, step: 1 })
}

/// A node that identifies as something else
pub fn other_node(id: u32) -> SimulatedNode {
    SimulatedNode::new(id)
        .with_property("sys/HardwareName", "Bracer")
        .with_property("temp", "0")
}

/// USB-only network containing `nodes` in enumeration order
pub fn create_test_network(nodes: Vec<SimulatedNode>) -> SimulatedNetwork {
    let network = SimulatedNetwork::new(NetworkFilter::usb_only());
    for node in nodes {
        network.add_node(node).expect("unique node ids");
    }
    network
}
