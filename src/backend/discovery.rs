//! Target device discovery
//!
//! Polls the device network until an idle node matches the target rules or
//! the discovery deadline passes. The deadline is always wall-clock time
//! since the loop started; the optional pause between passes only bounds
//! CPU usage.

use super::matcher::DeviceMatcher;
use super::network::DeviceNetwork;
use crate::config::{RunSettings, TargetPropertyRules};
use crate::types::NodeHandle;
use std::time::{Duration, Instant};

/// Repeatedly scans the device network for the target device
pub struct Discovery<'a, N: DeviceNetwork + ?Sized> {
    matcher: DeviceMatcher<'a, N>,
    network: &'a N,
    poll_interval: Duration,
}

impl<'a, N: DeviceNetwork + ?Sized> Discovery<'a, N> {
    /// Create a discovery loop with busy polling
    pub fn new(network: &'a N, rules: &'a TargetPropertyRules) -> Self {
        Self {
            matcher: DeviceMatcher::new(network, rules),
            network,
            poll_interval: Duration::ZERO,
        }
    }

    /// Create a discovery loop using the run's polling interval
    pub fn from_settings(
        network: &'a N,
        rules: &'a TargetPropertyRules,
        settings: &RunSettings,
    ) -> Self {
        Self::new(network, rules).with_poll_interval(settings.discovery_poll_interval())
    }

    /// Pause between polling passes
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Scan one snapshot of the network, returning the first matching idle node
    pub fn scan_once(&self) -> Option<NodeHandle> {
        self.network
            .nodes()
            .into_iter()
            .filter(|&node| self.matcher.is_candidate(node))
            .find(|&node| self.matcher.matches_target(node))
    }

    /// Poll until a matching node is found or `timeout` elapses
    ///
    /// Returns [`NodeHandle::NULL`] when nothing matched in time; that is a
    /// normal outcome, not an error. A zero timeout performs no pass at all.
    pub fn wait_for_target(&self, timeout: Duration) -> NodeHandle {
        let start = Instant::now();
        let mut passes: u64 = 0;

        while start.elapsed() < timeout {
            passes += 1;
            if let Some(node) = self.scan_once() {
                tracing::info!(
                    "Found target device {} after {} ms ({} passes)",
                    node,
                    start.elapsed().as_millis(),
                    passes
                );
                return node;
            }

            if !self.poll_interval.is_zero() {
                let remaining = timeout.saturating_sub(start.elapsed());
                std::thread::sleep(self.poll_interval.min(remaining));
            }
        }

        tracing::debug!(
            "No target device after {} ms ({} passes)",
            start.elapsed().as_millis(),
            passes
        );
        NodeHandle::NULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::network::MockDeviceNetwork;
    use crate::backend::simulated::{SimulatedNetwork, SimulatedNode};
    use crate::types::NodeStatus;

    fn tag_rules() -> TargetPropertyRules {
        [("sys/HardwareName".to_string(), "Tag".to_string())]
            .into_iter()
            .collect()
    }

    fn tag(id: u32) -> SimulatedNode {
        SimulatedNode::new(id).with_property("sys/HardwareName", "Tag")
    }

    #[test]
    fn test_zero_timeout_returns_null_immediately() {
        let mut network = MockDeviceNetwork::new();
        network.expect_nodes().never();
        let rules = tag_rules();

        let start = Instant::now();
        let found = Discovery::new(&network, &rules).wait_for_target(Duration::ZERO);
        assert!(found.is_null());
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_timeout_without_match() {
        let network = SimulatedNetwork::default();
        network
            .add_node(SimulatedNode::new(1).with_property("sys/HardwareName", "Other"))
            .unwrap();
        let rules = tag_rules();

        let start = Instant::now();
        let found = Discovery::new(&network, &rules)
            .with_poll_interval(Duration::from_millis(2))
            .wait_for_target(Duration::from_millis(30));
        assert!(found.is_null());
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_first_match_in_enumeration_order_wins() {
        let network = SimulatedNetwork::default();
        network
            .add_node(SimulatedNode::new(7).with_property("sys/HardwareName", "Other"))
            .unwrap();
        network.add_node(tag(5)).unwrap();
        network.add_node(tag(2)).unwrap();
        let rules = tag_rules();

        let found = Discovery::new(&network, &rules).wait_for_target(Duration::from_secs(1));
        assert_eq!(found, NodeHandle::new(5));
    }

    #[test]
    fn test_skips_busy_nodes() {
        let network = SimulatedNetwork::default();
        network
            .add_node(tag(1).with_status(NodeStatus::Busy))
            .unwrap();
        network.add_node(tag(2)).unwrap();
        let rules = tag_rules();

        let found = Discovery::new(&network, &rules).wait_for_target(Duration::from_secs(1));
        assert_eq!(found, NodeHandle::new(2));
    }

    #[test]
    fn test_finds_node_that_appears_later() {
        let network = SimulatedNetwork::default();
        network
            .add_node(tag(3).appearing_after(Duration::from_millis(30)))
            .unwrap();
        let rules = tag_rules();

        let found = Discovery::new(&network, &rules)
            .with_poll_interval(Duration::from_millis(1))
            .wait_for_target(Duration::from_secs(2));
        assert_eq!(found, NodeHandle::new(3));
    }

    #[test]
    fn test_scan_once_on_empty_network() {
        let network = SimulatedNetwork::default();
        let rules = tag_rules();
        assert_eq!(Discovery::new(&network, &rules).scan_once(), None);
    }
}
