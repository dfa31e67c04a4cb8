//! Target device matching
//!
//! Pure predicate logic over the device network: whether a node is a
//! discovery candidate at all, and whether it carries every configured
//! target property with the expected value.

use super::network::DeviceNetwork;
use crate::config::TargetPropertyRules;
use crate::types::NodeHandle;

/// Decides which nodes are the configured target device
pub struct DeviceMatcher<'a, N: DeviceNetwork + ?Sized> {
    network: &'a N,
    rules: &'a TargetPropertyRules,
}

impl<'a, N: DeviceNetwork + ?Sized> DeviceMatcher<'a, N> {
    /// Create a matcher for the given rules
    pub fn new(network: &'a N, rules: &'a TargetPropertyRules) -> Self {
        Self { network, rules }
    }

    /// A node is a candidate only while its status is Idle
    pub fn is_candidate(&self, node: NodeHandle) -> bool {
        if node.is_null() {
            return false;
        }
        match self.network.node_status(node) {
            Ok(status) => status.is_idle(),
            Err(e) => {
                tracing::trace!("Skipping {}: {}", node, e);
                false
            }
        }
    }

    /// Check the node against every target rule
    ///
    /// A property task must open on the node, and every rule key must read
    /// back exactly the expected value. Any failure rejects the node; the
    /// first mismatching key stops the check.
    pub fn matches_target(&self, node: NodeHandle) -> bool {
        let _task = match self.network.open_property_task(node) {
            Ok(task) => task,
            Err(e) => {
                tracing::debug!("{} refused a property task: {}", node, e);
                return false;
            }
        };

        for (key, expected) in self.rules {
            match self.network.node_string_property(node, key) {
                Ok(value) if value == *expected => {}
                Ok(value) => {
                    tracing::trace!(
                        "{} does not match: '{}' is '{}', expected '{}'",
                        node,
                        key,
                        value,
                        expected
                    );
                    return false;
                }
                Err(e) => {
                    tracing::trace!("{} does not match: {}", node, e);
                    return false;
                }
            }
        }

        true
    }
}
