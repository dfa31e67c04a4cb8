//! Capability validation of the discovered node
//!
//! Before a sampling run commits to a sink, the target node must prove it
//! can supply every dump property. The reads made here are throwaway.

use super::network::DeviceNetwork;
use crate::config::DumpPropertySpec;
use crate::error::{ExporterError, Result};
use crate::types::NodeHandle;

/// Confirms a node can supply every property to be dumped
pub struct CapabilityValidator<'a, N: DeviceNetwork + ?Sized> {
    network: &'a N,
}

impl<'a, N: DeviceNetwork + ?Sized> CapabilityValidator<'a, N> {
    /// Create a validator
    pub fn new(network: &'a N) -> Self {
        Self { network }
    }

    /// Read every dump property once, in order, through one property task
    ///
    /// Fails on the first property that cannot be read. The task is released
    /// before returning.
    pub fn check(&self, node: NodeHandle, spec: &DumpPropertySpec) -> Result<()> {
        if node.is_null() {
            return Err(ExporterError::NodeUnavailable(node));
        }

        let mut task = self.network.open_property_task(node)?;
        for name in spec.property_names() {
            task.string_property(name).map_err(|e| {
                tracing::debug!("Capability read failed: {}", e);
                ExporterError::CapabilityMismatch {
                    node,
                    property: name.to_string(),
                }
            })?;
        }

        tracing::debug!("{} supplies all {} dump properties", node, spec.len());
        Ok(())
    }

    /// Binary form of [`check`](Self::check)
    pub fn validate(&self, node: NodeHandle, spec: &DumpPropertySpec) -> bool {
        match self.check(node, spec) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Validation of {} failed: {}", node, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::network::{MockDeviceNetwork, MockPropertyTask, PropertyTask};
    use crate::backend::simulated::{SimulatedNetwork, SimulatedNode};
    use crate::config::DumpProperty;
    use crate::types::NodeStatus;
    use std::sync::{Arc, Mutex};

    fn spec(names: &[&str]) -> DumpPropertySpec {
        DumpPropertySpec::new(names.iter().map(|n| DumpProperty::new(*n)).collect())
    }

    #[test]
    fn test_null_node_fails() {
        let mut network = MockDeviceNetwork::new();
        network.expect_open_property_task().never();

        let validator = CapabilityValidator::new(&network);
        assert!(!validator.validate(NodeHandle::NULL, &spec(&["temp"])));
    }

    #[test]
    fn test_task_refusal_fails() {
        let mut network = MockDeviceNetwork::new();
        network
            .expect_open_property_task()
            .returning(|node| Err(ExporterError::TaskUnavailable(node)));

        let validator = CapabilityValidator::new(&network);
        assert!(matches!(
            validator.check(NodeHandle::new(1), &spec(&["temp"])),
            Err(ExporterError::TaskUnavailable(_))
        ));
    }

    #[test]
    fn test_reads_every_property_in_order() {
        let read_log = Arc::new(Mutex::new(Vec::new()));
        let log = read_log.clone();

        let mut network = MockDeviceNetwork::new();
        network.expect_open_property_task().return_once(move |node| {
            let mut task = MockPropertyTask::new();
            task.expect_node().return_const(node);
            task.expect_string_property().returning(move |key| {
                log.lock().unwrap().push(key.to_string());
                Ok("1".to_string())
            });
            Ok(Box::new(task) as Box<dyn PropertyTask>)
        });

        let validator = CapabilityValidator::new(&network);
        assert!(validator.validate(NodeHandle::new(1), &spec(&["c", "a", "b"])));
        assert_eq!(*read_log.lock().unwrap(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_missing_property_names_the_culprit() {
        let network = SimulatedNetwork::default();
        network
            .add_node(SimulatedNode::new(1).with_property("temp", "20"))
            .unwrap();

        let err = CapabilityValidator::new(&network)
            .check(NodeHandle::new(1), &spec(&["temp", "humidity"]))
            .unwrap_err();
        assert!(matches!(
            err,
            ExporterError::CapabilityMismatch { ref property, .. } if property == "humidity"
        ));
    }

    #[test]
    fn test_task_released_after_validation() {
        let network = SimulatedNetwork::default();
        network
            .add_node(SimulatedNode::new(1).with_property("temp", "20"))
            .unwrap();
        let node = NodeHandle::new(1);

        assert!(CapabilityValidator::new(&network).validate(node, &spec(&["temp"])));
        assert_eq!(network.node_status(node).unwrap(), NodeStatus::Idle);
        assert_eq!(network.read_count(node, "temp"), 1);
    }
}
