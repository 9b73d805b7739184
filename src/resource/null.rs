use super::manager::{ContainerParameters, ResourceManager};
use crate::identifiers::{ContainerIdentifier, NodeIdentifier, ServiceIdentifier};
use crate::report::{EstimationWindow, NodeAttributeMap, ResourceReport, ServiceReport};
use std::collections::BTreeMap;

/// Manager for nodes with nothing to measure: null reports, no services
#[derive(Debug, Clone)]
pub struct NullResourceManager {
    node: NodeIdentifier,
}

impl NullResourceManager {
    pub fn new(node: NodeIdentifier) -> Self {
        Self { node }
    }
}

impl ResourceManager for NullResourceManager {
    fn node(&self) -> &NodeIdentifier {
        &self.node
    }

    fn current_resource_report(&self, window: EstimationWindow) -> ResourceReport {
        ResourceReport::null(self.node.clone(), window)
    }

    fn service_report(&self) -> ServiceReport {
        ServiceReport::new(self.node.clone(), BTreeMap::new())
    }

    fn start_service(&self, _service: &ServiceIdentifier, _parameters: &ContainerParameters) -> Option<ContainerIdentifier> {
        None
    }

    fn stop_service(&self, _container: &ContainerIdentifier) -> bool {
        false
    }

    fn compute_capacity(&self) -> NodeAttributeMap {
        NodeAttributeMap::new()
    }
}
