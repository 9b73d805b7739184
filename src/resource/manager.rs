use crate::identifiers::{ContainerIdentifier, NodeIdentifier, ServiceIdentifier};
use crate::report::{EstimationWindow, LinkAttributeMap, NodeAttributeMap, ResourceReport, ServiceReport};

/// Resources requested for a new container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerParameters {
    pub compute_capacity: NodeAttributeMap,
    pub network_capacity: LinkAttributeMap,
}

/// Measures a node and places services on it.
///
/// Implementations are shared between the node's execution thread and
/// callers on other threads, so every method takes `&self`.
pub trait ResourceManager: Send + Sync {
    fn node(&self) -> &NodeIdentifier;

    /// Snapshot of the node's current usage. Never absent; a manager with
    /// nothing to report returns a null report.
    fn current_resource_report(&self, window: EstimationWindow) -> ResourceReport;

    fn service_report(&self) -> ServiceReport;

    /// Start `service` in a new container.
    ///
    /// # Returns
    /// * `Some(container)` - the container now running the service
    /// * `None` - the container could not be allocated
    fn start_service(&self, service: &ServiceIdentifier, parameters: &ContainerParameters) -> Option<ContainerIdentifier>;

    /// Stop a container. Returns `false` if it was not running.
    fn stop_service(&self, container: &ContainerIdentifier) -> bool;

    fn compute_capacity(&self) -> NodeAttributeMap;
}
