//! Which services run where, and in what state.

use crate::identifiers::{ContainerIdentifier, NodeIdentifier, ServiceIdentifier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    Starting,
    Running,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceState {
    pub service: ServiceIdentifier,
    pub status: ServiceStatus,
}

impl ServiceState {
    pub fn new(service: ServiceIdentifier, status: ServiceStatus) -> Self {
        Self { service, status }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceReport {
    node: NodeIdentifier,
    service_state: BTreeMap<ContainerIdentifier, ServiceState>,
}

impl ServiceReport {
    pub fn new(node: NodeIdentifier, service_state: BTreeMap<ContainerIdentifier, ServiceState>) -> Self {
        Self { node, service_state }
    }

    pub fn node(&self) -> &NodeIdentifier {
        &self.node
    }

    pub fn service_state(&self) -> &BTreeMap<ContainerIdentifier, ServiceState> {
        &self.service_state
    }

    /// Containers currently running `service`
    pub fn containers_for(&self, service: &ServiceIdentifier) -> Vec<&ContainerIdentifier> {
        self.service_state
            .iter()
            .filter(|(_, state)| &state.service == service && state.status == ServiceStatus::Running)
            .map(|(container, _)| container)
            .collect()
    }
}
