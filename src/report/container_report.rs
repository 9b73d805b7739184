//! Per-container resource snapshot, nested inside a node report.

use super::{EstimationWindow, NodeAttributeMap, NodeComputeMap, NodeLinkMap, NULL_TIMESTAMP};
use crate::identifiers::{ContainerIdentifier, ServiceIdentifier};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerResourceReport {
    container: ContainerIdentifier,
    service: Option<ServiceIdentifier>,
    timestamp: i64,
    demand_estimation_window: EstimationWindow,
    compute_capacity: NodeAttributeMap,
    /// Keyed by the client node that generated the load
    compute_load: NodeComputeMap,
    compute_demand: NodeComputeMap,
    average_processing_time: f64,
    network_capacity: NodeLinkMap,
    network_load: NodeLinkMap,
    network_demand: NodeLinkMap,
}

impl ContainerResourceReport {
    pub fn new(container: ContainerIdentifier, timestamp: i64, window: EstimationWindow) -> Self {
        Self {
            container,
            service: None,
            timestamp,
            demand_estimation_window: window,
            compute_capacity: NodeAttributeMap::new(),
            compute_load: NodeComputeMap::new(),
            compute_demand: NodeComputeMap::new(),
            average_processing_time: 0.0,
            network_capacity: NodeLinkMap::new(),
            network_load: NodeLinkMap::new(),
            network_demand: NodeLinkMap::new(),
        }
    }

    pub fn null(container: ContainerIdentifier, window: EstimationWindow) -> Self {
        Self::new(container, NULL_TIMESTAMP, window)
    }

    pub fn with_service(mut self, service: ServiceIdentifier) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_compute_capacity(mut self, capacity: NodeAttributeMap) -> Self {
        self.compute_capacity = capacity;
        self
    }

    pub fn with_compute_load(mut self, load: NodeComputeMap) -> Self {
        self.compute_load = load;
        self
    }

    pub fn with_compute_demand(mut self, demand: NodeComputeMap) -> Self {
        self.compute_demand = demand;
        self
    }

    pub fn with_average_processing_time(mut self, millis: f64) -> Self {
        self.average_processing_time = millis;
        self
    }

    pub fn with_network_capacity(mut self, capacity: NodeLinkMap) -> Self {
        self.network_capacity = capacity;
        self
    }

    pub fn with_network_load(mut self, load: NodeLinkMap) -> Self {
        self.network_load = load;
        self
    }

    pub fn with_network_demand(mut self, demand: NodeLinkMap) -> Self {
        self.network_demand = demand;
        self
    }

    pub fn container(&self) -> &ContainerIdentifier {
        &self.container
    }

    pub fn service(&self) -> Option<&ServiceIdentifier> {
        self.service.as_ref()
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn demand_estimation_window(&self) -> EstimationWindow {
        self.demand_estimation_window
    }

    pub fn compute_capacity(&self) -> &NodeAttributeMap {
        &self.compute_capacity
    }

    pub fn compute_load(&self) -> &NodeComputeMap {
        &self.compute_load
    }

    pub fn compute_demand(&self) -> &NodeComputeMap {
        &self.compute_demand
    }

    /// Milliseconds spent per request, averaged over the reporting period
    pub fn average_processing_time(&self) -> f64 {
        self.average_processing_time
    }

    pub fn network_capacity(&self) -> &NodeLinkMap {
        &self.network_capacity
    }

    pub fn network_load(&self) -> &NodeLinkMap {
        &self.network_load
    }

    pub fn network_demand(&self) -> &NodeLinkMap {
        &self.network_demand
    }
}
