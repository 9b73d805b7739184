//! Per-node resource snapshot.

use super::{ContainerResourceReport, NodeAttributeMap, NodeLinkMap, ServiceLoadMap};
use crate::identifiers::NodeIdentifier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp carried by reports and summaries that hold no measurements
pub const NULL_TIMESTAMP: i64 = -1;

/// How far ahead a demand estimate looks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstimationWindow {
    #[default]
    Short,
    Long,
}

impl fmt::Display for EstimationWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimationWindow::Short => f.write_str("SHORT"),
            EstimationWindow::Long => f.write_str("LONG"),
        }
    }
}

/// Snapshot of one node's compute and network usage.
///
/// Built once per cycle by a resource manager and never modified afterward.
/// Use the `with_*` methods while constructing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReport {
    node: NodeIdentifier,
    timestamp: i64,
    demand_estimation_window: EstimationWindow,
    server_capacity: NodeAttributeMap,
    server_load: ServiceLoadMap,
    server_demand: ServiceLoadMap,
    network_capacity: NodeLinkMap,
    network_load: NodeLinkMap,
    network_demand: NodeLinkMap,
    container_reports: Vec<ContainerResourceReport>,
}

impl ResourceReport {
    pub fn new(node: NodeIdentifier, timestamp: i64, window: EstimationWindow) -> Self {
        Self {
            node,
            timestamp,
            demand_estimation_window: window,
            server_capacity: NodeAttributeMap::new(),
            server_load: ServiceLoadMap::new(),
            server_demand: ServiceLoadMap::new(),
            network_capacity: NodeLinkMap::new(),
            network_load: NodeLinkMap::new(),
            network_demand: NodeLinkMap::new(),
            container_reports: Vec::new(),
        }
    }

    /// An empty report for nodes that have nothing to measure yet
    pub fn null(node: NodeIdentifier, window: EstimationWindow) -> Self {
        Self::new(node, NULL_TIMESTAMP, window)
    }

    pub fn is_null(&self) -> bool {
        self.timestamp == NULL_TIMESTAMP
    }

    pub fn with_server_capacity(mut self, capacity: NodeAttributeMap) -> Self {
        self.server_capacity = capacity;
        self
    }

    pub fn with_server_load(mut self, load: ServiceLoadMap) -> Self {
        self.server_load = load;
        self
    }

    pub fn with_server_demand(mut self, demand: ServiceLoadMap) -> Self {
        self.server_demand = demand;
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

    pub fn with_container_reports(mut self, reports: Vec<ContainerResourceReport>) -> Self {
        self.container_reports = reports;
        self
    }

    pub fn node(&self) -> &NodeIdentifier {
        &self.node
    }

    /// Milliseconds since the epoch, or [`NULL_TIMESTAMP`]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn demand_estimation_window(&self) -> EstimationWindow {
        self.demand_estimation_window
    }

    pub fn server_capacity(&self) -> &NodeAttributeMap {
        &self.server_capacity
    }

    pub fn server_load(&self) -> &ServiceLoadMap {
        &self.server_load
    }

    pub fn server_demand(&self) -> &ServiceLoadMap {
        &self.server_demand
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

    pub fn container_reports(&self) -> &[ContainerResourceReport] {
        &self.container_reports
    }
}
