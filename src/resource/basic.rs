//! Resource manager driven by static per-node configuration.
//!
//! The numbers come from the `resource-report` object of the node's
//! configuration document:
//!
//! ```json
//! {
//!   "resource-report": {
//!     "serverCapacity": { "CPU": 8, "TASK_CONTAINERS": 4 },
//!     "serverLoad": { "web": { "CPU": 2.5 } },
//!     "serverAverageProcessingTime": { "web": 12.0 },
//!     "networkLoad": { "*": { "DATARATE": 100 }, "nodeB": { "DATARATE": 250 } }
//!   }
//! }
//! ```

use super::clock::Clock;
use super::manager::{ContainerParameters, ResourceManager};
use crate::attributes::{LinkAttribute, NodeAttribute};
use crate::identifiers::{ContainerIdentifier, NodeIdentifier, ServiceIdentifier};
use crate::node::extra_data::RESOURCE_REPORT_KEY;
use crate::node::NodeHandle;
use crate::report::{
    ContainerResourceReport, EstimationWindow, LinkAttributeMap, NodeAttributeMap, NodeLinkMap, ResourceReport,
    ServiceLoadMap, ServiceReport, ServiceState, ServiceStatus,
};
use crate::sync::lock;
use log::{info, warn};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

pub const SERVER_CAPACITY_KEY: &str = "serverCapacity";
pub const SERVER_LOAD_KEY: &str = "serverLoad";
pub const SERVER_AVG_PROC_TIME_KEY: &str = "serverAverageProcessingTime";
pub const NETWORK_LOAD_KEY: &str = "networkLoad";

/// `networkLoad` entry applied to every neighbor without its own entry
pub const NETWORK_LOAD_WILDCARD: &str = "*";

#[derive(Debug)]
struct RunningContainer {
    service: ServiceIdentifier,
    parameters: ContainerParameters,
}

#[derive(Debug, Default)]
struct ContainerTable {
    next_id: u64,
    running: BTreeMap<ContainerIdentifier, RunningContainer>,
}

impl ContainerTable {
    fn next_name(&mut self) -> ContainerIdentifier {
        let id = ContainerIdentifier::new(format!("Container-{}", self.next_id));
        self.next_id += 1;
        id
    }
}

pub struct BasicResourceManager {
    node: Arc<NodeHandle>,
    clock: Arc<dyn Clock>,
    server_capacity: NodeAttributeMap,
    /// service -> attributes, keyed under the node's region when reported
    server_load: BTreeMap<ServiceIdentifier, NodeAttributeMap>,
    average_processing_time: BTreeMap<ServiceIdentifier, f64>,
    network_load: NodeLinkMap,
    containers: Mutex<ContainerTable>,
}

impl BasicResourceManager {
    /// Build a manager from a node configuration document.
    ///
    /// Entries that do not parse are logged and skipped; the rest of the
    /// document is still used.
    pub fn new(node: Arc<NodeHandle>, config: &Value, clock: Arc<dyn Clock>) -> Self {
        let name = node.id().clone();
        let section = config.get(RESOURCE_REPORT_KEY).and_then(Value::as_object);

        let (server_capacity, server_load, average_processing_time, network_load) = match section {
            Some(values) => (
                parse_server_capacity(&name, values),
                parse_server_load(&name, values),
                parse_average_processing_time(&name, values),
                parse_network_load(&name, values),
            ),
            None => Default::default(),
        };

        Self {
            node,
            clock,
            server_capacity,
            server_load,
            average_processing_time,
            network_load,
            containers: Mutex::new(ContainerTable::default()),
        }
    }

    /// Configured load for each current neighbor. An entry naming the
    /// neighbor wins over the wildcard entry.
    fn neighbor_link_load(&self) -> NodeLinkMap {
        let wildcard = self.network_load.get(&NodeIdentifier::new(NETWORK_LOAD_WILDCARD));
        self.node
            .neighbors()
            .into_keys()
            .filter_map(|neighbor| {
                let load = self.network_load.get(&neighbor).or(wildcard)?.clone();
                Some((neighbor, load))
            })
            .collect()
    }

    fn container_limit(&self) -> Option<usize> {
        self.server_capacity
            .get(&NodeAttribute::TaskContainers)
            .map(|limit| limit.max(0.0).floor() as usize)
    }
}

impl ResourceManager for BasicResourceManager {
    fn node(&self) -> &NodeIdentifier {
        self.node.id()
    }

    fn current_resource_report(&self, window: EstimationWindow) -> ResourceReport {
        let timestamp = self.clock.current_time_millis();
        let region = self.node.region();

        let server_load: ServiceLoadMap = self
            .server_load
            .iter()
            .map(|(service, load)| (service.clone(), BTreeMap::from([(region.clone(), load.clone())])))
            .collect();
        let network_load = self.neighbor_link_load();

        let container_reports = lock(&self.containers)
            .running
            .iter()
            .map(|(container, running)| {
                let average = self
                    .average_processing_time
                    .get(&running.service)
                    .copied()
                    .unwrap_or(0.0);
                ContainerResourceReport::new(container.clone(), timestamp, window)
                    .with_service(running.service.clone())
                    .with_compute_capacity(running.parameters.compute_capacity.clone())
                    .with_average_processing_time(average)
            })
            .collect();

        ResourceReport::new(self.node.id().clone(), timestamp, window)
            .with_server_capacity(self.server_capacity.clone())
            .with_server_load(server_load.clone())
            .with_server_demand(server_load)
            .with_network_capacity(self.node.neighbor_link_capacity())
            .with_network_load(network_load.clone())
            .with_network_demand(network_load)
            .with_container_reports(container_reports)
    }

    fn service_report(&self) -> ServiceReport {
        let state = lock(&self.containers)
            .running
            .iter()
            .map(|(container, running)| {
                (
                    container.clone(),
                    ServiceState::new(running.service.clone(), ServiceStatus::Running),
                )
            })
            .collect();
        ServiceReport::new(self.node.id().clone(), state)
    }

    fn start_service(&self, service: &ServiceIdentifier, parameters: &ContainerParameters) -> Option<ContainerIdentifier> {
        let mut table = lock(&self.containers);

        if let Some(limit) = self.container_limit() {
            if table.running.len() >= limit {
                warn!(
                    "startService failed on {}: all {} task containers are in use",
                    self.node.id(),
                    limit
                );
                return None;
            }
        }

        let container = table.next_name();
        if table.running.contains_key(&container) {
            warn!(
                "startService failed on {}: container {} is already running a service",
                self.node.id(),
                container
            );
            return None;
        }

        info!("Started service {} in container {} on {}", service, container, self.node.id());
        table.running.insert(
            container.clone(),
            RunningContainer {
                service: service.clone(),
                parameters: parameters.clone(),
            },
        );
        Some(container)
    }

    fn stop_service(&self, container: &ContainerIdentifier) -> bool {
        match lock(&self.containers).running.remove(container) {
            Some(running) => {
                info!("Stopped service {} in container {} on {}", running.service, container, self.node.id());
                true
            }
            None => {
                warn!(
                    "stopService failed on {}: container {} is not running a service",
                    self.node.id(),
                    container
                );
                false
            }
        }
    }

    fn compute_capacity(&self) -> NodeAttributeMap {
        self.server_capacity.clone()
    }
}

impl std::fmt::Debug for BasicResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicResourceManager")
            .field("node", self.node.id())
            .field("server_capacity", &self.server_capacity)
            .finish_non_exhaustive()
    }
}

/// Keep the entries whose key parses as an attribute and whose value is a number
fn parse_attribute_map<A>(node: &NodeIdentifier, source: &Map<String, Value>) -> BTreeMap<A, f64>
where
    A: FromStr + Ord,
{
    let mut parsed = BTreeMap::new();
    for (key, value) in source {
        let Ok(attribute) = key.parse::<A>() else {
            warn!(
                "While parsing resource report for node {} '{}' does not parse as an attribute, ignoring",
                node, key
            );
            continue;
        };
        match value.as_f64() {
            Some(number) => {
                parsed.insert(attribute, number);
            }
            None => warn!(
                "While parsing resource report for node {} the value of '{}' is not a number, ignoring",
                node, key
            ),
        }
    }
    parsed
}

fn parse_server_capacity(node: &NodeIdentifier, values: &Map<String, Value>) -> NodeAttributeMap {
    values
        .get(SERVER_CAPACITY_KEY)
        .and_then(Value::as_object)
        .map(|map| parse_attribute_map::<NodeAttribute>(node, map))
        .unwrap_or_default()
}

fn parse_server_load(node: &NodeIdentifier, values: &Map<String, Value>) -> BTreeMap<ServiceIdentifier, NodeAttributeMap> {
    let Some(services) = values.get(SERVER_LOAD_KEY).and_then(Value::as_object) else {
        return BTreeMap::new();
    };

    let mut parsed = BTreeMap::new();
    for (service, load) in services {
        match load.as_object() {
            Some(map) => {
                parsed.insert(
                    ServiceIdentifier::new(service.as_str()),
                    parse_attribute_map::<NodeAttribute>(node, map),
                );
            }
            None => warn!(
                "While parsing resource report for node {} the service {} doesn't have valid load data",
                node, service
            ),
        }
    }
    parsed
}

fn parse_average_processing_time(node: &NodeIdentifier, values: &Map<String, Value>) -> BTreeMap<ServiceIdentifier, f64> {
    let Some(services) = values.get(SERVER_AVG_PROC_TIME_KEY).and_then(Value::as_object) else {
        return BTreeMap::new();
    };

    services
        .iter()
        .filter_map(|(service, value)| match value.as_f64() {
            Some(millis) => Some((ServiceIdentifier::new(service.as_str()), millis)),
            None => {
                warn!(
                    "While parsing resource report for node {} the processing time of {} is not a number, ignoring",
                    node, service
                );
                None
            }
        })
        .collect()
}

fn parse_network_load(node: &NodeIdentifier, values: &Map<String, Value>) -> NodeLinkMap {
    let Some(neighbors) = values.get(NETWORK_LOAD_KEY).and_then(Value::as_object) else {
        return NodeLinkMap::new();
    };

    let mut parsed = NodeLinkMap::new();
    for (neighbor, load) in neighbors {
        match load.as_object() {
            Some(map) => {
                let attributes: LinkAttributeMap = parse_attribute_map::<LinkAttribute>(node, map);
                parsed.insert(NodeIdentifier::new(neighbor.as_str()), attributes);
            }
            None => warn!(
                "While parsing resource report for node {} the neighbor {} doesn't have valid load data",
                node, neighbor
            ),
        }
    }
    parsed
}
