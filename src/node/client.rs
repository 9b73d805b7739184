use super::extra_data;
use super::NodeHandle;
use crate::identifiers::{NodeIdentifier, RegionIdentifier};
use serde_json::Value;
use std::sync::Arc;

/// A client vertex. It takes part in the topology but runs no cycle.
#[derive(Debug, Clone)]
pub struct ClientNode {
    handle: Arc<NodeHandle>,
}

impl ClientNode {
    pub fn new(id: NodeIdentifier) -> Self {
        Self {
            handle: Arc::new(NodeHandle::new(id)),
        }
    }

    pub fn id(&self) -> &NodeIdentifier {
        self.handle.id()
    }

    pub fn handle(&self) -> &Arc<NodeHandle> {
        &self.handle
    }

    pub fn region(&self) -> RegionIdentifier {
        self.handle.region()
    }

    pub fn set_region(&self, region: RegionIdentifier) {
        self.handle.set_region(region);
    }

    /// Apply the `region` entry of a node configuration document
    pub fn process_extra_data(&self, config: &Value) {
        if let Some(region) = extra_data::region_from(config) {
            self.set_region(region);
        }
    }
}
