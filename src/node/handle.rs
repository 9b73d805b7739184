//! Identity and wiring shared by a node and its collaborators.

use crate::attributes::LinkAttribute;
use crate::identifiers::{NodeIdentifier, RegionIdentifier};
use crate::report::{LinkAttributeMap, NodeLinkMap};
use crate::sync::{read, write};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// A graph vertex: name, region and neighbor bandwidths.
///
/// Shared through an `Arc` by the node, its resource manager and its network
/// manager. The neighbor map is filled in while the topology is parsed.
#[derive(Debug)]
pub struct NodeHandle {
    id: NodeIdentifier,
    region: RwLock<RegionIdentifier>,
    /// neighbor -> bandwidth in bytes/second
    neighbors: RwLock<BTreeMap<NodeIdentifier, f64>>,
    pool: AtomicBool,
    hardware: RwLock<Option<String>>,
}

impl NodeHandle {
    pub fn new(id: NodeIdentifier) -> Self {
        Self {
            id,
            region: RwLock::new(RegionIdentifier::null()),
            neighbors: RwLock::new(BTreeMap::new()),
            pool: AtomicBool::new(false),
            hardware: RwLock::new(None),
        }
    }

    pub fn id(&self) -> &NodeIdentifier {
        &self.id
    }

    pub fn region(&self) -> RegionIdentifier {
        read(&self.region).clone()
    }

    pub(crate) fn set_region(&self, region: RegionIdentifier) {
        *write(&self.region) = region;
    }

    /// Record a link to `neighbor`. A second link to the same neighbor
    /// replaces the bandwidth of the first.
    pub fn add_neighbor(&self, neighbor: NodeIdentifier, bandwidth: f64) {
        write(&self.neighbors).insert(neighbor, bandwidth);
    }

    pub fn has_neighbor(&self, neighbor: &NodeIdentifier) -> bool {
        read(&self.neighbors).contains_key(neighbor)
    }

    pub fn neighbors(&self) -> BTreeMap<NodeIdentifier, f64> {
        read(&self.neighbors).clone()
    }

    /// Neighbor bandwidths as link attributes
    pub fn neighbor_link_capacity(&self) -> NodeLinkMap {
        read(&self.neighbors)
            .iter()
            .map(|(neighbor, bandwidth)| {
                (neighbor.clone(), LinkAttributeMap::from([(LinkAttribute::Datarate, *bandwidth)]))
            })
            .collect()
    }

    pub fn is_pool(&self) -> bool {
        self.pool.load(Ordering::SeqCst)
    }

    pub fn set_pool(&self, pool: bool) {
        self.pool.store(pool, Ordering::SeqCst);
    }

    /// Hardware or OS label from the topology, if any
    pub fn hardware(&self) -> Option<String> {
        read(&self.hardware).clone()
    }

    pub fn set_hardware(&self, hardware: impl Into<String>) {
        *write(&self.hardware) = Some(hardware.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_handle_is_in_null_region() {
        let handle = NodeHandle::new(NodeIdentifier::new("n"));
        assert!(handle.region().is_null());
        assert!(!handle.is_pool());
        assert_eq!(handle.hardware(), None);
    }

    #[test]
    fn test_neighbor_link_capacity() {
        let handle = NodeHandle::new(NodeIdentifier::new("n"));
        handle.add_neighbor(NodeIdentifier::new("m"), 1024.0);

        assert!(handle.has_neighbor(&NodeIdentifier::new("m")));
        let capacity = handle.neighbor_link_capacity();
        assert_eq!(capacity[&NodeIdentifier::new("m")][&LinkAttribute::Datarate], 1024.0);
    }
}
