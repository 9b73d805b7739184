//! Topology type definitions.
//!
//! A parsed topology is a [`Graph`]: executing nodes, passive clients and
//! the links between them. Node and client names share one key space.

use crate::identifiers::{NodeIdentifier, RegionIdentifier};
use crate::node::{ClientNode, NodeAgent};
use std::collections::{BTreeMap, HashMap};

/// A duplex link between two vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub name: String,
    pub left: NodeIdentifier,
    pub right: NodeIdentifier,
    /// Bytes per second, the same in both directions
    pub bandwidth: f64,
}

#[derive(Debug, Default)]
pub struct Graph {
    nodes: BTreeMap<NodeIdentifier, NodeAgent>,
    clients: BTreeMap<NodeIdentifier, ClientNode>,
    links: Vec<Link>,
}

impl Graph {
    pub fn new(
        nodes: BTreeMap<NodeIdentifier, NodeAgent>,
        clients: BTreeMap<NodeIdentifier, ClientNode>,
        links: Vec<Link>,
    ) -> Self {
        Self { nodes, clients, links }
    }

    pub fn nodes(&self) -> &BTreeMap<NodeIdentifier, NodeAgent> {
        &self.nodes
    }

    pub fn clients(&self) -> &BTreeMap<NodeIdentifier, ClientNode> {
        &self.clients
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, name: &str) -> Option<&NodeAgent> {
        self.nodes.get(&NodeIdentifier::new(name))
    }

    pub fn client(&self, name: &str) -> Option<&ClientNode> {
        self.clients.get(&NodeIdentifier::new(name))
    }

    /// Returns true if `id` names a node or a client
    pub fn contains(&self, id: &NodeIdentifier) -> bool {
        self.nodes.contains_key(id) || self.clients.contains_key(id)
    }

    /// Region of every vertex that has one. Vertices still in the null
    /// region are left out, so lookups treat them as unknown.
    pub fn region_lookup(&self) -> HashMap<NodeIdentifier, RegionIdentifier> {
        let nodes = self.nodes.iter().map(|(id, node)| (id.clone(), node.region()));
        let clients = self.clients.iter().map(|(id, client)| (id.clone(), client.region()));
        nodes.chain(clients).filter(|(_, region)| !region.is_null()).collect()
    }

    /// Distinct assigned regions of the executing nodes
    pub fn regions(&self) -> Vec<RegionIdentifier> {
        let mut regions: Vec<_> = self
            .nodes
            .values()
            .map(NodeAgent::region)
            .filter(|region| !region.is_null())
            .collect();
        regions.sort();
        regions.dedup();
        regions
    }
}
