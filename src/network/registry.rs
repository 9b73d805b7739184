//! Address registry.
//!
//! Maps node names to the socket addresses their network managers bound, so
//! a node can find its neighbors without knowing how they were started.

use super::manager::NetworkError;
use crate::identifiers::NodeIdentifier;
use crate::sync::{read, write};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::RwLock;

/// Resolves a node to the address it receives neighbor messages on
pub trait AddressResolver: Send + Sync {
    /// `None` if the node is unknown or not currently listening
    fn resolve(&self, node: &NodeIdentifier) -> Option<SocketAddr>;
}

/// In-process registry shared by every network manager of a simulation
#[derive(Debug, Default)]
pub struct AddressRegistry {
    addresses: RwLock<HashMap<NodeIdentifier, SocketAddr>>,
}

impl AddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `addr` for `node`, replacing any earlier address of that node.
    ///
    /// # Returns
    /// * `Err(NetworkError::AddressConflict)` if another node already owns `addr`
    pub fn register(&self, node: &NodeIdentifier, addr: SocketAddr) -> Result<(), NetworkError> {
        let mut addresses = write(&self.addresses);
        if let Some((owner, _)) = addresses.iter().find(|(owner, existing)| **existing == addr && *owner != node) {
            return Err(NetworkError::AddressConflict {
                addr,
                owner: owner.clone(),
            });
        }
        addresses.insert(node.clone(), addr);
        Ok(())
    }

    pub fn unregister(&self, node: &NodeIdentifier) -> Option<SocketAddr> {
        write(&self.addresses).remove(node)
    }

    /// Names of every node currently registered
    pub fn registered_nodes(&self) -> Vec<NodeIdentifier> {
        let mut nodes: Vec<_> = read(&self.addresses).keys().cloned().collect();
        nodes.sort();
        nodes
    }
}

impl AddressResolver for AddressRegistry {
    fn resolve(&self, node: &NodeIdentifier) -> Option<SocketAddr> {
        read(&self.addresses).get(node).copied()
    }
}
