use super::NeighborState;
use crate::identifiers::NodeIdentifier;
use crate::node::NodeHandle;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("No address known for node {0}")]
    Unresolved(NodeIdentifier),
    #[error("Network manager for {0} is already running")]
    AlreadyRunning(NodeIdentifier),
    #[error("Address {addr} is already registered to {owner}")]
    AddressConflict { addr: SocketAddr, owner: NodeIdentifier },
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode or decode neighbor message: {0}")]
    Codec(#[from] bincode::Error),
}

/// Exchanges state between a node and its neighbors.
///
/// Started and stopped together with the node. Failing to reach a neighbor
/// is never an error for the caller; that neighbor's state is just unknown
/// for the cycle.
pub trait NetworkManager: Send + Sync {
    /// Begin sending and receiving for `node`
    fn start(&self, node: Arc<NodeHandle>) -> Result<(), NetworkError>;

    /// Release all transport resources. Must return promptly even if a
    /// receive is in progress.
    fn stop(&self);

    fn is_running(&self) -> bool;

    /// Called at the start of each cycle to fix the neighbor view the engine
    /// will see for that cycle
    fn begin_cycle(&self) {}

    /// Forget everything heard from neighbors so far
    fn clear_neighbor_states(&self) {}

    fn neighbor_states(&self) -> BTreeMap<NodeIdentifier, NeighborState>;

    /// Send `values` once to every neighbor
    fn share(&self, round: u64, values: &BTreeMap<String, f64>);
}
