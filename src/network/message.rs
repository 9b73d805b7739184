//! Neighbor exchange messages.

use crate::identifiers::NodeIdentifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a node shares with its neighbors once per cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborMessage {
    pub sender: NodeIdentifier,
    pub round: u64,
    pub values: BTreeMap<String, f64>,
}

impl NeighborMessage {
    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// A neighbor's contribution to the current cycle
#[derive(Debug, Clone, PartialEq)]
pub enum NeighborState {
    Known { round: u64, values: BTreeMap<String, f64> },
    /// Nothing arrived from the neighbor recently, or it could not be reached
    Unknown,
}

impl NeighborState {
    pub fn is_known(&self) -> bool {
        matches!(self, NeighborState::Known { .. })
    }

    pub fn value(&self, key: &str) -> Option<f64> {
        match self {
            NeighborState::Known { values, .. } => values.get(key).copied(),
            NeighborState::Unknown => None,
        }
    }
}
