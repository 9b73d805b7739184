//! The per-node computation engine boundary.
//!
//! A node does not know what its engine computes. Once per cycle it hands the
//! engine an [`ExecutionContext`] through which the engine reads the state its
//! neighbors shared and publishes its own.

use crate::identifiers::NodeIdentifier;
use crate::network::NeighborState;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Capabilities available to an engine during one cycle
pub trait ExecutionContext {
    fn node_id(&self) -> &NodeIdentifier;

    /// Milliseconds since the epoch
    fn current_time(&self) -> i64;

    /// Uniform in `[0, 1)`
    fn next_random(&mut self) -> f64;

    /// What each neighbor shared most recently, or `Unknown` if nothing
    /// arrived in time
    fn neighbor_states(&self) -> BTreeMap<NodeIdentifier, NeighborState>;

    /// Publish this node's values to every neighbor
    fn share(&mut self, values: BTreeMap<String, f64>);
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Engine on {node} failed: {message}")]
    Failed { node: NodeIdentifier, message: String },
    #[error("Engine on {node} panicked: {message}")]
    Panicked { node: NodeIdentifier, message: String },
}

pub trait Engine: Send {
    fn run_cycle(&mut self, ctx: &mut dyn ExecutionContext) -> Result<(), EngineError>;
}

/// Builds one engine per node
pub type EngineFactory = Arc<dyn Fn(&NodeIdentifier) -> Box<dyn Engine> + Send + Sync>;

pub const ROUND_KEY: &str = "round";
pub const NEIGHBORS_HEARD_KEY: &str = "neighbors_heard";

/// Counts rounds and how many neighbors were heard from in each
#[derive(Debug, Default)]
pub struct HeartbeatEngine {
    round: u64,
    last_heard: usize,
}

impl HeartbeatEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory() -> EngineFactory {
        Arc::new(|_node: &NodeIdentifier| Box::new(HeartbeatEngine::new()) as Box<dyn Engine>)
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    /// Neighbors whose state was known during the last cycle
    pub fn last_heard(&self) -> usize {
        self.last_heard
    }
}

impl Engine for HeartbeatEngine {
    fn run_cycle(&mut self, ctx: &mut dyn ExecutionContext) -> Result<(), EngineError> {
        self.round += 1;
        self.last_heard = ctx
            .neighbor_states()
            .values()
            .filter(|state| state.is_known())
            .count();

        let values = BTreeMap::from([
            (ROUND_KEY.to_string(), self.round as f64),
            (NEIGHBORS_HEARD_KEY.to_string(), self.last_heard as f64),
        ]);
        ctx.share(values);
        Ok(())
    }
}
