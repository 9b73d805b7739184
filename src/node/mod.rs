//! Graph vertices: executing nodes and passive clients.

pub mod agent;
pub mod client;
pub mod extra_data;
pub mod handle;
pub mod hooks;
pub mod region_state;

pub use agent::{LifecycleError, LifecycleState, NodeAgent, NodeAgentBuilder, DEFAULT_CYCLE_INTERVAL};
pub use client::ClientNode;
pub use handle::NodeHandle;
pub use hooks::CycleHooks;
pub use region_state::RegionNodeState;
