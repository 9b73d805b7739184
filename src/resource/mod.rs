//! Per-node resource managers.
//!
//! A resource manager produces the node's [`ResourceReport`](crate::report::ResourceReport)
//! each cycle and tracks the containers running services on the node.

pub mod basic;
pub mod clock;
pub mod manager;
pub mod null;

pub use basic::BasicResourceManager;
pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{ContainerParameters, ResourceManager};
pub use null::NullResourceManager;
