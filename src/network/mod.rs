//! Neighbor state exchange.

pub mod manager;
pub mod message;
pub mod registry;
pub mod udp;

pub use manager::{NetworkError, NetworkManager};
pub use message::{NeighborMessage, NeighborState};
pub use registry::{AddressRegistry, AddressResolver};
pub use udp::UdpNetworkManager;
