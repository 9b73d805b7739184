//! Network topology module.
//!
//! This module parses topology descriptions into a graph of nodes, clients
//! and links, building each vertex through a [`NetworkFactory`].

pub mod bandwidth;
pub mod factory;
pub mod lookup;
pub mod parser;
pub mod types;

// Re-export key types and functions for easier access
pub use factory::{BasicNetworkFactory, NetworkFactory};
pub use lookup::{DirectoryConfigLookup, EmptyConfigLookup, MapConfigLookup, NodeConfigLookup};
pub use parser::{parse, parse_directory, parse_file, FormatError, TOPOLOGY_FILENAME};
pub use types::{Graph, Link};
