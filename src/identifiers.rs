//! Name-based identifiers.
//!
//! Every identifier in the simulation is an opaque name. Two identifiers are
//! equal exactly when their names are equal, regardless of where the strings
//! came from.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name used for nodes whose configuration does not specify a region
pub const NULL_REGION_NAME: &str = "__null-region__";

macro_rules! name_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            pub fn name(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self::new(name)
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(name)
            }
        }
    };
}

name_identifier!(
    /// Identifies a node (server or client) in the topology
    NodeIdentifier
);

name_identifier!(
    /// Identifies an administrative region; summaries aggregate at this level
    RegionIdentifier
);

name_identifier!(
    /// Identifies a service that can be placed in containers
    ServiceIdentifier
);

name_identifier!(
    /// Identifies a container allocated by a resource manager
    ContainerIdentifier
);

impl RegionIdentifier {
    /// The region used when a node has not been assigned one
    pub fn null() -> Self {
        Self::new(NULL_REGION_NAME)
    }

    pub fn is_null(&self) -> bool {
        self.0 == NULL_REGION_NAME
    }
}
