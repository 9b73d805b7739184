//! Measurement dimensions for compute and network resources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raised when a configuration key does not name a known attribute
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a known attribute")]
pub struct UnknownAttribute(pub String);

/// Compute resources measured on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeAttribute {
    Cpu,
    Memory,
    Disk,
    TaskContainers,
}

impl NodeAttribute {
    pub const ALL: [NodeAttribute; 4] = [
        NodeAttribute::Cpu,
        NodeAttribute::Memory,
        NodeAttribute::Disk,
        NodeAttribute::TaskContainers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeAttribute::Cpu => "CPU",
            NodeAttribute::Memory => "MEMORY",
            NodeAttribute::Disk => "DISK",
            NodeAttribute::TaskContainers => "TASK_CONTAINERS",
        }
    }
}

impl FromStr for NodeAttribute {
    type Err = UnknownAttribute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|attr| attr.as_str() == s)
            .ok_or_else(|| UnknownAttribute(s.to_string()))
    }
}

impl fmt::Display for NodeAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Network resources measured on a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkAttribute {
    /// Bytes per second
    Datarate,
}

impl LinkAttribute {
    pub const ALL: [LinkAttribute; 1] = [LinkAttribute::Datarate];

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkAttribute::Datarate => "DATARATE",
        }
    }
}

impl FromStr for LinkAttribute {
    type Err = UnknownAttribute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|attr| attr.as_str() == s)
            .ok_or_else(|| UnknownAttribute(s.to_string()))
    }
}

impl fmt::Display for LinkAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_node_attributes() {
        for attr in NodeAttribute::ALL {
            assert_eq!(attr.as_str().parse::<NodeAttribute>(), Ok(attr));
        }
        assert_eq!("TASK_CONTAINERS".parse(), Ok(NodeAttribute::TaskContainers));

        // names are matched exactly
        assert!("cpu".parse::<NodeAttribute>().is_err());
        assert_eq!(
            "GPU".parse::<NodeAttribute>(),
            Err(UnknownAttribute("GPU".to_string()))
        );
    }

    #[test]
    fn test_parse_link_attributes() {
        assert_eq!("DATARATE".parse(), Ok(LinkAttribute::Datarate));
        assert!("CPU".parse::<LinkAttribute>().is_err());
    }

    #[test]
    fn test_serde_names_match_config_names() {
        let json = serde_json::to_string(&NodeAttribute::TaskContainers).unwrap();
        assert_eq!(json, "\"TASK_CONTAINERS\"");
        let json = serde_json::to_string(&LinkAttribute::Datarate).unwrap();
        assert_eq!(json, "\"DATARATE\"");
    }
}
