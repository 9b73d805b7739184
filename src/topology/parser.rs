//! Parser for NS2-style topology descriptions.
//!
//! The accepted grammar is line oriented:
//!
//! ```text
//! source tb_compat.tcl
//! set ns [new Simulator]
//! set serverA [$ns node]
//! set serverB [$ns node]
//! set link0 [$ns duplex-link $serverA $serverB 100mb 0ms DropTail]
//! tb-set-node-os $serverA UBUNTU16-64-STD
//! ```
//!
//! Blank lines, `#` comments and `source` lines are skipped. Statements of
//! unknown kind are logged and ignored; malformed statements of a known kind
//! abort the parse.

use super::bandwidth::{parse_bandwidth, BandwidthError};
use super::factory::NetworkFactory;
use super::lookup::{DirectoryConfigLookup, NodeConfigLookup};
use super::types::{Graph, Link};
use crate::identifiers::NodeIdentifier;
use crate::node::extra_data::is_client;
use crate::node::{ClientNode, NodeAgent, NodeHandle};
use log::{debug, info, trace};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

/// Name of the topology file inside a scenario directory
pub const TOPOLOGY_FILENAME: &str = "topology.ns";

const SIMULATOR_ARGUMENTS: &str = "new Simulator";

static SET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^set\s+(\S+)\s+\[([^\]]+)\]$").expect("Invalid set statement regex"));

/// Errors that abort a topology parse
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("line doesn't match expected format for set: '{line}'")]
    MalformedSet { line: String },
    #[error("Cannot have 2 simulators: {first} and {second}")]
    DuplicateSimulator { first: String, second: String },
    #[error("Cannot construct nodes and links without a simulator, line: {line}")]
    MissingSimulator { line: String },
    #[error("Only creating simulated objects is supported, line: {line}")]
    ForeignObject { line: String },
    #[error("Unsupported object type: {object_type} on line: {line}")]
    UnsupportedObject { object_type: String, line: String },
    #[error("Node {name} is declared twice, line: {line}")]
    DuplicateNode { name: String, line: String },
    #[error("Unknown node {name} on line: {line}")]
    UnknownNode { name: String, line: String },
    #[error("{reason} on line: {line}")]
    MalformedStatement { reason: String, line: String },
    #[error("Invalid bandwidth on line: {line}: {source}")]
    InvalidBandwidth { line: String, source: BandwidthError },
    #[error("Invalid configuration for node {node} in {path}: {reason}")]
    NodeConfig { node: String, path: PathBuf, reason: String },
    #[error("Failed to read topology {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}

/// Vertices declared so far
#[derive(Default)]
struct Declared {
    nodes: BTreeMap<NodeIdentifier, NodeAgent>,
    clients: BTreeMap<NodeIdentifier, ClientNode>,
}

impl Declared {
    fn contains(&self, id: &NodeIdentifier) -> bool {
        self.nodes.contains_key(id) || self.clients.contains_key(id)
    }

    fn handle(&self, id: &NodeIdentifier) -> Option<&Arc<NodeHandle>> {
        self.nodes
            .get(id)
            .map(NodeAgent::handle)
            .or_else(|| self.clients.get(id).map(ClientNode::handle))
    }
}

/// A `$name` reference, without the `$`
fn reference<'a>(token: &'a str, line: &str, what: &str) -> Result<&'a str, FormatError> {
    token.strip_prefix('$').ok_or_else(|| FormatError::MalformedStatement {
        reason: format!("Expecting {} to start with $", what),
        line: line.to_string(),
    })
}

fn known_vertex(declared: &Declared, name: &str, line: &str) -> Result<NodeIdentifier, FormatError> {
    let id = NodeIdentifier::new(name);
    if declared.contains(&id) {
        Ok(id)
    } else {
        Err(FormatError::UnknownNode {
            name: name.to_string(),
            line: line.to_string(),
        })
    }
}

/// Parse a topology description.
///
/// # Arguments
/// * `text` - The topology text
/// * `lookup` - Supplies the configuration document of each declared node
/// * `factory` - Builds the node and client vertices
///
/// # Returns
/// * `Ok(Graph)` - Every declared vertex and link
/// * `Err(FormatError)` - On the first malformed statement; nothing is kept
pub fn parse(text: &str, lookup: &dyn NodeConfigLookup, factory: &dyn NetworkFactory) -> Result<Graph, FormatError> {
    let mut declared = Declared::default();
    let mut links = Vec::new();
    let mut simulator: Option<String> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let keyword = line.split_whitespace().next().unwrap_or_default();
        match keyword {
            "source" => trace!("Ignoring source line: {}", line),
            "set" => {
                let captures = SET_PATTERN.captures(line).ok_or_else(|| FormatError::MalformedSet {
                    line: line.to_string(),
                })?;
                let name = &captures[1];
                let arguments = &captures[2];

                if arguments == SIMULATOR_ARGUMENTS {
                    if let Some(first) = &simulator {
                        return Err(FormatError::DuplicateSimulator {
                            first: first.clone(),
                            second: name.to_string(),
                        });
                    }
                    simulator = Some(name.to_string());
                    continue;
                }

                let tokens: Vec<&str> = arguments.split_whitespace().collect();
                let Some(target) = tokens.first().and_then(|token| token.strip_prefix('$')) else {
                    info!("Ignoring set statement that creates no simulated object: '{}'", line);
                    continue;
                };
                let Some(sim) = simulator.as_deref() else {
                    return Err(FormatError::MissingSimulator { line: line.to_string() });
                };
                if target != sim {
                    return Err(FormatError::ForeignObject { line: line.to_string() });
                }

                match tokens.get(1).copied() {
                    Some("node") => declare_node(&mut declared, name, line, lookup, factory)?,
                    Some("duplex-link") => links.push(declare_link(&declared, name, &tokens, line)?),
                    Some(other) => {
                        return Err(FormatError::UnsupportedObject {
                            object_type: other.to_string(),
                            line: line.to_string(),
                        })
                    }
                    None => {
                        return Err(FormatError::MalformedStatement {
                            reason: "Missing object type".to_string(),
                            line: line.to_string(),
                        })
                    }
                }
            }
            "tb-set-node-os" => {
                let tokens: Vec<&str> = line.split_whitespace().collect();
                if tokens.len() != 3 {
                    return Err(FormatError::MalformedStatement {
                        reason: "Expecting tb-set-node-os to have 3 tokens".to_string(),
                        line: line.to_string(),
                    });
                }
                let name = reference(tokens[1], line, "node name")?;
                let id = known_vertex(&declared, name, line)?;
                if let Some(handle) = declared.handle(&id) {
                    handle.set_hardware(tokens[2]);
                }
            }
            _ => info!("Ignoring unknown line '{}'", line),
        }
    }

    debug!(
        "Parsed topology: {} nodes, {} clients, {} links",
        declared.nodes.len(),
        declared.clients.len(),
        links.len()
    );
    Ok(Graph::new(declared.nodes, declared.clients, links))
}

fn declare_node(
    declared: &mut Declared,
    name: &str,
    line: &str,
    lookup: &dyn NodeConfigLookup,
    factory: &dyn NetworkFactory,
) -> Result<(), FormatError> {
    let id = NodeIdentifier::new(name);
    if declared.contains(&id) {
        return Err(FormatError::DuplicateNode {
            name: name.to_string(),
            line: line.to_string(),
        });
    }

    let config = lookup.node_config(name)?;
    if is_client(&config) {
        declared.clients.insert(id, factory.create_client(name, &config));
    } else {
        declared.nodes.insert(id, factory.create_node(name, &config));
    }
    Ok(())
}

/// `$sim duplex-link $left $right <bandwidth> [delay] [queue]`
fn declare_link(declared: &Declared, name: &str, tokens: &[&str], line: &str) -> Result<Link, FormatError> {
    if tokens.len() < 5 {
        return Err(FormatError::MalformedStatement {
            reason: "Expecting duplex-link to name two nodes and a bandwidth".to_string(),
            line: line.to_string(),
        });
    }

    let left = known_vertex(declared, reference(tokens[2], line, "link endpoints")?, line)?;
    let right = known_vertex(declared, reference(tokens[3], line, "link endpoints")?, line)?;
    let bandwidth = parse_bandwidth(tokens[4]).map_err(|source| FormatError::InvalidBandwidth {
        line: line.to_string(),
        source,
    })?;

    if let (Some(left_handle), Some(right_handle)) = (declared.handle(&left), declared.handle(&right)) {
        left_handle.add_neighbor(right.clone(), bandwidth);
        right_handle.add_neighbor(left.clone(), bandwidth);
    }

    Ok(Link {
        name: name.to_string(),
        left,
        right,
        bandwidth,
    })
}

/// Parse `topology_path`, reading node configurations from `node_data_dir`
pub fn parse_file(topology_path: &Path, node_data_dir: &Path, factory: &dyn NetworkFactory) -> Result<Graph, FormatError> {
    let text = fs::read_to_string(topology_path).map_err(|source| FormatError::Io {
        path: topology_path.to_path_buf(),
        source,
    })?;
    parse(&text, &DirectoryConfigLookup::new(node_data_dir), factory)
}

/// Parse `<dir>/topology.ns` with node configurations from `<dir>/<node>.json`
pub fn parse_directory(dir: &Path, factory: &dyn NetworkFactory) -> Result<Graph, FormatError> {
    parse_file(&dir.join(TOPOLOGY_FILENAME), dir, factory)
}
