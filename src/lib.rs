//! # Regionsim - Simulator for region-aware resource management networks
//!
//! This library runs a network of autonomous nodes on one machine. Each node
//! measures its resources, exchanges state with its neighbors and runs one
//! engine step per cycle. Reports from the nodes of a region are merged into
//! a single region summary.
//!
//! ## Overview
//!
//! A simulation starts from an NS2-style topology file. Every `node` statement
//! becomes a [`node::NodeAgent`] (or a passive [`node::ClientNode`] when its
//! configuration says so), every `duplex-link` connects two vertices with a
//! bandwidth. Nodes then run their execution loop on their own thread until
//! the scenario decides it is done.
//!
//! ## Key Features
//!
//! - **Topology Parsing**: NS2 subset with per-node JSON configuration
//! - **Node Lifecycle**: Start, cycle, stop with hooks and crash isolation
//! - **Neighbor Exchange**: UDP datagrams on loopback, one socket per node
//! - **Resource Reports**: Configured capacity, load and network usage per cycle
//! - **Region Summaries**: Associative, commutative merge of node reports
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `identifiers`: Node, region, service and container names
//! - `attributes`: Closed sets of compute and link attributes
//! - `report`: Resource reports, service reports and region summaries
//! - `resource`: Resource managers and clocks
//! - `engine`: The per-cycle engine trait and a reference heartbeat engine
//! - `network`: Neighbor state exchange and address resolution
//! - `node`: Node agents, clients and their lifecycle
//! - `topology`: Topology parsing and vertex construction
//! - `aggregation`: Per-region reduction of reports
//! - `scenario`: Running a parsed graph to completion
//! - `config`: Simulation configuration structures
//! - `config_loader`: Configuration file loading
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use regionsim::config_loader;
//! use regionsim::engine::HeartbeatEngine;
//! use regionsim::network::AddressRegistry;
//! use regionsim::scenario::{ExecutionCountTermination, Scenario};
//! use regionsim::topology::{parse_file, BasicNetworkFactory};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let config = config_loader::load_config(Path::new("regionsim.yaml"))?;
//!
//! let factory = BasicNetworkFactory::new(Arc::new(AddressRegistry::new()), HeartbeatEngine::factory())
//!     .with_cycle_interval(config.cycle_interval);
//! let graph = parse_file(&config.topology_path(), &config.node_data_path(), &factory)?;
//!
//! let scenario = Scenario::new("example", graph)
//!     .with_termination(ExecutionCountTermination::new(config.max_executions));
//! scenario.run()?;
//!
//! for (region, summary) in scenario.region_summaries()? {
//!     println!("{}: {:?}", region, summary.server_capacity());
//! }
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! topology: scenarios/multinode/topology.ns
//! node_data_dir: scenarios/multinode
//! cycle_interval: 500ms
//! max_executions: 5
//! estimation_window: SHORT
//! log_level: info
//! ```
//!
//! ## Error Handling
//!
//! Each module defines its own `thiserror` error enum. The binary and the
//! configuration loader use `color_eyre` for error reporting with context.

pub mod identifiers;
pub mod attributes;
pub mod report;
pub mod resource;
pub mod engine;
pub mod network;
pub mod node;
pub mod topology;
pub mod aggregation;
pub mod scenario;
pub mod config;
pub mod config_loader;

pub(crate) mod sync;
