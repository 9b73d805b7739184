//! Resource snapshots and their aggregation.
//!
//! A [`ResourceReport`] is what one node measures in one cycle. Reports are
//! converted into region-keyed [`ResourceSummary`] values which merge with
//! each other associatively, so any number of nodes can be reduced to a
//! single summary per region.

pub mod container_report;
pub mod merge;
pub mod resource_report;
pub mod service;
pub mod summary;

use crate::attributes::{LinkAttribute, NodeAttribute};
use crate::identifiers::{NodeIdentifier, RegionIdentifier, ServiceIdentifier};
use std::collections::BTreeMap;

/// attribute -> value
pub type NodeAttributeMap = BTreeMap<NodeAttribute, f64>;

/// attribute -> value
pub type LinkAttributeMap = BTreeMap<LinkAttribute, f64>;

/// service -> region -> attribute -> value
pub type ServiceLoadMap = BTreeMap<ServiceIdentifier, BTreeMap<RegionIdentifier, NodeAttributeMap>>;

/// neighbor node -> attribute -> value
pub type NodeLinkMap = BTreeMap<NodeIdentifier, LinkAttributeMap>;

/// neighbor region -> attribute -> value
pub type RegionLinkMap = BTreeMap<RegionIdentifier, LinkAttributeMap>;

/// client node -> attribute -> value
pub type NodeComputeMap = BTreeMap<NodeIdentifier, NodeAttributeMap>;

pub use container_report::ContainerResourceReport;
pub use resource_report::{EstimationWindow, ResourceReport, NULL_TIMESTAMP};
pub use service::{ServiceReport, ServiceState, ServiceStatus};
pub use summary::{MergeError, RegionLookup, ResourceSummary};
