//! Region-level summaries and the merge that produces them.

use super::merge::{merge_scalar, merge_three_level, merge_two_level, rekey_two_level};
use super::{EstimationWindow, NodeAttributeMap, RegionLinkMap, ResourceReport, ServiceLoadMap, NULL_TIMESTAMP};
use crate::identifiers::{NodeIdentifier, RegionIdentifier};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Errors raised when summaries or reports are combined in ways that make no sense
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("Invalid argument: cannot merge summaries for regions {0} and {1}")]
    RegionMismatch(RegionIdentifier, RegionIdentifier),
    #[error("Invalid argument: cannot combine estimation windows {0} and {1}")]
    WindowMismatch(EstimationWindow, EstimationWindow),
    #[error("Invalid argument: no region known for node {0}")]
    UnknownRegion(NodeIdentifier),
}

/// Answers which region a node belongs to
pub trait RegionLookup: Sync {
    fn region_for(&self, node: &NodeIdentifier) -> Option<RegionIdentifier>;
}

impl<S: std::hash::BuildHasher + Sync> RegionLookup for HashMap<NodeIdentifier, RegionIdentifier, S> {
    fn region_for(&self, node: &NodeIdentifier) -> Option<RegionIdentifier> {
        self.get(node).cloned()
    }
}

impl RegionLookup for BTreeMap<NodeIdentifier, RegionIdentifier> {
    fn region_for(&self, node: &NodeIdentifier) -> Option<RegionIdentifier> {
        self.get(node).cloned()
    }
}

impl<F> RegionLookup for F
where
    F: Fn(&NodeIdentifier) -> Option<RegionIdentifier> + Sync,
{
    fn region_for(&self, node: &NodeIdentifier) -> Option<RegionIdentifier> {
        self(node)
    }
}

/// Aggregated resource usage of every node in a region.
///
/// Summaries are combined with [`ResourceSummary::merge`], which is
/// commutative and associative, and for which [`ResourceSummary::null`] is
/// the identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    region: RegionIdentifier,
    min_timestamp: i64,
    max_timestamp: i64,
    demand_estimation_window: EstimationWindow,
    server_capacity: NodeAttributeMap,
    server_load: ServiceLoadMap,
    server_demand: ServiceLoadMap,
    network_capacity: RegionLinkMap,
    network_load: RegionLinkMap,
    network_demand: RegionLinkMap,
}

impl ResourceSummary {
    /// The empty summary for `region`
    pub fn null(region: RegionIdentifier, window: EstimationWindow) -> Self {
        Self {
            region,
            min_timestamp: NULL_TIMESTAMP,
            max_timestamp: NULL_TIMESTAMP,
            demand_estimation_window: window,
            server_capacity: NodeAttributeMap::new(),
            server_load: ServiceLoadMap::new(),
            server_demand: ServiceLoadMap::new(),
            network_capacity: RegionLinkMap::new(),
            network_load: RegionLinkMap::new(),
            network_demand: RegionLinkMap::new(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.min_timestamp == NULL_TIMESTAMP && self.max_timestamp == NULL_TIMESTAMP
    }

    /// Convert one node report into a single-node summary.
    ///
    /// Network maps are rekeyed from neighbor node to neighbor region,
    /// summing the links of neighbors that share a region.
    ///
    /// # Arguments
    /// * `report` - The node report to convert
    /// * `lookup` - Resolves the region of the reporting node and its neighbors
    ///
    /// # Returns
    /// * `Err(MergeError::UnknownRegion)` if the reporting node has no region
    pub fn from_report(report: &ResourceReport, lookup: &dyn RegionLookup) -> Result<Self, MergeError> {
        let region = lookup
            .region_for(report.node())
            .ok_or_else(|| MergeError::UnknownRegion(report.node().clone()))?;

        let to_region = |neighbor: &NodeIdentifier| {
            let found = lookup.region_for(neighbor);
            if found.is_none() {
                debug!(
                    "Skipping link from {} to {}: neighbor has no known region",
                    report.node(),
                    neighbor
                );
            }
            found
        };

        Ok(Self {
            region,
            min_timestamp: report.timestamp(),
            max_timestamp: report.timestamp(),
            demand_estimation_window: report.demand_estimation_window(),
            server_capacity: report.server_capacity().clone(),
            server_load: report.server_load().clone(),
            server_demand: report.server_demand().clone(),
            network_capacity: rekey_two_level(report.network_capacity(), to_region),
            network_load: rekey_two_level(report.network_load(), to_region),
            network_demand: rekey_two_level(report.network_demand(), to_region),
        })
    }

    /// Combine two summaries of the same region and estimation window.
    ///
    /// Every key present in either operand appears in the result; values for
    /// shared keys are summed.
    pub fn merge(one: &Self, two: &Self) -> Result<Self, MergeError> {
        if one.region != two.region {
            return Err(MergeError::RegionMismatch(one.region.clone(), two.region.clone()));
        }
        if one.demand_estimation_window != two.demand_estimation_window {
            return Err(MergeError::WindowMismatch(
                one.demand_estimation_window,
                two.demand_estimation_window,
            ));
        }

        // a null operand must not drag the window down to -1
        let (min_timestamp, max_timestamp) = match (one.is_null(), two.is_null()) {
            (true, _) => (two.min_timestamp, two.max_timestamp),
            (_, true) => (one.min_timestamp, one.max_timestamp),
            _ => (
                one.min_timestamp.min(two.min_timestamp),
                one.max_timestamp.max(two.max_timestamp),
            ),
        };

        Ok(Self {
            region: one.region.clone(),
            min_timestamp,
            max_timestamp,
            demand_estimation_window: one.demand_estimation_window,
            server_capacity: merge_scalar(&one.server_capacity, &two.server_capacity),
            server_load: merge_three_level(&one.server_load, &two.server_load),
            server_demand: merge_three_level(&one.server_demand, &two.server_demand),
            network_capacity: merge_two_level(&one.network_capacity, &two.network_capacity),
            network_load: merge_two_level(&one.network_load, &two.network_load),
            network_demand: merge_two_level(&one.network_demand, &two.network_demand),
        })
    }

    pub fn region(&self) -> &RegionIdentifier {
        &self.region
    }

    pub fn min_timestamp(&self) -> i64 {
        self.min_timestamp
    }

    pub fn max_timestamp(&self) -> i64 {
        self.max_timestamp
    }

    pub fn demand_estimation_window(&self) -> EstimationWindow {
        self.demand_estimation_window
    }

    pub fn server_capacity(&self) -> &NodeAttributeMap {
        &self.server_capacity
    }

    pub fn server_load(&self) -> &ServiceLoadMap {
        &self.server_load
    }

    pub fn server_demand(&self) -> &ServiceLoadMap {
        &self.server_demand
    }

    pub fn network_capacity(&self) -> &RegionLinkMap {
        &self.network_capacity
    }

    pub fn network_load(&self) -> &RegionLinkMap {
        &self.network_load
    }

    pub fn network_demand(&self) -> &RegionLinkMap {
        &self.network_demand
    }
}
