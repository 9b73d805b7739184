//! What a node knows about the rest of its region.

use crate::identifiers::RegionIdentifier;
use crate::report::{ResourceReport, ResourceSummary, ServiceReport};

/// Region-scoped cache, discarded whenever the node changes region
#[derive(Debug, Clone, PartialEq)]
pub struct RegionNodeState {
    region: RegionIdentifier,
    resource_reports: Vec<ResourceReport>,
    service_reports: Vec<ServiceReport>,
    summary: Option<ResourceSummary>,
}

impl RegionNodeState {
    pub fn new(region: RegionIdentifier) -> Self {
        Self {
            region,
            resource_reports: Vec::new(),
            service_reports: Vec::new(),
            summary: None,
        }
    }

    pub fn region(&self) -> &RegionIdentifier {
        &self.region
    }

    /// Latest reports of every node in the region
    pub fn resource_reports(&self) -> &[ResourceReport] {
        &self.resource_reports
    }

    pub fn set_resource_reports(&mut self, reports: Vec<ResourceReport>) {
        self.resource_reports = reports;
    }

    pub fn service_reports(&self) -> &[ServiceReport] {
        &self.service_reports
    }

    pub fn set_service_reports(&mut self, reports: Vec<ServiceReport>) {
        self.service_reports = reports;
    }

    pub fn summary(&self) -> Option<&ResourceSummary> {
        self.summary.as_ref()
    }

    pub fn set_summary(&mut self, summary: ResourceSummary) {
        self.summary = Some(summary);
    }
}
