//! Region-level aggregation of node reports.

use crate::identifiers::RegionIdentifier;
use crate::report::{EstimationWindow, MergeError, RegionLookup, ResourceReport, ResourceSummary};
use log::debug;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Collects the reports of one region and reduces them to a summary
#[derive(Debug, Clone)]
pub struct RegionAggregator {
    region: RegionIdentifier,
    window: EstimationWindow,
    reports: Vec<ResourceReport>,
}

impl RegionAggregator {
    pub fn new(region: RegionIdentifier, window: EstimationWindow) -> Self {
        Self {
            region,
            window,
            reports: Vec::new(),
        }
    }

    pub fn region(&self) -> &RegionIdentifier {
        &self.region
    }

    pub fn window(&self) -> EstimationWindow {
        self.window
    }

    pub fn reports(&self) -> &[ResourceReport] {
        &self.reports
    }

    /// Add a report. Reports estimated over a different window are rejected.
    pub fn add_report(&mut self, report: ResourceReport) -> Result<(), MergeError> {
        if report.demand_estimation_window() != self.window {
            return Err(MergeError::WindowMismatch(self.window, report.demand_estimation_window()));
        }
        self.reports.push(report);
        Ok(())
    }

    /// Merge every collected report into one summary.
    ///
    /// Reports are converted and merged in parallel. A report from a node
    /// outside this region fails the whole reduction.
    pub fn summarize(&self, lookup: &dyn RegionLookup) -> Result<ResourceSummary, MergeError> {
        let identity = || ResourceSummary::null(self.region.clone(), self.window);
        let summary = self
            .reports
            .par_iter()
            .map(|report| {
                let summary = ResourceSummary::from_report(report, lookup)?;
                if summary.region() != &self.region {
                    return Err(MergeError::RegionMismatch(self.region.clone(), summary.region().clone()));
                }
                Ok(summary)
            })
            .try_reduce(identity, |one, two| ResourceSummary::merge(&one, &two))?;

        debug!(
            "Summarized {} reports for region {}",
            self.reports.len(),
            self.region
        );
        Ok(summary)
    }
}

/// Group `reports` by the region of their node and summarize each group.
///
/// Reports from nodes without a known region are skipped.
pub fn summarize_regions(
    reports: impl IntoIterator<Item = ResourceReport>,
    lookup: &dyn RegionLookup,
    window: EstimationWindow,
) -> Result<BTreeMap<RegionIdentifier, ResourceSummary>, MergeError> {
    let mut aggregators: BTreeMap<RegionIdentifier, RegionAggregator> = BTreeMap::new();
    for report in reports {
        let Some(region) = lookup.region_for(report.node()) else {
            debug!("Skipping report from {}: no known region", report.node());
            continue;
        };
        aggregators
            .entry(region.clone())
            .or_insert_with(|| RegionAggregator::new(region, window))
            .add_report(report)?;
    }

    aggregators
        .into_iter()
        .map(|(region, aggregator)| Ok((region, aggregator.summarize(lookup)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::NodeAttribute;
    use crate::identifiers::NodeIdentifier;
    use crate::report::NodeAttributeMap;
    use std::collections::HashMap;

    fn lookup() -> HashMap<NodeIdentifier, RegionIdentifier> {
        (0..10)
            .map(|i| {
                let region = if i < 6 { "A" } else { "B" };
                (NodeIdentifier::new(format!("n{}", i)), RegionIdentifier::new(region))
            })
            .collect()
    }

    fn report(i: usize, timestamp: i64) -> ResourceReport {
        ResourceReport::new(NodeIdentifier::new(format!("n{}", i)), timestamp, EstimationWindow::Short)
            .with_server_capacity(NodeAttributeMap::from([(NodeAttribute::Cpu, 1.0)]))
    }

    #[test]
    fn test_summarize_region() {
        let mut aggregator = RegionAggregator::new(RegionIdentifier::new("A"), EstimationWindow::Short);
        for i in 0..6 {
            aggregator.add_report(report(i, 100 + i as i64)).unwrap();
        }

        let summary = aggregator.summarize(&lookup()).unwrap();
        assert_eq!(summary.server_capacity()[&NodeAttribute::Cpu], 6.0);
        assert_eq!(summary.min_timestamp(), 100);
        assert_eq!(summary.max_timestamp(), 105);
    }

    #[test]
    fn test_empty_aggregator_gives_null_summary() {
        let aggregator = RegionAggregator::new(RegionIdentifier::new("A"), EstimationWindow::Long);
        let summary = aggregator.summarize(&lookup()).unwrap();
        assert!(summary.is_null());
        assert_eq!(summary.demand_estimation_window(), EstimationWindow::Long);
    }

    #[test]
    fn test_rejects_other_window_and_region() {
        let mut aggregator = RegionAggregator::new(RegionIdentifier::new("A"), EstimationWindow::Long);
        assert!(matches!(
            aggregator.add_report(report(0, 1)),
            Err(MergeError::WindowMismatch(EstimationWindow::Long, EstimationWindow::Short))
        ));

        let mut aggregator = RegionAggregator::new(RegionIdentifier::new("A"), EstimationWindow::Short);
        aggregator.add_report(report(7, 1)).unwrap();
        assert!(matches!(
            aggregator.summarize(&lookup()),
            Err(MergeError::RegionMismatch(_, _))
        ));
    }

    #[test]
    fn test_summarize_regions_groups_by_region() {
        let mut reports: Vec<_> = (0..10).map(|i| report(i, 50)).collect();
        reports.push(ResourceReport::new(NodeIdentifier::new("stranger"), 1, EstimationWindow::Short));

        let summaries = summarize_regions(reports, &lookup(), EstimationWindow::Short).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[&RegionIdentifier::new("A")].server_capacity()[&NodeAttribute::Cpu], 6.0);
        assert_eq!(summaries[&RegionIdentifier::new("B")].server_capacity()[&NodeAttribute::Cpu], 4.0);
    }
}
