//! Scenario orchestration.
//!
//! A [`Scenario`] owns a parsed graph and drives it through one run: start
//! every node, wait for the termination condition, stop every node, then
//! summarize what the nodes reported.

use crate::aggregation::summarize_regions;
use crate::engine::EngineError;
use crate::identifiers::{NodeIdentifier, RegionIdentifier};
use crate::node::{LifecycleError, NodeAgent};
use crate::report::{EstimationWindow, MergeError, ResourceReport, ResourceSummary, ServiceReport};
use crate::topology::Graph;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

/// How often the termination condition is checked
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Decides when a running scenario is done
pub trait TerminationCondition: Send + Sync {
    fn should_terminate(&self, graph: &Graph) -> bool;
}

/// Done once every executing node has completed `min_executions` cycles.
/// Nodes that stopped on their own count as done.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionCountTermination {
    min_executions: u64,
}

impl ExecutionCountTermination {
    pub fn new(min_executions: u64) -> Self {
        Self { min_executions }
    }

    pub fn min_executions(&self) -> u64 {
        self.min_executions
    }
}

impl TerminationCondition for ExecutionCountTermination {
    fn should_terminate(&self, graph: &Graph) -> bool {
        graph
            .nodes()
            .values()
            .all(|node| !node.is_executing() || node.execution_count() >= self.min_executions)
    }
}

/// Runs until the timeout, if any
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverTerminate;

impl TerminationCondition for NeverTerminate {
    fn should_terminate(&self, _graph: &Graph) -> bool {
        false
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("Failed to start scenario: {0}")]
    Start(#[from] LifecycleError),
    #[error("Failed to summarize regions: {0}")]
    Summary(#[from] MergeError),
}

/// What happened during [`Scenario::run`]
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub elapsed: Duration,
    /// The timeout expired before the termination condition held
    pub timed_out: bool,
    pub failed_nodes: Vec<(NodeIdentifier, EngineError)>,
}

pub struct Scenario {
    name: String,
    graph: Graph,
    window: EstimationWindow,
    termination: Box<dyn TerminationCondition>,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, graph: Graph) -> Self {
        Self {
            name: name.into(),
            graph,
            window: EstimationWindow::default(),
            termination: Box::new(NeverTerminate),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }

    pub fn with_termination(mut self, condition: impl TerminationCondition + 'static) -> Self {
        self.termination = Box::new(condition);
        self
    }

    /// Window used when summarizing regions
    pub fn with_estimation_window(mut self, window: EstimationWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Start every node. If one fails to start, the nodes already started
    /// are stopped again.
    pub fn start_all(&self) -> Result<(), LifecycleError> {
        let mut started: Vec<&NodeAgent> = Vec::new();
        for node in self.graph.nodes().values() {
            if let Err(e) = node.start_executing() {
                warn!("Scenario {}: {}; stopping {} started nodes", self.name, e, started.len());
                started.par_iter().for_each(|node| node.stop_executing());
                return Err(e);
            }
            started.push(node);
        }
        info!("Scenario {}: started {} nodes", self.name, started.len());
        Ok(())
    }

    /// Stop every node, in parallel
    pub fn stop_all(&self) {
        self.graph.nodes().par_iter().for_each(|(_, node)| node.stop_executing());
        info!("Scenario {}: stopped {} nodes", self.name, self.graph.nodes().len());
    }

    /// Start the nodes, wait for the termination condition and stop them
    pub fn run(&self) -> Result<RunOutcome, ScenarioError> {
        let started = Instant::now();
        self.start_all()?;

        let mut timed_out = false;
        loop {
            if self.termination.should_terminate(&self.graph) {
                debug!("Scenario {}: termination condition met", self.name);
                break;
            }
            if self.timeout.is_some_and(|timeout| started.elapsed() >= timeout) {
                warn!("Scenario {}: timed out after {:?}", self.name, started.elapsed());
                timed_out = true;
                break;
            }
            thread::sleep(self.poll_interval);
        }

        self.stop_all();

        let failed_nodes = self.failed_nodes();
        for (node, err) in &failed_nodes {
            warn!("Scenario {}: node {} failed: {}", self.name, node, err);
        }

        Ok(RunOutcome {
            elapsed: started.elapsed(),
            timed_out,
            failed_nodes,
        })
    }

    /// Nodes whose last run ended in an error
    pub fn failed_nodes(&self) -> Vec<(NodeIdentifier, EngineError)> {
        self.graph
            .nodes()
            .iter()
            .filter_map(|(id, node)| node.last_error().map(|err| (id.clone(), err)))
            .collect()
    }

    /// The report each node cached in its latest cycle
    pub fn latest_reports(&self) -> Vec<ResourceReport> {
        self.graph
            .nodes()
            .values()
            .filter_map(NodeAgent::latest_report)
            .filter(|report| report.demand_estimation_window() == self.window)
            .collect()
    }

    /// Summarize each region from the nodes' latest reports and hand every
    /// node the reports and summary of its own region.
    ///
    /// Nodes without a cached report do not contribute to their region.
    pub fn region_summaries(&self) -> Result<BTreeMap<RegionIdentifier, ResourceSummary>, MergeError> {
        let lookup = self.graph.region_lookup();
        let reports = self.latest_reports();
        let summaries = summarize_regions(reports.iter().cloned(), &lookup, self.window)?;

        let mut by_region: BTreeMap<RegionIdentifier, Vec<ResourceReport>> = BTreeMap::new();
        for report in reports {
            if let Some(region) = lookup.get(report.node()) {
                by_region.entry(region.clone()).or_default().push(report);
            }
        }

        let mut services_by_region: BTreeMap<RegionIdentifier, Vec<ServiceReport>> = BTreeMap::new();
        for node in self.graph.nodes().values() {
            services_by_region.entry(node.region()).or_default().push(node.service_report());
        }

        for node in self.graph.nodes().values() {
            let region = node.region();
            node.set_region_resource_reports(by_region.get(&region).cloned().unwrap_or_default());
            node.set_region_service_reports(services_by_region.get(&region).cloned().unwrap_or_default());
            if let Some(summary) = summaries.get(&region) {
                node.set_region_summary(summary.clone());
            }
        }

        Ok(summaries)
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("nodes", &self.graph.nodes().len())
            .field("clients", &self.graph.clients().len())
            .field("window", &self.window)
            .field("poll_interval", &self.poll_interval)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
