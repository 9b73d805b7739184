//! Node execution lifecycle.
//!
//! Every [`NodeAgent`] owns one execution thread. The thread repeats the
//! cycle (pre-cycle hook, one engine cycle, report caching, post-cycle hook)
//! and then sleeps for the cycle interval. A stop request wakes the sleep
//! and `stop_executing` joins the thread before it returns.

use super::extra_data;
use super::hooks::CycleHooks;
use super::region_state::RegionNodeState;
use super::NodeHandle;
use crate::engine::{Engine, EngineError, ExecutionContext};
use crate::identifiers::{NodeIdentifier, RegionIdentifier};
use crate::network::{NeighborState, NetworkError, NetworkManager};
use crate::report::{EstimationWindow, ResourceReport, ResourceSummary, ServiceReport};
use crate::resource::{Clock, NullResourceManager, ResourceManager, SystemClock};
use crate::sync::lock;
use log::{debug, error, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Time between the end of one cycle and the start of the next
pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Node {0} is already executing")]
    InvalidState(NodeIdentifier),
    #[error("Failed to start network for node {node}: {source}")]
    Network { node: NodeIdentifier, source: NetworkError },
    #[error("Failed to spawn execution thread for node {node}: {source}")]
    Spawn { node: NodeIdentifier, source: std::io::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Never started
    Idle,
    Running,
    /// Stopped by `stop_executing`
    Stopped,
    /// The cycle raised an error; see `last_error`
    Failed,
}

#[derive(Debug)]
struct Control {
    running: bool,
    thread: Option<JoinHandle<()>>,
    state: LifecycleState,
}

struct AgentShared {
    handle: Arc<NodeHandle>,
    resource_manager: Arc<dyn ResourceManager>,
    network: Arc<dyn NetworkManager>,
    engine: Mutex<Box<dyn Engine>>,
    hooks: CycleHooks,
    clock: Arc<dyn Clock>,
    window: EstimationWindow,
    cycle_interval: Duration,
    control: Mutex<Control>,
    wake: Condvar,
    execution_count: AtomicU64,
    latest_report: Mutex<Option<ResourceReport>>,
    region_state: Mutex<RegionNodeState>,
    last_error: Mutex<Option<EngineError>>,
}

/// Engine's view of the node during one cycle
struct CycleContext<'a> {
    node: &'a NodeIdentifier,
    clock: &'a dyn Clock,
    network: &'a dyn NetworkManager,
    rng: &'a mut StdRng,
    round: u64,
}

impl ExecutionContext for CycleContext<'_> {
    fn node_id(&self) -> &NodeIdentifier {
        self.node
    }

    fn current_time(&self) -> i64 {
        self.clock.current_time_millis()
    }

    fn next_random(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn neighbor_states(&self) -> BTreeMap<NodeIdentifier, NeighborState> {
        self.network.neighbor_states()
    }

    fn share(&mut self, values: BTreeMap<String, f64>) {
        self.network.share(self.round, &values);
    }
}

impl AgentShared {
    fn id(&self) -> &NodeIdentifier {
        self.handle.id()
    }

    fn is_running(&self) -> bool {
        lock(&self.control).running
    }

    /// One pass of the cycle. Returns early, without error, as soon as a stop
    /// is observed between steps.
    fn run_cycle(&self, rng: &mut StdRng) -> Result<(), EngineError> {
        self.hooks.run_pre_cycle(self.id());
        if !self.is_running() {
            return Ok(());
        }

        self.network.begin_cycle();
        {
            let mut engine = lock(&self.engine);
            let mut ctx = CycleContext {
                node: self.id(),
                clock: self.clock.as_ref(),
                network: self.network.as_ref(),
                rng,
                round: self.execution_count.load(Ordering::SeqCst) + 1,
            };
            engine.run_cycle(&mut ctx)?;
        }
        let count = self.execution_count.fetch_add(1, Ordering::SeqCst) + 1;
        trace!("{}: completed cycle {}", self.id(), count);
        if !self.is_running() {
            return Ok(());
        }

        let report = self.resource_manager.current_resource_report(self.window);
        *lock(&self.latest_report) = Some(report);
        if !self.is_running() {
            return Ok(());
        }

        self.hooks.run_post_cycle(self.id());
        Ok(())
    }

    /// Sleep for the cycle interval or until stopped. Returns whether the
    /// node should keep running.
    fn sleep(&self) -> bool {
        let control = lock(&self.control);
        let (control, _) = self
            .wake
            .wait_timeout_while(control, self.cycle_interval, |control| control.running)
            .unwrap_or_else(PoisonError::into_inner);
        control.running
    }

    fn fail(&self, err: EngineError) {
        error!("{}: execution stopped by error: {}", self.id(), err);
        *lock(&self.last_error) = Some(err);
        let mut control = lock(&self.control);
        control.running = false;
        control.state = LifecycleState::Failed;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn execution_loop(shared: Arc<AgentShared>) {
    let mut rng = StdRng::from_entropy();
    trace!("{}: execution thread started", shared.id());

    while shared.is_running() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| shared.run_cycle(&mut rng)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                shared.fail(err);
                break;
            }
            Err(payload) => {
                shared.fail(EngineError::Panicked {
                    node: shared.id().clone(),
                    message: panic_message(payload.as_ref()),
                });
                break;
            }
        }

        if !shared.sleep() {
            break;
        }
    }

    trace!("{}: execution thread exiting", shared.id());
}

/// A server vertex with its own execution thread
pub struct NodeAgent {
    shared: Arc<AgentShared>,
}

impl NodeAgent {
    pub fn builder(
        handle: Arc<NodeHandle>,
        engine: Box<dyn Engine>,
        network: Arc<dyn NetworkManager>,
    ) -> NodeAgentBuilder {
        NodeAgentBuilder {
            handle,
            engine,
            network,
            resource_manager: None,
            hooks: CycleHooks::default(),
            clock: Arc::new(SystemClock),
            window: EstimationWindow::default(),
            cycle_interval: DEFAULT_CYCLE_INTERVAL,
        }
    }

    pub fn id(&self) -> &NodeIdentifier {
        self.shared.id()
    }

    pub fn handle(&self) -> &Arc<NodeHandle> {
        &self.shared.handle
    }

    pub fn region(&self) -> RegionIdentifier {
        self.shared.handle.region()
    }

    /// Move the node to `region`, discarding everything cached for the old one
    pub fn set_region(&self, region: RegionIdentifier) {
        self.shared.handle.set_region(region.clone());
        *lock(&self.shared.latest_report) = None;
        *lock(&self.shared.region_state) = RegionNodeState::new(region);
        self.shared.network.clear_neighbor_states();
    }

    /// Apply the `region` and `pool` entries of a node configuration document
    pub fn process_extra_data(&self, config: &Value) {
        if let Some(region) = extra_data::region_from(config) {
            self.set_region(region);
        }
        if config.get(extra_data::POOL_KEY).is_some() {
            self.shared.handle.set_pool(extra_data::is_pool(config));
        }
    }

    pub fn is_pool(&self) -> bool {
        self.shared.handle.is_pool()
    }

    pub fn cycle_interval(&self) -> Duration {
        self.shared.cycle_interval
    }

    pub fn estimation_window(&self) -> EstimationWindow {
        self.shared.window
    }

    pub fn resource_manager(&self) -> &Arc<dyn ResourceManager> {
        &self.shared.resource_manager
    }

    pub fn network_manager(&self) -> &Arc<dyn NetworkManager> {
        &self.shared.network
    }

    /// Launch the execution thread.
    ///
    /// # Returns
    /// * `Err(LifecycleError::InvalidState)` if the node is already running
    /// * `Err(LifecycleError::Network)` if the network manager cannot start
    pub fn start_executing(&self) -> Result<(), LifecycleError> {
        let shared = &self.shared;

        // a thread left behind by a failed cycle or a stop from inside a hook
        // is reaped before restarting
        let stale = {
            let mut control = lock(&shared.control);
            if control.running {
                return Err(LifecycleError::InvalidState(shared.id().clone()));
            }
            if control
                .thread
                .as_ref()
                .is_some_and(|thread| thread.thread().id() == thread::current().id())
            {
                return Err(LifecycleError::InvalidState(shared.id().clone()));
            }
            control.thread.take()
        };
        if let Some(thread) = stale {
            shared.network.stop();
            if thread.join().is_err() {
                warn!("{}: previous execution thread panicked", shared.id());
            }
        }

        let mut control = lock(&shared.control);
        if control.running || control.thread.is_some() {
            return Err(LifecycleError::InvalidState(shared.id().clone()));
        }

        trace!("{}: starting network", shared.id());
        shared
            .network
            .start(Arc::clone(&shared.handle))
            .map_err(|source| LifecycleError::Network {
                node: shared.id().clone(),
                source,
            })?;

        control.running = true;
        *lock(&shared.last_error) = None;
        let thread_shared = Arc::clone(shared);
        let spawned = thread::Builder::new()
            .name(format!("node-{}", shared.id()))
            .spawn(move || execution_loop(thread_shared));

        match spawned {
            Ok(thread) => {
                control.thread = Some(thread);
                control.state = LifecycleState::Running;
                debug!("{}: started executing", shared.id());
                Ok(())
            }
            Err(source) => {
                control.running = false;
                drop(control);
                shared.network.stop();
                Err(LifecycleError::Spawn {
                    node: shared.id().clone(),
                    source,
                })
            }
        }
    }

    /// Stop the execution thread and wait for it to exit. Does nothing if the
    /// node is not running.
    ///
    /// Called from the node's own thread (from a hook), the thread cannot be
    /// joined; its handle stays behind and the next start or stop joins it.
    pub fn stop_executing(&self) {
        let shared = &self.shared;

        let (thread, signal) = {
            let mut control = lock(&shared.control);
            if !control.running && control.thread.is_none() {
                return;
            }
            // a previous stop already ran the hook and stopped the network
            let signal = control.running || control.state == LifecycleState::Failed;
            control.running = false;
            (control.thread.take(), signal)
        };

        if signal {
            trace!("{}: stopping", shared.id());
            let hook = panic::catch_unwind(AssertUnwindSafe(|| shared.hooks.run_pre_stop(shared.id())));
            if let Err(payload) = hook {
                error!("{}: pre-stop hook panicked: {}", shared.id(), panic_message(payload.as_ref()));
            }
            shared.network.stop();
        }
        shared.wake.notify_all();

        let mut detached = None;
        if let Some(thread) = thread {
            if thread.thread().id() == thread::current().id() {
                debug!("{}: stop requested from the execution thread, join deferred", shared.id());
                detached = Some(thread);
            } else if thread.join().is_err() {
                warn!("{}: execution thread panicked", shared.id());
            }
        }

        let mut control = lock(&shared.control);
        if detached.is_some() {
            control.thread = detached;
        }
        if control.state != LifecycleState::Failed {
            control.state = LifecycleState::Stopped;
        }
        debug!("{}: stopped executing", shared.id());
    }

    /// True while the execution thread is alive and has not been told to stop
    pub fn is_executing(&self) -> bool {
        let control = lock(&self.shared.control);
        control.running && control.thread.as_ref().is_some_and(|thread| !thread.is_finished())
    }

    pub fn state(&self) -> LifecycleState {
        lock(&self.shared.control).state
    }

    /// Number of completed engine cycles since creation
    pub fn execution_count(&self) -> u64 {
        self.shared.execution_count.load(Ordering::SeqCst)
    }

    /// The error that ended the last run, if it ended that way
    pub fn last_error(&self) -> Option<EngineError> {
        lock(&self.shared.last_error).clone()
    }

    /// Report cached at the end of the most recent cycle
    pub fn latest_report(&self) -> Option<ResourceReport> {
        lock(&self.shared.latest_report).clone()
    }

    pub fn current_resource_report(&self, window: EstimationWindow) -> ResourceReport {
        self.shared.resource_manager.current_resource_report(window)
    }

    pub fn service_report(&self) -> ServiceReport {
        self.shared.resource_manager.service_report()
    }

    pub fn region_state(&self) -> RegionNodeState {
        lock(&self.shared.region_state).clone()
    }

    pub fn set_region_resource_reports(&self, reports: Vec<ResourceReport>) {
        trace!("{}: setting {} region resource reports", self.id(), reports.len());
        lock(&self.shared.region_state).set_resource_reports(reports);
    }

    pub fn set_region_service_reports(&self, reports: Vec<ServiceReport>) {
        trace!("{}: setting {} region service reports", self.id(), reports.len());
        lock(&self.shared.region_state).set_service_reports(reports);
    }

    pub fn set_region_summary(&self, summary: ResourceSummary) {
        lock(&self.shared.region_state).set_summary(summary);
    }
}

impl Drop for NodeAgent {
    fn drop(&mut self) {
        self.stop_executing();
    }
}

impl fmt::Debug for NodeAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeAgent")
            .field("id", self.id())
            .field("region", &self.region())
            .field("state", &self.state())
            .field("execution_count", &self.execution_count())
            .finish_non_exhaustive()
    }
}

pub struct NodeAgentBuilder {
    handle: Arc<NodeHandle>,
    engine: Box<dyn Engine>,
    network: Arc<dyn NetworkManager>,
    resource_manager: Option<Arc<dyn ResourceManager>>,
    hooks: CycleHooks,
    clock: Arc<dyn Clock>,
    window: EstimationWindow,
    cycle_interval: Duration,
}

impl NodeAgentBuilder {
    /// Defaults to a [`NullResourceManager`]
    pub fn resource_manager(mut self, manager: Arc<dyn ResourceManager>) -> Self {
        self.resource_manager = Some(manager);
        self
    }

    pub fn hooks(mut self, hooks: CycleHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Window used for the report cached each cycle
    pub fn estimation_window(mut self, window: EstimationWindow) -> Self {
        self.window = window;
        self
    }

    pub fn cycle_interval(mut self, interval: Duration) -> Self {
        self.cycle_interval = interval;
        self
    }

    pub fn build(self) -> NodeAgent {
        let region = self.handle.region();
        let resource_manager = self
            .resource_manager
            .unwrap_or_else(|| Arc::new(NullResourceManager::new(self.handle.id().clone())));

        NodeAgent {
            shared: Arc::new(AgentShared {
                handle: self.handle,
                resource_manager,
                network: self.network,
                engine: Mutex::new(self.engine),
                hooks: self.hooks,
                clock: self.clock,
                window: self.window,
                cycle_interval: self.cycle_interval,
                control: Mutex::new(Control {
                    running: false,
                    thread: None,
                    state: LifecycleState::Idle,
                }),
                wake: Condvar::new(),
                execution_count: AtomicU64::new(0),
                latest_report: Mutex::new(None),
                region_state: Mutex::new(RegionNodeState::new(region)),
                last_error: Mutex::new(None),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::HeartbeatEngine;
    use crate::network::manager::testing::SilentNetworkManager;
    use crate::resource::{BasicResourceManager, ManualClock};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::sync::{OnceLock, Weak};
    use std::time::Instant;

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    fn agent_with(engine: Box<dyn Engine>, interval: Duration) -> (NodeAgent, Arc<SilentNetworkManager>) {
        let network = Arc::new(SilentNetworkManager::default());
        let handle = Arc::new(NodeHandle::new(NodeIdentifier::new("node0")));
        let agent = NodeAgent::builder(handle, engine, network.clone())
            .cycle_interval(interval)
            .build();
        (agent, network)
    }

    struct FailingEngine {
        after: u64,
        cycles: u64,
    }

    impl Engine for FailingEngine {
        fn run_cycle(&mut self, ctx: &mut dyn ExecutionContext) -> Result<(), EngineError> {
            self.cycles += 1;
            if self.cycles > self.after {
                return Err(EngineError::Failed {
                    node: ctx.node_id().clone(),
                    message: "boom".to_string(),
                });
            }
            Ok(())
        }
    }

    struct PanickingEngine;

    impl Engine for PanickingEngine {
        fn run_cycle(&mut self, _ctx: &mut dyn ExecutionContext) -> Result<(), EngineError> {
            panic!("engine exploded");
        }
    }

    struct SlowEngine(Duration);

    impl Engine for SlowEngine {
        fn run_cycle(&mut self, _ctx: &mut dyn ExecutionContext) -> Result<(), EngineError> {
            thread::sleep(self.0);
            Ok(())
        }
    }

    #[test]
    fn test_start_then_stop() {
        let (agent, network) = agent_with(Box::new(HeartbeatEngine::new()), Duration::from_millis(10));
        assert_eq!(agent.state(), LifecycleState::Idle);

        agent.start_executing().unwrap();
        assert!(agent.is_executing());
        assert_eq!(agent.state(), LifecycleState::Running);

        agent.stop_executing();
        assert!(!agent.is_executing());
        assert_eq!(agent.state(), LifecycleState::Stopped);
        assert_eq!(network.starts.load(Ordering::SeqCst), 1);
        assert_eq!(network.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_double_start_is_invalid() {
        let (agent, _) = agent_with(Box::new(HeartbeatEngine::new()), Duration::from_millis(10));
        agent.start_executing().unwrap();

        let err = agent.start_executing().unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidState(ref node) if node.name() == "node0"));
        agent.stop_executing();
    }

    #[test]
    fn test_stop_when_not_running_is_a_no_op() {
        let (agent, network) = agent_with(Box::new(HeartbeatEngine::new()), Duration::from_millis(10));
        agent.stop_executing();
        assert_eq!(agent.state(), LifecycleState::Idle);
        assert_eq!(network.stops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stop_wakes_a_long_sleep() {
        let (agent, _) = agent_with(Box::new(HeartbeatEngine::new()), Duration::from_secs(60));
        agent.start_executing().unwrap();
        assert!(wait_for(|| agent.execution_count() >= 1));

        let started = Instant::now();
        agent.stop_executing();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!agent.is_executing());
    }

    #[test]
    fn test_stop_during_a_cycle_waits_for_it() {
        let (agent, _) = agent_with(Box::new(SlowEngine(Duration::from_millis(100))), Duration::from_millis(1));
        agent.start_executing().unwrap();
        thread::sleep(Duration::from_millis(20));

        agent.stop_executing();
        assert!(!agent.is_executing());
        assert_eq!(agent.state(), LifecycleState::Stopped);
    }

    #[test]
    fn test_engine_error_is_recorded() {
        let engine = FailingEngine { after: 2, cycles: 0 };
        let (agent, _) = agent_with(Box::new(engine), Duration::from_millis(1));
        agent.start_executing().unwrap();

        assert!(wait_for(|| agent.state() == LifecycleState::Failed));
        assert!(!agent.is_executing());
        assert_eq!(agent.execution_count(), 2);
        assert!(matches!(agent.last_error(), Some(EngineError::Failed { ref message, .. }) if message == "boom"));

        // cleanup still stops the network and keeps the failure visible
        agent.stop_executing();
        assert_eq!(agent.state(), LifecycleState::Failed);
        assert!(agent.last_error().is_some());
    }

    #[test]
    fn test_engine_panic_is_contained() {
        let (agent, _) = agent_with(Box::new(PanickingEngine), Duration::from_millis(1));
        agent.start_executing().unwrap();

        assert!(wait_for(|| agent.state() == LifecycleState::Failed));
        match agent.last_error() {
            Some(EngineError::Panicked { message, .. }) => assert_eq!(message, "engine exploded"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_restart_after_failure() {
        let engine = FailingEngine { after: 1, cycles: 0 };
        let (agent, network) = agent_with(Box::new(engine), Duration::from_millis(1));
        agent.start_executing().unwrap();
        assert!(wait_for(|| agent.state() == LifecycleState::Failed));

        // the engine keeps failing, but the restart itself must succeed
        agent.start_executing().unwrap();
        assert!(wait_for(|| agent.state() == LifecycleState::Failed));
        agent.stop_executing();
        assert_eq!(network.starts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_hooks_run_around_cycles() {
        let pre = Arc::new(AtomicUsize::new(0));
        let post = Arc::new(AtomicUsize::new(0));
        let stop = Arc::new(AtomicUsize::new(0));
        let hooks = {
            let (pre, post, stop) = (pre.clone(), post.clone(), stop.clone());
            CycleHooks::new()
                .with_pre_cycle(move |_| {
                    pre.fetch_add(1, Ordering::SeqCst);
                })
                .with_post_cycle(move |_| {
                    post.fetch_add(1, Ordering::SeqCst);
                })
                .with_pre_stop(move |_| {
                    stop.fetch_add(1, Ordering::SeqCst);
                })
        };

        let network = Arc::new(SilentNetworkManager::default());
        let handle = Arc::new(NodeHandle::new(NodeIdentifier::new("hooked")));
        let agent = NodeAgent::builder(handle, Box::new(HeartbeatEngine::new()), network)
            .hooks(hooks)
            .cycle_interval(Duration::from_millis(1))
            .build();

        agent.start_executing().unwrap();
        assert!(wait_for(|| post.load(Ordering::SeqCst) >= 3));
        agent.stop_executing();

        assert!(pre.load(Ordering::SeqCst) >= post.load(Ordering::SeqCst));
        assert_eq!(stop.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_pre_stop_hook_still_stops() {
        let hooks = CycleHooks::new().with_pre_stop(|_| panic!("hook boom"));
        let network = Arc::new(SilentNetworkManager::default());
        let handle = Arc::new(NodeHandle::new(NodeIdentifier::new("fragile")));
        let agent = NodeAgent::builder(handle, Box::new(HeartbeatEngine::new()), network.clone())
            .hooks(hooks)
            .cycle_interval(Duration::from_millis(1))
            .build();

        agent.start_executing().unwrap();
        assert!(wait_for(|| agent.execution_count() >= 1));

        let stopped = panic::catch_unwind(AssertUnwindSafe(|| agent.stop_executing()));
        assert!(stopped.is_ok());
        assert!(!agent.is_executing());
        assert_eq!(agent.state(), LifecycleState::Stopped);
        assert_eq!(network.stops.load(Ordering::SeqCst), 1);
        assert!(lock(&agent.shared.control).thread.is_none());
    }

    #[test]
    fn test_stop_from_own_thread_is_joined_later() {
        let slot: Arc<OnceLock<Weak<NodeAgent>>> = Arc::new(OnceLock::new());
        let stopped_once = Arc::new(AtomicBool::new(false));
        let stop_hooks = Arc::new(AtomicUsize::new(0));
        let hooks = {
            let (slot, stopped_once, stop_hooks) = (slot.clone(), stopped_once.clone(), stop_hooks.clone());
            CycleHooks::new()
                .with_post_cycle(move |_| {
                    if !stopped_once.swap(true, Ordering::SeqCst) {
                        if let Some(agent) = slot.get().and_then(Weak::upgrade) {
                            agent.stop_executing();
                        }
                    }
                })
                .with_pre_stop(move |_| {
                    stop_hooks.fetch_add(1, Ordering::SeqCst);
                })
        };

        let network = Arc::new(SilentNetworkManager::default());
        let handle = Arc::new(NodeHandle::new(NodeIdentifier::new("selfstop")));
        let agent = Arc::new(
            NodeAgent::builder(handle, Box::new(HeartbeatEngine::new()), network.clone())
                .hooks(hooks)
                .cycle_interval(Duration::from_millis(1))
                .build(),
        );
        slot.set(Arc::downgrade(&agent)).unwrap();

        agent.start_executing().unwrap();
        assert!(wait_for(|| agent.state() == LifecycleState::Stopped));
        assert!(!agent.is_executing());
        // the handle is kept so the thread is not left detached
        assert!(lock(&agent.shared.control).thread.is_some());

        // restarting joins the old thread before spawning a new one
        agent.start_executing().unwrap();
        assert!(wait_for(|| agent.execution_count() >= 3));
        agent.stop_executing();

        assert_eq!(agent.state(), LifecycleState::Stopped);
        assert_eq!(network.starts.load(Ordering::SeqCst), 2);
        assert_eq!(stop_hooks.load(Ordering::SeqCst), 2);
        assert!(lock(&agent.shared.control).thread.is_none());
    }

    #[test]
    fn test_report_is_cached_and_reset_by_region_change() {
        let network = Arc::new(SilentNetworkManager::default());
        let handle = Arc::new(NodeHandle::new(NodeIdentifier::new("reporter")));
        let clock = Arc::new(ManualClock::new(777));
        let config = json!({
            "region": "east",
            "resource-report": { "serverCapacity": { "CPU": 2 } }
        });
        let manager = Arc::new(BasicResourceManager::new(handle.clone(), &config, clock.clone()));
        let agent = NodeAgent::builder(handle, Box::new(HeartbeatEngine::new()), network)
            .resource_manager(manager)
            .clock(clock)
            .estimation_window(EstimationWindow::Long)
            .cycle_interval(Duration::from_millis(1))
            .build();
        agent.process_extra_data(&config);
        assert_eq!(agent.region(), RegionIdentifier::new("east"));

        agent.start_executing().unwrap();
        assert!(wait_for(|| agent.latest_report().is_some()));
        agent.stop_executing();

        let report = agent.latest_report().unwrap();
        assert_eq!(report.timestamp(), 777);
        assert_eq!(report.demand_estimation_window(), EstimationWindow::Long);

        agent.set_region(RegionIdentifier::new("west"));
        assert!(agent.latest_report().is_none());
        assert_eq!(agent.region_state().region(), &RegionIdentifier::new("west"));
    }

    #[test]
    fn test_pool_flag() {
        let (agent, _) = agent_with(Box::new(HeartbeatEngine::new()), Duration::from_millis(10));
        agent.process_extra_data(&json!({"pool": "true"}));
        assert!(agent.is_pool());
        agent.process_extra_data(&json!({"pool": false}));
        assert!(!agent.is_pool());
    }
}
