//! Construction of graph vertices.

use crate::engine::EngineFactory;
use crate::identifiers::NodeIdentifier;
use crate::network::{AddressRegistry, UdpNetworkManager};
use crate::node::{ClientNode, CycleHooks, NodeAgent, NodeHandle, DEFAULT_CYCLE_INTERVAL};
use crate::report::EstimationWindow;
use crate::resource::{BasicResourceManager, Clock, SystemClock};
use log::debug;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Builds the vertices named by a topology
pub trait NetworkFactory {
    fn create_node(&self, name: &str, config: &Value) -> NodeAgent;

    fn create_client(&self, name: &str, config: &Value) -> ClientNode;
}

/// Nodes with a [`BasicResourceManager`] and a [`UdpNetworkManager`]
#[derive(Clone)]
pub struct BasicNetworkFactory {
    registry: Arc<AddressRegistry>,
    engine_factory: EngineFactory,
    cycle_interval: Duration,
    window: EstimationWindow,
    clock: Arc<dyn Clock>,
    hooks: CycleHooks,
}

impl BasicNetworkFactory {
    pub fn new(registry: Arc<AddressRegistry>, engine_factory: EngineFactory) -> Self {
        Self {
            registry,
            engine_factory,
            cycle_interval: DEFAULT_CYCLE_INTERVAL,
            window: EstimationWindow::default(),
            clock: Arc::new(SystemClock),
            hooks: CycleHooks::default(),
        }
    }

    pub fn with_cycle_interval(mut self, interval: Duration) -> Self {
        self.cycle_interval = interval;
        self
    }

    pub fn with_estimation_window(mut self, window: EstimationWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Hooks given to every node this factory creates
    pub fn with_hooks(mut self, hooks: CycleHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn registry(&self) -> &Arc<AddressRegistry> {
        &self.registry
    }
}

impl NetworkFactory for BasicNetworkFactory {
    fn create_node(&self, name: &str, config: &Value) -> NodeAgent {
        let id = NodeIdentifier::new(name);
        let handle = Arc::new(NodeHandle::new(id.clone()));
        let resource_manager = Arc::new(BasicResourceManager::new(
            Arc::clone(&handle),
            config,
            Arc::clone(&self.clock),
        ));
        let network = Arc::new(UdpNetworkManager::new(Arc::clone(&self.registry)));
        let engine = (self.engine_factory)(&id);

        let node = NodeAgent::builder(handle, engine, network)
            .resource_manager(resource_manager)
            .hooks(self.hooks.clone())
            .clock(Arc::clone(&self.clock))
            .estimation_window(self.window)
            .cycle_interval(self.cycle_interval)
            .build();
        node.process_extra_data(config);
        debug!("Created node {} in region {}", name, node.region());
        node
    }

    fn create_client(&self, name: &str, config: &Value) -> ClientNode {
        let client = ClientNode::new(NodeIdentifier::new(name));
        client.process_extra_data(config);
        debug!("Created client {} in region {}", name, client.region());
        client
    }
}

impl std::fmt::Debug for BasicNetworkFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicNetworkFactory")
            .field("cycle_interval", &self.cycle_interval)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
