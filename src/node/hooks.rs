use crate::identifiers::NodeIdentifier;
use std::fmt;
use std::sync::Arc;

pub type Hook = Arc<dyn Fn(&NodeIdentifier) + Send + Sync>;

/// Callbacks run by a node around each cycle and before it stops
#[derive(Clone, Default)]
pub struct CycleHooks {
    pub(crate) pre_cycle: Option<Hook>,
    pub(crate) post_cycle: Option<Hook>,
    pub(crate) pre_stop: Option<Hook>,
}

impl CycleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs on the node thread before the engine cycle
    pub fn with_pre_cycle(mut self, hook: impl Fn(&NodeIdentifier) + Send + Sync + 'static) -> Self {
        self.pre_cycle = Some(Arc::new(hook));
        self
    }

    /// Runs on the node thread after the cycle's report is cached
    pub fn with_post_cycle(mut self, hook: impl Fn(&NodeIdentifier) + Send + Sync + 'static) -> Self {
        self.post_cycle = Some(Arc::new(hook));
        self
    }

    /// Runs on the stopping thread, before the network is shut down
    pub fn with_pre_stop(mut self, hook: impl Fn(&NodeIdentifier) + Send + Sync + 'static) -> Self {
        self.pre_stop = Some(Arc::new(hook));
        self
    }

    pub(crate) fn run_pre_cycle(&self, node: &NodeIdentifier) {
        if let Some(hook) = &self.pre_cycle {
            hook(node);
        }
    }

    pub(crate) fn run_post_cycle(&self, node: &NodeIdentifier) {
        if let Some(hook) = &self.post_cycle {
            hook(node);
        }
    }

    pub(crate) fn run_pre_stop(&self, node: &NodeIdentifier) {
        if let Some(hook) = &self.pre_stop {
            hook(node);
        }
    }
}

impl fmt::Debug for CycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CycleHooks")
            .field("pre_cycle", &self.pre_cycle.is_some())
            .field("post_cycle", &self.post_cycle.is_some())
            .field("pre_stop", &self.pre_stop.is_some())
            .finish()
    }
}
