//! Application state shared across HTTP handlers

use std::sync::Arc;

use crate::config::ConfigStore;
use crate::core::{ProcessSupervisor, Registry, RequestController, RequestLog, Scheduler};

/// Shared resources handed to every request handler
#[derive(Clone)]
pub struct AppState {
    /// Reloadable configuration
    pub config: Arc<ConfigStore>,
    /// Provider registry
    pub registry: Arc<Registry>,
    /// Job scheduler
    pub scheduler: Arc<Scheduler>,
    /// Per-request fallback controller
    pub controller: Arc<RequestController>,
    /// Request log ring + sink
    pub request_log: Arc<RequestLog>,
    /// Managed-process supervisor
    pub supervisor: Arc<ProcessSupervisor>,
}

impl AppState {
    /// Wire up the component graph over a loaded config store.
    ///
    /// The registry starts empty; callers run the initial
    /// [`Registry::refresh`] before serving traffic.
    pub fn new(config: Arc<ConfigStore>, request_log: Arc<RequestLog>) -> Self {
        let supervisor = Arc::new(ProcessSupervisor::new());
        let registry = Arc::new(Registry::new(
            Arc::clone(&config),
            Arc::clone(&supervisor),
        ));
        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&config),
            Arc::clone(&registry),
            Arc::clone(&request_log),
        ));
        let controller = Arc::new(RequestController::new(
            Arc::clone(&config),
            Arc::clone(&registry),
            Arc::clone(&scheduler),
        ));
        Self {
            config,
            registry,
            scheduler,
            controller,
            request_log,
            supervisor,
        }
    }
}
