//! # modelgate
//!
//! A local AI orchestrator: one OpenAI-compatible chat-completion endpoint
//! in front of heterogeneous, locally managed model runtimes.
//!
//! Clients address a concrete model id or a logical `route:<name>`. The
//! gateway resolves the name, admits the request into a per-model queue,
//! dispatches it when the concurrency rules allow, starts managed backend
//! processes as needed, and walks the route's fallback chain on failure.
//!
//! ## Gateway mode
//!
//! ```rust,no_run
//! use modelgate::{config::ConfigPaths, Gateway};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = Gateway::new(ConfigPaths::default()).await?;
//!     gateway.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod server;
pub mod utils;

use std::sync::Arc;

use tracing::info;

pub use config::{AppConfig, ConfigPaths, ConfigStore};
pub use core::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
pub use utils::error::{GatewayError, NormalizedCode, Result};

use core::RequestLog;
use server::{AppState, HttpServer};

/// The assembled orchestrator
///
/// Explicitly constructed component graph: config store, supervisor,
/// registry, scheduler, controller, and request log, with no process-wide
/// mutable state.
pub struct Gateway {
    state: AppState,
}

impl Gateway {
    /// Load configuration, wire up the components, and run the initial
    /// provider discovery.
    pub async fn new(paths: ConfigPaths) -> Result<Self> {
        info!("starting local AI orchestrator");
        let config = Arc::new(ConfigStore::load(paths)?);
        let request_log = Arc::new(RequestLog::open(&config.app().logging)?);
        let state = AppState::new(config, request_log);

        state.registry.refresh().await;
        info!(
            models = state.registry.model_ids().len(),
            "initial provider discovery complete"
        );

        Ok(Self { state })
    }

    /// Shared application state, for embedding without the HTTP server.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve HTTP until stopped.
    pub async fn run(self) -> Result<()> {
        let server_config = self.state.config.app().server.clone();
        HttpServer::new(server_config, self.state).start().await
    }
}

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
