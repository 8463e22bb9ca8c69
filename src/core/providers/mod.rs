//! Provider adapters
//!
//! A provider wraps one backend behind the capability set the scheduler
//! needs: probe, enumerate, complete, start, stop. New backend families plug
//! in through the [`AdapterBuilders`] table without touching the scheduler.

pub mod config;
pub mod http;
pub mod ollama;
pub mod openai_compat;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::process::ProcessSupervisor;
use crate::core::types::{ChatCompletionRequest, ChatCompletionResponse};
use crate::utils::error::Result;

pub use config::ProviderSpec;
pub use ollama::OllamaProvider;
pub use openai_compat::OpenAiCompatProvider;

/// Capability set of a backend
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Unique id within a registry snapshot.
    fn provider_id(&self) -> &str;

    /// Adapter family string.
    fn provider_type(&self) -> &'static str;

    /// The record this adapter was built from.
    fn spec(&self) -> &ProviderSpec;

    /// Whether the gateway owns this backend's process lifecycle.
    fn is_managed(&self) -> bool {
        self.spec().is_managed()
    }

    /// GET the health path; transport failures are `false`, never an error.
    async fn health_check(&self) -> bool;

    /// Model ids this backend offers. A declared list in configuration is
    /// returned without network I/O; on a failed fetch the list is empty.
    async fn list_models(&self) -> Vec<String>;

    /// One chat completion, translated to and from the backend's native
    /// schema when it is not canonical.
    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse>;

    /// Start the managed process; true when running (or unmanaged).
    async fn start(&self) -> bool;

    /// Stop the managed process; no-op when unmanaged.
    async fn stop(&self);
}

/// Everything a builder needs besides the record itself
#[derive(Clone)]
pub struct AdapterContext {
    /// Shared process supervisor
    pub supervisor: Arc<ProcessSupervisor>,
    /// Long per-call chat timeout
    pub chat_timeout: Duration,
}

/// Constructor signature for one adapter family
pub type AdapterBuilder =
    fn(ProviderSpec, AdapterContext) -> Result<Arc<dyn ProviderAdapter>>;

/// `provider_type` string to constructor table
pub struct AdapterBuilders {
    builders: HashMap<String, AdapterBuilder>,
}

impl AdapterBuilders {
    /// Table with the standard adapter families registered.
    pub fn standard() -> Self {
        let mut table = Self {
            builders: HashMap::new(),
        };
        table.register(OpenAiCompatProvider::PROVIDER_TYPE, |spec, ctx| {
            Ok(Arc::new(OpenAiCompatProvider::new(
                spec,
                ctx.supervisor,
                ctx.chat_timeout,
            )?))
        });
        table.register(OllamaProvider::PROVIDER_TYPE, |spec, ctx| {
            Ok(Arc::new(OllamaProvider::new(
                spec,
                ctx.supervisor,
                ctx.chat_timeout,
            )?))
        });
        table
    }

    /// Empty table, for callers that want full control over the families.
    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Register (or replace) a family constructor.
    pub fn register(&mut self, provider_type: impl Into<String>, builder: AdapterBuilder) {
        self.builders.insert(provider_type.into(), builder);
    }

    /// Constructor for a family, if registered.
    pub fn get(&self, provider_type: &str) -> Option<AdapterBuilder> {
        self.builders.get(provider_type).copied()
    }
}
