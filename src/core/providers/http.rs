//! Shared HTTP plumbing for provider adapters
//!
//! Both adapter variants front an HTTP backend and share the same health
//! probe, process lifecycle, and client setup; only the wire schema differs.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, error};

use super::config::{ProviderSpec, StopMethod};
use crate::core::process::ProcessSupervisor;
use crate::utils::error::{GatewayError, Result};

/// Connection setup shared by the HTTP adapter variants
pub struct HttpProviderCore {
    /// Parsed provider record
    pub spec: ProviderSpec,
    /// Client with the short health-probe timeout
    pub probe_client: Client,
    /// Client with the long chat-completion timeout
    pub chat_client: Client,
    supervisor: Arc<ProcessSupervisor>,
}

impl HttpProviderCore {
    /// Build the two HTTP clients and bind the supervisor.
    pub fn new(
        spec: ProviderSpec,
        supervisor: Arc<ProcessSupervisor>,
        chat_timeout: Duration,
    ) -> Result<Self> {
        let probe_client = Client::builder()
            .timeout(Duration::from_secs(spec.api.health.timeout_seconds))
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {e}")))?;
        let chat_client = Client::builder()
            .timeout(chat_timeout)
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            spec,
            probe_client,
            chat_client,
            supervisor,
        })
    }

    /// URL under this provider's base.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.spec.api.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// GET the configured health path; any transport failure is `false`.
    pub async fn health_check(&self) -> bool {
        let url = self.url(&self.spec.api.health.path);
        match self.probe_client.get(&url).send().await {
            Ok(response) => {
                let code = response.status().as_u16();
                self.spec.api.health.success_codes.contains(&code)
            }
            Err(e) => {
                debug!(provider = %self.spec.provider_id, error = %e, "health probe failed");
                false
            }
        }
    }

    /// Fetch the model-listing path, `None` when unset or on failure.
    ///
    /// Callers apply their schema-specific extraction to the JSON body.
    pub async fn fetch_model_listing(&self) -> Option<serde_json::Value> {
        let path = self.spec.api.models.path.as_deref()?;
        let url = self.url(path);
        match self.probe_client.get(&url).send().await {
            Ok(response) if response.status().is_success() => response.json().await.ok(),
            Ok(response) => {
                error!(
                    provider = %self.spec.provider_id,
                    status = response.status().as_u16(),
                    "failed to list models"
                );
                None
            }
            Err(e) => {
                error!(provider = %self.spec.provider_id, error = %e, "error listing models");
                None
            }
        }
    }

    /// Start the managed process; true for unmanaged providers.
    pub fn start(&self) -> bool {
        let Some(start) = self.spec.start.as_ref().filter(|s| s.enabled) else {
            return true;
        };
        self.supervisor.start_process(
            &self.spec.provider_id,
            &start.command,
            &start.args,
            start.cwd.as_deref(),
            &start.env,
        )
    }

    /// Stop the managed process per the configured method.
    pub async fn stop(&self) {
        if !self.spec.is_managed() {
            return;
        }
        if self.spec.stop.method == StopMethod::TerminateProcess {
            self.supervisor.stop_process(&self.spec.provider_id).await;
        }
    }

    /// Fold a reqwest transport failure into the normalized taxonomy.
    pub fn transport_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::ProviderTimeout(self.spec.provider_id.clone())
        } else if e.is_connect() {
            GatewayError::ProviderUnreachable {
                provider: self.spec.provider_id.clone(),
                detail: e.to_string(),
            }
        } else {
            GatewayError::Provider {
                provider: self.spec.provider_id.clone(),
                detail: e.to_string(),
            }
        }
    }

    /// Classify a non-success response body into the normalized taxonomy.
    pub fn backend_error(&self, status: u16, body: &str) -> GatewayError {
        let lower = body.to_lowercase();
        if lower.contains("out of memory") || lower.contains("oom") {
            GatewayError::ProviderOom(self.spec.provider_id.clone())
        } else if lower.contains("context length") || lower.contains("context window") {
            GatewayError::ContextLength(self.spec.provider_id.clone())
        } else {
            GatewayError::Provider {
                provider: self.spec.provider_id.clone(),
                detail: format!("{status} - {body}"),
            }
        }
    }

    /// Bearer token from the configured environment variable, if any.
    pub fn bearer_token(&self) -> Option<String> {
        let var = self.spec.api.auth_env.as_deref()?;
        std::env::var(var).ok()
    }
}
