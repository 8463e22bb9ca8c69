//! Adapter for OpenAI-compatible backends
//!
//! llama.cpp's `llama-server`, vLLM, LM Studio and friends all speak this
//! schema natively, so requests pass through without translation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::config::ProviderSpec;
use super::http::HttpProviderCore;
use super::ProviderAdapter;
use crate::core::process::ProcessSupervisor;
use crate::core::types::{ChatCompletionRequest, ChatCompletionResponse};
use crate::utils::error::{GatewayError, Result};

/// OpenAI-compatible HTTP adapter
pub struct OpenAiCompatProvider {
    core: HttpProviderCore,
}

impl OpenAiCompatProvider {
    /// Wire type string used in provider records.
    pub const PROVIDER_TYPE: &'static str = "openai_compat";

    /// Build from a parsed provider record.
    pub fn new(
        spec: ProviderSpec,
        supervisor: Arc<ProcessSupervisor>,
        chat_timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            core: HttpProviderCore::new(spec, supervisor, chat_timeout)?,
        })
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatProvider {
    fn provider_id(&self) -> &str {
        &self.core.spec.provider_id
    }

    fn provider_type(&self) -> &'static str {
        Self::PROVIDER_TYPE
    }

    fn spec(&self) -> &ProviderSpec {
        &self.core.spec
    }

    async fn health_check(&self) -> bool {
        self.core.health_check().await
    }

    async fn list_models(&self) -> Vec<String> {
        if let Some(declared) = &self.core.spec.api.models.declared_models {
            return declared.clone();
        }
        let Some(body) = self.core.fetch_model_listing().await else {
            return Vec::new();
        };
        body.get("data")
            .and_then(|d| d.as_array())
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m.get("id").and_then(|id| id.as_str()))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let url = self.core.url("/v1/chat/completions");

        let mut call = self.core.chat_client.post(&url).json(request);
        if let Some(token) = self.core.bearer_token() {
            call = call.bearer_auth(token);
        }

        let response = call.send().await.map_err(|e| self.core.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.core.backend_error(status.as_u16(), &body));
        }

        response.json().await.map_err(|e| GatewayError::Provider {
            provider: self.core.spec.provider_id.clone(),
            detail: format!("invalid response body: {e}"),
        })
    }

    async fn start(&self) -> bool {
        self.core.start()
    }

    async fn stop(&self) {
        self.core.stop().await;
    }
}
