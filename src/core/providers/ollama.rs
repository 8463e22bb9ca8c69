//! Adapter for Ollama backends
//!
//! Ollama lists models under its own schema and serves chat at `/api/chat`,
//! so both directions are translated to and from the canonical envelope.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::config::ProviderSpec;
use super::http::HttpProviderCore;
use super::ProviderAdapter;
use crate::core::process::ProcessSupervisor;
use crate::core::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Choice, Usage,
};
use crate::utils::error::{GatewayError, Result};

/// Ollama HTTP adapter
pub struct OllamaProvider {
    core: HttpProviderCore,
}

impl OllamaProvider {
    /// Wire type string used in provider records.
    pub const PROVIDER_TYPE: &'static str = "ollama";

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

    fn translate_request(request: &ChatCompletionRequest) -> serde_json::Value {
        let mut options = serde_json::Map::new();
        if let Some(temperature) = request.temperature {
            options.insert("temperature".into(), json!(temperature));
        }
        if let Some(top_p) = request.top_p {
            options.insert("top_p".into(), json!(top_p));
        }
        if let Some(max_tokens) = request.max_tokens {
            options.insert("num_predict".into(), json!(max_tokens));
        }

        json!({
            "model": request.model,
            "messages": request
                .messages
                .iter()
                .map(|m| json!({"role": m.role, "content": m.content}))
                .collect::<Vec<_>>(),
            "stream": false,
            "options": options,
        })
    }

    fn translate_response(
        model: &str,
        body: &serde_json::Value,
    ) -> ChatCompletionResponse {
        let message = body.get("message").cloned().unwrap_or_default();
        let role = message
            .get("role")
            .and_then(|r| r.as_str())
            .unwrap_or("assistant");
        let content = message
            .get("content")
            .and_then(|c| c.as_str())
            .unwrap_or_default();
        let done = body.get("done").and_then(|d| d.as_bool()).unwrap_or(false);

        let prompt_tokens = body
            .get("prompt_eval_count")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;
        let completion_tokens = body.get("eval_count").and_then(|v| v.as_u64()).unwrap_or(0) as u32;

        ChatCompletionResponse {
            id: format!("chatcmpl-{}", Uuid::new_v4()),
            object: "chat.completion".to_string(),
            created: Utc::now().timestamp() as u64,
            model: model.to_string(),
            choices: vec![Choice {
                index: 0,
                message: ChatMessage::new(role, content),
                finish_reason: Some(if done { "stop" } else { "length" }.to_string()),
            }],
            usage: Some(Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }),
        }
    }
}

#[async_trait]
impl ProviderAdapter for OllamaProvider {
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
        body.get("models")
            .and_then(|m| m.as_array())
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m.get("name").and_then(|n| n.as_str()))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let url = self.core.url("/api/chat");
        let payload = Self::translate_request(request);

        let response = self
            .core
            .chat_client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.core.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.core.backend_error(status.as_u16(), &body));
        }

        let body: serde_json::Value =
            response.json().await.map_err(|e| GatewayError::Provider {
                provider: self.core.spec.provider_id.clone(),
                detail: format!("invalid response body: {e}"),
            })?;
        Ok(Self::translate_response(&request.model, &body))
    }

    async fn start(&self) -> bool {
        self.core.start()
    }

    async fn stop(&self) {
        self.core.stop().await;
    }
}
