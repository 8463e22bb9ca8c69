//! Shared test infrastructure

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use modelgate::config::{AppConfig, ConfigStore, ModelScoreConfig, RouteConfig};
use modelgate::core::types::{ChatCompletionRequest, ChatMessage};
use modelgate::core::RequestLog;
use modelgate::server::AppState;

/// App config tuned for tests: tiny chat timeout, no refresh cooldown.
pub fn test_app_config(providers_dir: &Path) -> AppConfig {
    let mut app = AppConfig::default();
    app.providers.config_dir = providers_dir.to_string_lossy().into_owned();
    app.runtime.refresh_cooldown_seconds = 0;
    app.runtime.request_timeout_seconds = 1;
    app
}

/// Wire up a full component graph over explicit config values.
///
/// The registry starts empty; call `state.registry.refresh()` once the
/// provider records are on disk.
pub fn build_state(
    app: AppConfig,
    routes: HashMap<String, RouteConfig>,
    models: HashMap<String, ModelScoreConfig>,
) -> AppState {
    let config = Arc::new(ConfigStore::from_values(app, routes, models));
    AppState::new(config, Arc::new(RequestLog::in_memory(64)))
}

/// Write an `openai_compat` provider record with a declared model list.
pub fn write_openai_provider(
    dir: &Path,
    file: &str,
    provider_id: &str,
    base_url: &str,
    models: &[&str],
) {
    let declared = models.join(", ");
    let record = format!(
        "provider_id: {provider_id}\n\
         provider_type: openai_compat\n\
         api:\n  base_url: {base_url}\n  health:\n    path: /health\n  models:\n    declared_models: [{declared}]\n"
    );
    std::fs::write(dir.join(file), record).unwrap();
}

/// A canonical request with a distinguishable message body.
pub fn chat_request(model: &str, content: &str) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.into(),
        messages: vec![ChatMessage::new("user", content)],
        temperature: None,
        top_p: None,
        n: None,
        stream: None,
        stop: None,
        max_tokens: None,
        presence_penalty: None,
        frequency_penalty: None,
        logit_bias: None,
        user: None,
    }
}

/// Canonical response envelope a mock backend returns.
pub fn envelope(model: &str, content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1700000000,
        "model": model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 1, "completion_tokens": 2, "total_tokens": 3}
    })
}

/// A mock model backend speaking the OpenAI-compatible schema.
pub struct MockBackend {
    /// Underlying wiremock server
    pub server: MockServer,
}

impl MockBackend {
    /// Start a backend that reports healthy.
    pub async fn healthy() -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Self { server }
    }

    /// Base URL for provider records.
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Serve chat completions with a fixed reply.
    pub async fn chat_ok(&self, model: &str, content: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(model, content)))
            .mount(&self.server)
            .await;
    }

    /// Serve chat completions with a fixed reply after a delay.
    pub async fn chat_ok_delayed(&self, model: &str, content: &str, delay: Duration) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(envelope(model, content))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Fail chat completions with a status and body.
    pub async fn chat_error(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// How many chat completions this backend has served.
    pub async fn chat_request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == "/v1/chat/completions")
            .count()
    }

    /// User message contents of the chat requests, in arrival order.
    pub async fn chat_request_contents(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == "/v1/chat/completions")
            .filter_map(|r| {
                let body: serde_json::Value = serde_json::from_slice(&r.body).ok()?;
                Some(body["messages"][0]["content"].as_str()?.to_string())
            })
            .collect()
    }
}
