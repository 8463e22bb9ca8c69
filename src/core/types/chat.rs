//! Canonical chat-completion envelope (OpenAI compatible)
//!
//! Every adapter translates its backend's native schema to and from these
//! types; the rest of the gateway only ever sees this shape.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role (`system`, `user`, `assistant`, ...)
    pub role: String,
    /// Message content
    pub content: String,
    /// Optional participant name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    /// Build a message with the given role and content.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            name: None,
        }
    }
}

/// Stop sequences, either a single string or a list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StopSequence {
    /// A single stop string
    One(String),
    /// Several stop strings
    Many(Vec<String>),
}

/// Chat completion request (OpenAI compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Model id, or `route:<name>` for a logical route
    pub model: String,
    /// Conversation so far
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Number of completions to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    /// Streaming flag; accepted for compatibility but always treated as false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Stop sequences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopSequence>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Presence penalty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    /// Frequency penalty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    /// Logit bias
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<HashMap<String, f32>>,
    /// End-user identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl ChatCompletionRequest {
    /// Copy of this request with the `model` field replaced.
    ///
    /// The controller uses this so adapters see the concrete resolved id
    /// while the original request stays untouched for logging.
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        let mut request = self.clone();
        request.model = model.into();
        request
    }
}

/// One generated completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Choice index
    pub index: u32,
    /// Generated message
    pub message: ChatMessage,
    /// Why generation stopped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt tokens
    pub prompt_tokens: u32,
    /// Completion tokens
    pub completion_tokens: u32,
    /// Total tokens
    pub total_tokens: u32,
}

/// Chat completion response (OpenAI compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    /// Response id
    pub id: String,
    /// Always `chat.completion`
    #[serde(default = "default_chat_object")]
    pub object: String,
    /// Creation timestamp (unix seconds)
    pub created: u64,
    /// Model that served the request
    pub model: String,
    /// Generated choices
    pub choices: Vec<Choice>,
    /// Usage statistics, when the backend reports them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

fn default_chat_object() -> String {
    "chat.completion".to_string()
}

/// One entry in the `/v1/models` listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Model id (or synthetic `route:<name>`)
    pub id: String,
    /// Always `model`
    pub object: String,
    /// Owning component
    pub owned_by: String,
    /// Always empty; kept for client compatibility
    pub permission: Vec<serde_json::Value>,
}

impl ModelEntry {
    /// Listing entry for a concrete model.
    pub fn model(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object: "model".to_string(),
            owned_by: "modelgate".to_string(),
            permission: Vec::new(),
        }
    }

    /// Synthetic listing entry for a route, so clients can select it.
    pub fn route(name: &str) -> Self {
        Self {
            id: format!("route:{name}"),
            object: "model".to_string(),
            owned_by: "modelgate-route".to_string(),
            permission: Vec::new(),
        }
    }
}

/// `/v1/models` response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    /// Always `list`
    pub object: String,
    /// Listed models and routes
    pub data: Vec<ModelEntry>,
}

impl ModelList {
    /// Wrap entries in the list envelope.
    pub fn new(data: Vec<ModelEntry>) -> Self {
        Self {
            object: "list".to_string(),
            data,
        }
    }
}
