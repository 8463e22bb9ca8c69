//! Error handling for the gateway
//!
//! Every backend-specific failure is folded into [`GatewayError`] and carries
//! a [`NormalizedCode`] so the fallback logic can match on a closed set of
//! causes instead of provider-specific strings.

use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::Attempt;

/// Result type alias for the gateway
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Closed set of error causes used for fallback matching.
///
/// Adapters map their backend's failures into one of these; anything without
/// an explicit mapping is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizedCode {
    /// The backend could not be reached at all (connect/DNS failure)
    Unreachable,
    /// The backend did not answer within the configured timeout
    Timeout,
    /// The backend ran out of memory while serving the request
    Oom,
    /// The request exceeded the model's context window
    ContextLength,
    /// Everything else
    Other,
}

impl std::fmt::Display for NormalizedCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unreachable => "unreachable",
            Self::Timeout => "timeout",
            Self::Oom => "oom",
            Self::ContextLength => "context_length",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested model is not present in the registry
    #[error("Model {0} not found")]
    ModelNotFound(String),

    /// No provider owns the resolved model
    #[error("No provider for model {0}")]
    NoProviderForModel(String),

    /// The provider could not be reached
    #[error("Provider {provider} unreachable: {detail}")]
    ProviderUnreachable { provider: String, detail: String },

    /// The provider did not answer in time
    #[error("Provider {0} timed out")]
    ProviderTimeout(String),

    /// The provider ran out of memory
    #[error("Provider {0} out of memory")]
    ProviderOom(String),

    /// The request exceeded the model's context window
    #[error("Provider {0} exceeded context length")]
    ContextLength(String),

    /// Any other backend failure
    #[error("Provider {provider} error: {detail}")]
    Provider { provider: String, detail: String },

    /// Bad request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Every candidate in the fallback chain failed
    #[error("Request failed after {} attempt(s)", .0.len())]
    Exhausted(Vec<Attempt>),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// The normalized cause of this error, `Other` when no mapping applies.
    pub fn normalized(&self) -> NormalizedCode {
        match self {
            Self::ProviderUnreachable { .. } => NormalizedCode::Unreachable,
            Self::ProviderTimeout(_) => NormalizedCode::Timeout,
            Self::ProviderOom(_) => NormalizedCode::Oom,
            Self::ContextLength(_) => NormalizedCode::ContextLength,
            _ => NormalizedCode::Other,
        }
    }
}

impl ResponseError for GatewayError {
    fn error_response(&self) -> HttpResponse {
        match self {
            Self::Exhausted(attempts) => HttpResponse::InternalServerError().json(
                serde_json::json!({
                    "error": {
                        "message": self.to_string(),
                        "type": "all_attempts_failed",
                        "attempts": attempts,
                    }
                }),
            ),
            Self::InvalidRequest(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": { "message": msg, "type": "invalid_request_error" }
            })),
            Self::ModelNotFound(model) | Self::NoProviderForModel(model) => {
                HttpResponse::NotFound().json(serde_json::json!({
                    "error": {
                        "message": format!("model {model} not found"),
                        "type": "model_not_found",
                    }
                }))
            }
            _ => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": { "message": self.to_string(), "type": "internal_error" }
            })),
        }
    }
}
