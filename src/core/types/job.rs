//! Jobs: the unit of scheduling
//!
//! A job is one chat-completion attempt against one resolved model. Fallback
//! never retries a job in place; the controller creates a fresh job per
//! candidate.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::core::types::chat::{ChatCompletionRequest, ChatCompletionResponse};
use crate::utils::error::NormalizedCode;

/// Job lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Enqueued, not yet admitted
    Pending,
    /// Admitted; a backend call is in flight
    Running,
    /// Finished with a response
    Completed,
    /// Finished with an error
    Error,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// A single chat-completion attempt against a single resolved model
#[derive(Debug)]
pub struct Job {
    /// Random identity, fixed at creation
    pub id: Uuid,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Model string the client sent (may be a `route:` name)
    pub original_model: String,
    /// Concrete model this job targets
    pub resolved_model: String,
    /// Owning provider, filled in at dispatch
    pub provider_id: Option<String>,
    /// Route the request came through, if any
    pub route: Option<String>,
    /// Request with `model` rewritten to the resolved id
    pub request: ChatCompletionRequest,
    /// Lifecycle state
    pub status: JobStatus,
}

impl Job {
    /// New pending job for a resolved candidate.
    pub fn new(
        original_model: impl Into<String>,
        resolved_model: impl Into<String>,
        route: Option<String>,
        request: ChatCompletionRequest,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            original_model: original_model.into(),
            resolved_model: resolved_model.into(),
            provider_id: None,
            route,
            request,
            status: JobStatus::Pending,
        }
    }

    /// Seconds this job has been waiting since creation.
    pub fn age_seconds(&self, now: DateTime<Utc>) -> f64 {
        (now - self.created_at).num_milliseconds() as f64 / 1000.0
    }
}

/// Terminal result delivered to the controller through the job's one-shot
/// completion channel.
#[derive(Debug)]
pub enum JobOutcome {
    /// The backend produced a response
    Completed(Box<ChatCompletionResponse>),
    /// The attempt failed
    Error {
        /// Human-readable failure description
        message: String,
        /// Normalized cause for fallback matching
        normalized: NormalizedCode,
    },
}

/// Record of one failed candidate in a fallback chain
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    /// Candidate model id
    pub model: String,
    /// What went wrong
    pub error: String,
    /// Normalized cause
    pub normalized: NormalizedCode,
}
