//! Core data types shared across the gateway

pub mod chat;
pub mod job;

pub use chat::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Choice, ModelEntry, ModelList,
    StopSequence, Usage,
};
pub use job::{Attempt, Job, JobOutcome, JobStatus};
