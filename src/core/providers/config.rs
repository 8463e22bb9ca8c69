//! Provider record schema (`providers/*.yaml`)
//!
//! One file per provider. Parse failures skip that provider only; they never
//! take down the gateway.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Health probe settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSpec {
    /// Path probed with GET
    pub path: String,
    /// Short probe timeout
    #[serde(default = "default_health_timeout")]
    pub timeout_seconds: u64,
    /// Status codes that count as healthy
    #[serde(default = "default_success_codes")]
    pub success_codes: Vec<u16>,
}

fn default_health_timeout() -> u64 {
    2
}

fn default_success_codes() -> Vec<u16> {
    vec![200]
}

/// Model enumeration settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsSpec {
    /// Listing path queried with GET
    pub path: Option<String>,
    /// When present, returned directly without network I/O
    pub declared_models: Option<Vec<String>>,
}

/// HTTP surface of the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSpec {
    /// Base URL of the backend
    pub base_url: String,
    /// Health probe settings
    pub health: HealthSpec,
    /// Model enumeration settings
    #[serde(default)]
    pub models: ModelsSpec,
    /// Environment variable holding a bearer token to forward, if any
    #[serde(default)]
    pub auth_env: Option<String>,
}

/// Managed-process launch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSpec {
    /// Executable to launch
    pub command: String,
    /// Arguments
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory
    #[serde(default)]
    pub cwd: Option<String>,
    /// Environment overlay on top of the parent environment
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Whether the gateway manages this process at all
    #[serde(default)]
    pub enabled: bool,
    /// Seconds to wait after a start before re-probing health
    #[serde(default = "default_startup_grace")]
    pub startup_grace_seconds: u64,
}

fn default_startup_grace() -> u64 {
    5
}

/// How a managed provider is stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopMethod {
    /// Ask the supervisor for graceful termination
    TerminateProcess,
    /// Leave the process alone
    #[default]
    None,
}

/// Stop settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StopSpec {
    /// Termination method
    pub method: StopMethod,
}

/// Lifecycle policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySpec {
    /// Keep a managed provider running after discovery
    pub keep_warm: bool,
}

/// Pre-start detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectSpec {
    /// `none`, or a method containing `path` to require a binary on PATH
    pub method: String,
    /// Binary to look up when the method involves the PATH
    pub binary_name: Option<String>,
}

impl Default for DetectSpec {
    fn default() -> Self {
        Self {
            method: "none".to_string(),
            binary_name: None,
        }
    }
}

/// One provider record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSpec {
    /// Unique provider id within a registry snapshot
    pub provider_id: String,
    /// Adapter variant to construct (`openai_compat`, `ollama`, ...)
    pub provider_type: String,
    /// HTTP surface
    pub api: ApiSpec,
    /// Managed-process launch settings
    #[serde(default)]
    pub start: Option<StartSpec>,
    /// Stop settings
    #[serde(default)]
    pub stop: StopSpec,
    /// Lifecycle policy
    #[serde(default)]
    pub policy: PolicySpec,
    /// Pre-start detection
    #[serde(default)]
    pub detect: DetectSpec,
    /// Resource group label
    #[serde(default = "default_resource_group")]
    pub resource_group: String,
}

fn default_resource_group() -> String {
    "local_gpu".to_string()
}

impl ProviderSpec {
    /// Whether the gateway owns this backend's process lifecycle.
    pub fn is_managed(&self) -> bool {
        self.start.as_ref().map(|s| s.enabled).unwrap_or(false)
    }
}
