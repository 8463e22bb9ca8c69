//! Configuration model types
//!
//! Three YAML files drive the gateway: the main config, the routes file, and
//! the per-model scoring file. Provider records live in their own directory
//! and are modeled in `core::providers::config`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::utils::error::NormalizedCode;

/// Bind address for the HTTP server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Runtime behavior knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Refresh the registry when a candidate model is missing from the map
    pub auto_refresh_on_miss: bool,
    /// Minimum seconds between registry refreshes
    pub refresh_cooldown_seconds: u64,
    /// Default chat-completion timeout in seconds
    pub request_timeout_seconds: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            auto_refresh_on_miss: true,
            refresh_cooldown_seconds: 30,
            request_timeout_seconds: 600,
        }
    }
}

/// Fallback routing behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Global switch for walking fallback chains
    pub enable_fallback: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            enable_fallback: true,
        }
    }
}

/// Strategy for ordering non-active candidates in a scheduling pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickNextStrategy {
    /// Score by `base_priority - load_penalty + age * aging_bonus_per_second`
    ScoreThenAge,
    /// Plain base priority
    Priority,
}

/// Scheduler knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// How to break ties among models whose provider is not already active
    pub pick_next_strategy: PickNextStrategy,
    /// Score bonus per second a queue head has been waiting
    pub aging_bonus_per_second: f64,
    /// Score record used for models absent from the models file
    pub default_model_score: ModelScoreConfig,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            pick_next_strategy: PickNextStrategy::ScoreThenAge,
            aging_bonus_per_second: 0.01,
            default_model_score: ModelScoreConfig::default(),
        }
    }
}

/// Request log sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// In-memory ring size for recent request records
    pub keep_last_n_requests_in_memory: usize,
    /// Directory for the append-only JSONL sink
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            keep_last_n_requests_in_memory: 500,
            log_dir: "logs".to_string(),
        }
    }
}

/// Where provider records live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Directory of one-YAML-per-provider records
    pub config_dir: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            config_dir: "providers".to_string(),
        }
    }
}

/// Top-level gateway configuration (`config.yaml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP bind settings
    pub server: ServerConfig,
    /// Runtime behavior
    pub runtime: RuntimeConfig,
    /// Fallback routing
    pub routing: RoutingConfig,
    /// Scheduler knobs
    pub scheduling: SchedulingConfig,
    /// Request log sizing
    pub logging: LoggingConfig,
    /// Provider record location
    pub providers: ProvidersConfig,
}

/// Declared resource footprint of a model while it is serving a request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelResourceConfig {
    /// CPU share, 0-100
    pub cpu_usage: f64,
    /// GPU share, 0-100
    pub gpu_usage: f64,
    /// VRAM share, 0-100
    pub vram_usage: f64,
    /// When true the model runs alone
    pub exclusive: bool,
}

/// Per-model scoring and admission inputs (`models.yaml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelScoreConfig {
    /// Base scheduling priority
    pub base_priority: i64,
    /// Penalty applied while scoring
    pub load_penalty: i64,
    /// Penalty reserved for runtime-cost weighting
    pub runtime_penalty: i64,
    /// Push this model behind everything else
    pub always_run_last: bool,
    /// Resource footprint consulted by the admission rules
    pub resources: ModelResourceConfig,
}

/// A logical route: primary model plus fallback chain (`routes.yaml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Model tried first
    pub primary_model: String,
    /// Ordered fallback candidates
    #[serde(default)]
    pub fallback_models: Vec<String>,
    /// Normalized error codes on which fallback is permitted
    #[serde(default)]
    pub fallback_on: Vec<NormalizedCode>,
}

/// Wrapper matching the `routes:` top-level key of the routes file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutesFile {
    /// Route definitions by name
    #[serde(default)]
    pub routes: HashMap<String, RouteConfig>,
}

/// Wrapper matching the `models:` top-level key of the models file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelsFile {
    /// Score records by model id
    #[serde(default)]
    pub models: HashMap<String, ModelScoreConfig>,
}
