//! Standard concurrency rules

use std::sync::Arc;

use tracing::debug;

use super::{ActiveJob, ConcurrencyRule};
use crate::config::{ConfigStore, ModelResourceConfig};
use crate::core::types::Job;

/// An exclusive model runs alone: it is not admitted while anything else is
/// active, and nothing is admitted while it runs.
pub struct ExclusiveModelRule {
    config: Arc<ConfigStore>,
}

impl ExclusiveModelRule {
    /// Rule over the shared config store.
    pub fn new(config: Arc<ConfigStore>) -> Self {
        Self { config }
    }

    fn is_exclusive(&self, model_id: &str) -> bool {
        self.config
            .models()
            .get(model_id)
            .map(|m| m.resources.exclusive)
            .unwrap_or(false)
    }
}

impl ConcurrencyRule for ExclusiveModelRule {
    fn name(&self) -> &str {
        "ExclusiveModelRule"
    }

    fn can_run(&self, candidate: &Job, active: &[ActiveJob]) -> bool {
        if self.is_exclusive(&candidate.resolved_model) && !active.is_empty() {
            return false;
        }
        !active.iter().any(|job| self.is_exclusive(&job.model))
    }
}

/// Caps the summed declared CPU and GPU usage of active jobs at 100 per axis.
pub struct ResourceLimitRule {
    config: Arc<ConfigStore>,
}

impl ResourceLimitRule {
    /// Rule over the shared config store.
    pub fn new(config: Arc<ConfigStore>) -> Self {
        Self { config }
    }

    fn resources(&self, model_id: &str) -> ModelResourceConfig {
        self.config
            .models()
            .get(model_id)
            .map(|m| m.resources.clone())
            .unwrap_or_default()
    }
}

impl ConcurrencyRule for ResourceLimitRule {
    fn name(&self) -> &str {
        "ResourceLimitRule"
    }

    fn can_run(&self, candidate: &Job, active: &[ActiveJob]) -> bool {
        let wanted = self.resources(&candidate.resolved_model);

        let mut total_cpu = 0.0;
        let mut total_gpu = 0.0;
        for job in active {
            let used = self.resources(&job.model);
            total_cpu += used.cpu_usage;
            total_gpu += used.gpu_usage;
        }

        if total_cpu + wanted.cpu_usage > 100.0 {
            debug!(
                model = %candidate.resolved_model,
                total_cpu,
                candidate_cpu = wanted.cpu_usage,
                "cpu limit would be exceeded"
            );
            return false;
        }
        if total_gpu + wanted.gpu_usage > 100.0 {
            debug!(
                model = %candidate.resolved_model,
                total_gpu,
                candidate_gpu = wanted.gpu_usage,
                "gpu limit would be exceeded"
            );
            return false;
        }
        true
    }
}

/// Hard cap on total concurrent jobs.
pub struct MaxConcurrencyRule {
    max_concurrent: usize,
    name: String,
}

impl MaxConcurrencyRule {
    /// Cap at `max_concurrent` active jobs.
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent,
            name: format!("MaxConcurrencyRule({max_concurrent})"),
        }
    }
}

impl ConcurrencyRule for MaxConcurrencyRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_run(&self, _candidate: &Job, active: &[ActiveJob]) -> bool {
        active.len() < self.max_concurrent
    }
}
