//! Concurrency rules
//!
//! A rule is a pure predicate over a candidate job and the set of jobs
//! already running. The rule set is an AND-conjunction: every rule must
//! admit, evaluation short-circuits on the first denial, and ordering is
//! irrelevant to the outcome.

pub mod builtins;

use tracing::debug;

use crate::core::types::Job;

pub use builtins::{ExclusiveModelRule, MaxConcurrencyRule, ResourceLimitRule};

/// What the rules see of a running job
#[derive(Debug, Clone)]
pub struct ActiveJob {
    /// Job id, for logging
    pub job_id: uuid::Uuid,
    /// Resolved model the job is executing against
    pub model: String,
    /// Provider serving the job, filled in once the execution task has
    /// resolved it
    pub provider_id: Option<String>,
}

/// One admission predicate
pub trait ConcurrencyRule: Send + Sync {
    /// Name used in deny logs.
    fn name(&self) -> &str;

    /// Whether `candidate` may run alongside `active`.
    fn can_run(&self, candidate: &Job, active: &[ActiveJob]) -> bool;
}

/// Ordered rule collection evaluated as a conjunction
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn ConcurrencyRule>>,
}

impl RuleSet {
    /// Empty rule set (admits everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule.
    pub fn add_rule(&mut self, rule: Box<dyn ConcurrencyRule>) {
        debug!(rule = rule.name(), "registered concurrency rule");
        self.rules.push(rule);
    }

    /// True iff every rule admits the candidate.
    pub fn can_run(&self, candidate: &Job, active: &[ActiveJob]) -> bool {
        for rule in &self.rules {
            if !rule.can_run(candidate, active) {
                debug!(
                    job = %candidate.id,
                    model = %candidate.resolved_model,
                    rule = rule.name(),
                    "job blocked by rule"
                );
                return false;
            }
        }
        true
    }
}
