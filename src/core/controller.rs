//! Request controller
//!
//! Walks a resolved candidate chain for one client request: enqueue a job
//! for the candidate, await its terminal outcome, and decide from the
//! normalized error code whether the chain continues. Fallback creates a new
//! job per candidate; a job is never retried in place.

use std::sync::Arc;

use tracing::{info, warn};

use super::registry::Registry;
use super::routing::RouteResolver;
use super::scheduler::Scheduler;
use super::types::{Attempt, ChatCompletionRequest, ChatCompletionResponse, Job, JobOutcome};
use crate::config::ConfigStore;
use crate::utils::error::{GatewayError, NormalizedCode, Result};

/// Drives one request through resolution, scheduling, and fallback
pub struct RequestController {
    config: Arc<ConfigStore>,
    registry: Arc<Registry>,
    resolver: RouteResolver,
    scheduler: Arc<Scheduler>,
}

impl RequestController {
    /// Controller over the shared components.
    pub fn new(
        config: Arc<ConfigStore>,
        registry: Arc<Registry>,
        scheduler: Arc<Scheduler>,
    ) -> Self {
        let resolver = RouteResolver::new(Arc::clone(&config));
        Self {
            config,
            registry,
            resolver,
            scheduler,
        }
    }

    /// Handle one chat-completion request to a terminal answer.
    pub async fn handle_chat(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let resolution = self.resolver.resolve(&request.model);

        let mut candidates = Vec::with_capacity(1 + resolution.fallbacks.len());
        candidates.push(resolution.primary.clone());
        candidates.extend(resolution.fallbacks.iter().cloned());

        let runtime = self.config.app().runtime.clone();
        let fallback_enabled = self.config.app().routing.enable_fallback;
        let mut attempts: Vec<Attempt> = Vec::new();

        for (index, model_id) in candidates.iter().enumerate() {
            if !self.registry.has_model(model_id) && runtime.auto_refresh_on_miss {
                if self
                    .registry
                    .cooldown_elapsed(runtime.refresh_cooldown_seconds)
                {
                    info!(model = %model_id, "model missing, refreshing registry");
                    self.registry.refresh().await;
                }
            }
            if !self.registry.has_model(model_id) {
                attempts.push(Attempt {
                    model: model_id.clone(),
                    error: format!("model {model_id} not found"),
                    normalized: NormalizedCode::Other,
                });
                continue;
            }

            // Adapters must see the concrete id; the original request stays
            // untouched for logging.
            let job = Job::new(
                request.model.clone(),
                model_id.clone(),
                resolution.route.clone(),
                request.with_model(model_id.clone()),
            );

            let outcome = self.scheduler.enqueue(job).await;
            match outcome.await {
                Ok(JobOutcome::Completed(response)) => return Ok(*response),
                Ok(JobOutcome::Error {
                    message,
                    normalized,
                }) => {
                    attempts.push(Attempt {
                        model: model_id.clone(),
                        error: message,
                        normalized,
                    });

                    let has_next = index + 1 < candidates.len();
                    if has_next
                        && fallback_enabled
                        && resolution.triggers.contains(&normalized)
                    {
                        warn!(
                            model = %model_id,
                            code = %normalized,
                            "fallback triggered, trying next candidate"
                        );
                        continue;
                    }
                    break;
                }
                Err(_) => {
                    attempts.push(Attempt {
                        model: model_id.clone(),
                        error: "scheduler dropped the job".to_string(),
                        normalized: NormalizedCode::Other,
                    });
                    break;
                }
            }
        }

        Err(GatewayError::Exhausted(attempts))
    }
}
