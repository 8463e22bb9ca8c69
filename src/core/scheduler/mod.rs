//! Scheduler
//!
//! Per-model FIFO queues drained by a single dispatch task. The dispatch
//! task serializes every admission decision, so the concurrency rules always
//! evaluate against a coherent snapshot of the active set. Admitted jobs run
//! as their own tasks; completion wakes the dispatch task through the
//! `job_complete` signal.

pub mod scoring;

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{oneshot, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::concurrency::{
    ActiveJob, ExclusiveModelRule, MaxConcurrencyRule, ResourceLimitRule, RuleSet,
};
use super::registry::Registry;
use super::request_log::{RequestLog, RequestRecord};
use super::types::{Job, JobOutcome, JobStatus};
use crate::config::ConfigStore;
use crate::utils::error::NormalizedCode;

/// Default cap applied by the standard rule suite
const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Seconds granted to a freshly started provider before the first call
const WARMUP_SECONDS: u64 = 1;

/// The standard rule suite: exclusive models, resource limits, and a global
/// concurrency cap.
pub fn standard_rules(config: Arc<ConfigStore>) -> RuleSet {
    let mut rules = RuleSet::new();
    rules.add_rule(Box::new(ExclusiveModelRule::new(Arc::clone(&config))));
    rules.add_rule(Box::new(ResourceLimitRule::new(config)));
    rules.add_rule(Box::new(MaxConcurrencyRule::new(DEFAULT_MAX_CONCURRENCY)));
    rules
}

struct QueuedJob {
    job: Job,
    done: oneshot::Sender<JobOutcome>,
}

#[derive(Default)]
struct State {
    queues: HashMap<String, VecDeque<QueuedJob>>,
    active: Vec<ActiveJob>,
}

struct Shared {
    state: Mutex<State>,
    new_job: Notify,
    job_complete: Notify,
    shutdown: AtomicBool,
    config: Arc<ConfigStore>,
    registry: Arc<Registry>,
    rules: RuleSet,
    request_log: Arc<RequestLog>,
}

/// Per-model queues plus the dispatch loop that drains them
pub struct Scheduler {
    shared: Arc<Shared>,
    dispatch_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Scheduler with the standard rule suite.
    pub fn new(
        config: Arc<ConfigStore>,
        registry: Arc<Registry>,
        request_log: Arc<RequestLog>,
    ) -> Self {
        let rules = standard_rules(Arc::clone(&config));
        Self::with_rules(config, registry, request_log, rules)
    }

    /// Scheduler with a caller-supplied rule set.
    pub fn with_rules(
        config: Arc<ConfigStore>,
        registry: Arc<Registry>,
        request_log: Arc<RequestLog>,
        rules: RuleSet,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
                new_job: Notify::new(),
                job_complete: Notify::new(),
                shutdown: AtomicBool::new(false),
                config,
                registry,
                rules,
                request_log,
            }),
            dispatch_task: parking_lot::Mutex::new(None),
        }
    }

    /// Append a job to its model's queue and hand back the one-shot handle
    /// the caller awaits for the terminal outcome.
    pub async fn enqueue(&self, job: Job) -> oneshot::Receiver<JobOutcome> {
        let (done, outcome) = oneshot::channel();
        let model = job.resolved_model.clone();
        let job_id = job.id;

        {
            let mut state = self.shared.state.lock().await;
            state
                .queues
                .entry(model.clone())
                .or_default()
                .push_back(QueuedJob { job, done });
        }
        info!(job = %job_id, model = %model, "job enqueued");

        self.ensure_dispatch_task();
        self.shared.new_job.notify_one();
        outcome
    }

    /// Snapshot of the jobs currently executing.
    pub async fn active_snapshot(&self) -> Vec<ActiveJob> {
        self.shared.state.lock().await.active.clone()
    }

    /// Stop the dispatch loop after its current pass. In-flight execution
    /// tasks run to completion.
    pub fn shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        self.shared.new_job.notify_one();
        self.shared.job_complete.notify_one();
    }

    fn ensure_dispatch_task(&self) {
        let mut task = self.dispatch_task.lock();
        let running = task.as_ref().map(|t| !t.is_finished()).unwrap_or(false);
        if !running {
            let shared = Arc::clone(&self.shared);
            *task = Some(tokio::spawn(dispatch_loop(shared)));
        }
    }
}

async fn dispatch_loop(shared: Arc<Shared>) {
    info!("scheduler dispatch loop started");
    while !shared.shutdown.load(Ordering::SeqCst) {
        let (started, active_empty) = schedule_pass(&shared).await;

        if started > 0 {
            continue;
        }
        if active_empty {
            // Nothing running and nothing admitted: only new work matters.
            shared.new_job.notified().await;
        } else {
            // Blocked behind active jobs: a completion may unblock a head,
            // and new work may still be admissible.
            tokio::select! {
                _ = shared.new_job.notified() => {}
                _ = shared.job_complete.notified() => {}
            }
        }
    }
    info!("scheduler dispatch loop stopped");
}

/// One scheduling pass: admit every queue head the rules allow, sticky
/// providers first. Returns the admission count and whether the active set
/// ended the pass empty.
async fn schedule_pass(shared: &Arc<Shared>) -> (usize, bool) {
    let mut state = shared.state.lock().await;
    state.queues.retain(|_, queue| !queue.is_empty());

    if state.queues.is_empty() {
        return (0, state.active.is_empty());
    }

    let active_models: HashSet<String> =
        state.active.iter().map(|job| job.model.clone()).collect();
    let now = Utc::now();

    // Sticky preference first (providers already executing keep their
    // momentum), then descending score; model id keeps the order total.
    let mut candidates: Vec<(bool, f64, String)> = state
        .queues
        .iter()
        .map(|(model, queue)| {
            let head_age = queue
                .front()
                .map(|queued| queued.job.age_seconds(now))
                .unwrap_or(0.0);
            let score = scoring::candidate_score(&shared.config, model, head_age);
            (active_models.contains(model), score, model.clone())
        })
        .collect();
    candidates.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then(b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal))
            .then(a.2.cmp(&b.2))
    });

    let mut started = 0;
    for (_, _, model) in candidates {
        let admitted = {
            let Some(head) = state.queues.get(&model).and_then(|queue| queue.front()) else {
                continue;
            };
            shared.rules.can_run(&head.job, &state.active)
        };
        if !admitted {
            // Strict FIFO: a blocked head blocks its whole queue this pass.
            continue;
        }

        let Some(queued) = state
            .queues
            .get_mut(&model)
            .and_then(|queue| queue.pop_front())
        else {
            continue;
        };
        state.active.push(ActiveJob {
            job_id: queued.job.id,
            model: queued.job.resolved_model.clone(),
            provider_id: None,
        });
        tokio::spawn(execute_job(Arc::clone(shared), queued));
        started += 1;
    }

    (started, state.active.is_empty())
}

async fn execute_job(shared: Arc<Shared>, queued: QueuedJob) {
    let QueuedJob { mut job, done } = queued;
    job.status = JobStatus::Running;
    let started_at = Instant::now();

    let outcome = run_attempt(&shared, &mut job).await;
    job.status = match outcome {
        JobOutcome::Completed(_) => JobStatus::Completed,
        JobOutcome::Error { .. } => JobStatus::Error,
    };

    let runtime_ms = started_at.elapsed().as_millis() as u64;
    {
        let mut state = shared.state.lock().await;
        state.active.retain(|active| active.job_id != job.id);
    }

    let (error, normalized) = match &outcome {
        JobOutcome::Error {
            message,
            normalized,
        } => (Some(message.clone()), Some(*normalized)),
        JobOutcome::Completed(_) => (None, None),
    };
    shared.request_log.record(RequestRecord {
        timestamp: Utc::now(),
        job_id: job.id,
        model: job.resolved_model.clone(),
        provider: job.provider_id.clone(),
        status: job.status,
        runtime_ms,
        error,
        normalized,
    });

    shared.job_complete.notify_one();
    if done.send(outcome).is_err() {
        // Client went away; the job still completed and was logged.
        warn!(job = %job.id, "completion receiver dropped");
    }
}

async fn run_attempt(shared: &Arc<Shared>, job: &mut Job) -> JobOutcome {
    let Some(provider) = shared.registry.get_provider_for_model(&job.resolved_model) else {
        return JobOutcome::Error {
            message: format!("no provider for model {}", job.resolved_model),
            normalized: NormalizedCode::Other,
        };
    };
    job.provider_id = Some(provider.provider_id().to_string());
    {
        // Keep the active entry's provider in sync with the job so health
        // reports the id the job actually runs against, not whatever the
        // model map says after a later refresh.
        let mut state = shared.state.lock().await;
        if let Some(active) = state.active.iter_mut().find(|a| a.job_id == job.id) {
            active.provider_id = job.provider_id.clone();
        }
    }

    if !provider.health_check().await {
        info!(
            job = %job.id,
            provider = provider.provider_id(),
            "provider not healthy, starting it"
        );
        provider.start().await;
        tokio::time::sleep(std::time::Duration::from_secs(WARMUP_SECONDS)).await;
    }

    info!(
        job = %job.id,
        model = %job.resolved_model,
        provider = provider.provider_id(),
        "executing job"
    );
    match provider.chat_completion(&job.request).await {
        Ok(response) => JobOutcome::Completed(Box::new(response)),
        Err(e) => {
            error!(job = %job.id, error = %e, "job execution failed");
            JobOutcome::Error {
                message: e.to_string(),
                normalized: e.normalized(),
            }
        }
    }
}
