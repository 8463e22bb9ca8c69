//! End-to-end scheduling and fallback scenarios over mock backends

use std::collections::HashMap;
use std::time::Duration;

use modelgate::config::{ModelScoreConfig, RouteConfig};
use modelgate::core::types::{Job, JobOutcome, JobStatus};
use modelgate::{GatewayError, NormalizedCode};

use crate::common::{
    build_state, chat_request, test_app_config, write_openai_provider, MockBackend,
};

fn route(
    primary: &str,
    fallbacks: &[&str],
    triggers: &[NormalizedCode],
) -> HashMap<String, RouteConfig> {
    let mut routes = HashMap::new();
    routes.insert(
        "r1".to_string(),
        RouteConfig {
            primary_model: primary.to_string(),
            fallback_models: fallbacks.iter().map(|m| m.to_string()).collect(),
            fallback_on: triggers.to_vec(),
        },
    );
    routes
}

fn gpu_model(gpu: f64, exclusive: bool) -> ModelScoreConfig {
    let mut score = ModelScoreConfig::default();
    score.resources.gpu_usage = gpu;
    score.resources.exclusive = exclusive;
    score
}

#[tokio::test]
async fn happy_path_forwards_the_backend_envelope() {
    let backend = MockBackend::healthy().await;
    backend.chat_ok("m1", "hello from pA").await;

    let dir = tempfile::tempdir().unwrap();
    write_openai_provider(dir.path(), "pa.yaml", "pA", &backend.uri(), &["m1"]);

    let state = build_state(test_app_config(dir.path()), HashMap::new(), HashMap::new());
    state.registry.refresh().await;

    let response = state
        .controller
        .handle_chat(chat_request("m1", "hi"))
        .await
        .unwrap();
    assert_eq!(response.model, "m1");
    assert_eq!(response.id, "chatcmpl-test");
    assert_eq!(response.choices[0].message.content, "hello from pA");

    let records = state.request_log.recent(10);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, JobStatus::Completed);
    assert_eq!(records[0].model, "m1");
    assert_eq!(records[0].provider.as_deref(), Some("pA"));
}

#[tokio::test]
async fn route_falls_back_on_timeout() {
    let slow = MockBackend::healthy().await;
    // Longer than the 1 s chat timeout configured by the harness.
    slow.chat_ok_delayed("m1", "too late", Duration::from_secs(3))
        .await;
    let fast = MockBackend::healthy().await;
    fast.chat_ok("m2", "hello from pB").await;

    let dir = tempfile::tempdir().unwrap();
    write_openai_provider(dir.path(), "pa.yaml", "pA", &slow.uri(), &["m1"]);
    write_openai_provider(dir.path(), "pb.yaml", "pB", &fast.uri(), &["m2"]);

    let state = build_state(
        test_app_config(dir.path()),
        route("m1", &["m2"], &[NormalizedCode::Timeout]),
        HashMap::new(),
    );
    state.registry.refresh().await;

    let response = state
        .controller
        .handle_chat(chat_request("route:r1", "hi"))
        .await
        .unwrap();
    assert_eq!(response.model, "m2");
    assert_eq!(response.choices[0].message.content, "hello from pB");

    let records = state.request_log.recent(10);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].status, JobStatus::Error);
    assert_eq!(records[0].model, "m1");
    assert_eq!(records[0].normalized, Some(NormalizedCode::Timeout));
    assert_eq!(records[1].status, JobStatus::Completed);
    assert_eq!(records[1].model, "m2");
}

#[tokio::test]
async fn fallback_suppressed_when_code_not_in_trigger_set() {
    let failing = MockBackend::healthy().await;
    failing.chat_error(500, "CUDA out of memory").await;
    let spare = MockBackend::healthy().await;
    spare.chat_ok("m2", "never used").await;

    let dir = tempfile::tempdir().unwrap();
    write_openai_provider(dir.path(), "pa.yaml", "pA", &failing.uri(), &["m1"]);
    write_openai_provider(dir.path(), "pb.yaml", "pB", &spare.uri(), &["m2"]);

    let state = build_state(
        test_app_config(dir.path()),
        route("m1", &["m2"], &[NormalizedCode::Unreachable]),
        HashMap::new(),
    );
    state.registry.refresh().await;

    let err = state
        .controller
        .handle_chat(chat_request("route:r1", "hi"))
        .await
        .unwrap_err();
    match err {
        GatewayError::Exhausted(attempts) => {
            assert_eq!(attempts.len(), 1);
            assert_eq!(attempts[0].model, "m1");
            assert_eq!(attempts[0].normalized, NormalizedCode::Oom);
        }
        other => panic!("unexpected error: {other}"),
    }
    // The chain stopped before m2: its backend saw no completion call.
    assert_eq!(spare.chat_request_count().await, 0);
}

#[tokio::test]
async fn empty_trigger_set_never_retries() {
    let failing = MockBackend::healthy().await;
    failing.chat_error(500, "some failure").await;
    let spare = MockBackend::healthy().await;
    spare.chat_ok("m2", "never used").await;

    let dir = tempfile::tempdir().unwrap();
    write_openai_provider(dir.path(), "pa.yaml", "pA", &failing.uri(), &["m1"]);
    write_openai_provider(dir.path(), "pb.yaml", "pB", &spare.uri(), &["m2"]);

    let state = build_state(
        test_app_config(dir.path()),
        route("m1", &["m2"], &[]),
        HashMap::new(),
    );
    state.registry.refresh().await;

    let err = state
        .controller
        .handle_chat(chat_request("route:r1", "hi"))
        .await
        .unwrap_err();
    match err {
        GatewayError::Exhausted(attempts) => assert_eq!(attempts.len(), 1),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(spare.chat_request_count().await, 0);
}

#[tokio::test]
async fn exclusive_model_waits_for_an_empty_system() {
    let backend = MockBackend::healthy().await;
    backend
        .chat_ok_delayed("served", "done", Duration::from_millis(500))
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_openai_provider(dir.path(), "pa.yaml", "pA", &backend.uri(), &["mY", "mX"]);

    let mut models = HashMap::new();
    models.insert("mX".to_string(), gpu_model(0.0, true));

    let state = build_state(test_app_config(dir.path()), HashMap::new(), models);
    state.registry.refresh().await;

    let first = state
        .scheduler
        .enqueue(Job::new("mY", "mY", None, chat_request("mY", "first")))
        .await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    let second = state
        .scheduler
        .enqueue(Job::new("mX", "mX", None, chat_request("mX", "second")))
        .await;

    // While mY is in flight the exclusive mX must not be admitted, even
    // though its queue head is ready.
    tokio::time::sleep(Duration::from_millis(150)).await;
    let active = state.scheduler.active_snapshot().await;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].model, "mY");
    assert_eq!(active[0].provider_id.as_deref(), Some("pA"));

    assert!(matches!(first.await.unwrap(), JobOutcome::Completed(_)));
    assert!(matches!(second.await.unwrap(), JobOutcome::Completed(_)));

    let records = state.request_log.recent(10);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].model, "mY");
    assert_eq!(records[1].model, "mX");
}

#[tokio::test]
async fn gpu_budget_admits_one_of_two_heavy_models() {
    let backend = MockBackend::healthy().await;
    backend
        .chat_ok_delayed("served", "done", Duration::from_millis(500))
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_openai_provider(dir.path(), "pa.yaml", "pA", &backend.uri(), &["m1", "m2"]);

    let mut models = HashMap::new();
    models.insert("m1".to_string(), gpu_model(60.0, false));
    models.insert("m2".to_string(), gpu_model(60.0, false));

    let state = build_state(test_app_config(dir.path()), HashMap::new(), models);
    state.registry.refresh().await;

    let first = state
        .scheduler
        .enqueue(Job::new("m1", "m1", None, chat_request("m1", "first")))
        .await;
    let second = state
        .scheduler
        .enqueue(Job::new("m2", "m2", None, chat_request("m2", "second")))
        .await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    // 60 + 60 exceeds the 100-point GPU budget: only one may run.
    assert_eq!(state.scheduler.active_snapshot().await.len(), 1);

    assert!(matches!(first.await.unwrap(), JobOutcome::Completed(_)));
    assert!(matches!(second.await.unwrap(), JobOutcome::Completed(_)));
    assert_eq!(state.request_log.recent(10).len(), 2);
}

#[tokio::test]
async fn queue_dispatch_is_fifo_within_one_model() {
    let backend = MockBackend::healthy().await;
    backend
        .chat_ok_delayed("m1", "done", Duration::from_millis(100))
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_openai_provider(dir.path(), "pa.yaml", "pA", &backend.uri(), &["m1"]);

    // Serialize m1 with itself so dispatch order is observable at the
    // backend.
    let mut models = HashMap::new();
    models.insert("m1".to_string(), gpu_model(60.0, false));

    let state = build_state(test_app_config(dir.path()), HashMap::new(), models);
    state.registry.refresh().await;

    let mut outcomes = Vec::new();
    for i in 0..3 {
        outcomes.push(
            state
                .scheduler
                .enqueue(Job::new(
                    "m1",
                    "m1",
                    None,
                    chat_request("m1", &format!("msg-{i}")),
                ))
                .await,
        );
    }
    for outcome in outcomes {
        assert!(matches!(outcome.await.unwrap(), JobOutcome::Completed(_)));
    }

    assert_eq!(
        backend.chat_request_contents().await,
        vec!["msg-0", "msg-1", "msg-2"]
    );
}

#[tokio::test]
async fn auto_refresh_discovers_a_new_provider_on_miss() {
    let backend = MockBackend::healthy().await;
    backend.chat_ok("mNew", "found you").await;

    let dir = tempfile::tempdir().unwrap();
    let state = build_state(test_app_config(dir.path()), HashMap::new(), HashMap::new());
    state.registry.refresh().await;
    assert!(state.registry.model_ids().is_empty());

    // The record appears after startup; the miss triggers the refresh.
    write_openai_provider(dir.path(), "pa.yaml", "pA", &backend.uri(), &["mNew"]);

    let response = state
        .controller
        .handle_chat(chat_request("mNew", "hi"))
        .await
        .unwrap();
    assert_eq!(response.choices[0].message.content, "found you");

    let records = state.request_log.recent(10);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].provider.as_deref(), Some("pA"));
}

#[tokio::test]
async fn dead_backend_normalizes_to_unreachable_and_falls_back() {
    // Healthy during discovery, gone before the completion call: the
    // connection failure must normalize to `unreachable` and walk the chain.
    let dying = MockBackend::healthy().await;
    let alive = MockBackend::healthy().await;
    alive.chat_ok("m2", "alive").await;

    let dir = tempfile::tempdir().unwrap();
    write_openai_provider(dir.path(), "pa.yaml", "pA", &dying.uri(), &["m1"]);
    write_openai_provider(dir.path(), "pb.yaml", "pB", &alive.uri(), &["m2"]);

    let state = build_state(
        test_app_config(dir.path()),
        route("m1", &["m2"], &[NormalizedCode::Unreachable]),
        HashMap::new(),
    );
    state.registry.refresh().await;
    assert!(state.registry.model_ids().contains(&"m1".to_string()));
    drop(dying);

    let response = state
        .controller
        .handle_chat(chat_request("route:r1", "hi"))
        .await
        .unwrap();
    assert_eq!(response.choices[0].message.content, "alive");

    let records = state.request_log.recent(10);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].normalized, Some(NormalizedCode::Unreachable));
}
