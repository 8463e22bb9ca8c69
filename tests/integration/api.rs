//! HTTP surface tests

use std::collections::HashMap;

use actix_web::{test, web, App};

use modelgate::config::RouteConfig;
use modelgate::server::routes;
use modelgate::NormalizedCode;

use crate::common::{build_state, chat_request, test_app_config, write_openai_provider, MockBackend};

fn fast_route() -> HashMap<String, RouteConfig> {
    let mut routes = HashMap::new();
    routes.insert(
        "fast".to_string(),
        RouteConfig {
            primary_model: "m1".to_string(),
            fallback_models: vec![],
            fallback_on: vec![NormalizedCode::Timeout],
        },
    );
    routes
}

#[actix_web::test]
async fn models_listing_includes_routes() {
    let backend = MockBackend::healthy().await;
    let dir = tempfile::tempdir().unwrap();
    write_openai_provider(dir.path(), "pa.yaml", "pA", &backend.uri(), &["m1"]);

    let state = build_state(test_app_config(dir.path()), fast_route(), HashMap::new());
    state.registry.refresh().await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/v1/models").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["object"], "list");
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"m1"));
    assert!(ids.contains(&"route:fast"));
}

#[actix_web::test]
async fn chat_endpoint_returns_envelope() {
    let backend = MockBackend::healthy().await;
    backend.chat_ok("m1", "over http").await;

    let dir = tempfile::tempdir().unwrap();
    write_openai_provider(dir.path(), "pa.yaml", "pA", &backend.uri(), &["m1"]);

    let state = build_state(test_app_config(dir.path()), HashMap::new(), HashMap::new());
    state.registry.refresh().await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/v1/chat/completions")
        .set_json(chat_request("m1", "hi"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["model"], "m1");
    assert_eq!(body["choices"][0]["message"]["content"], "over http");
}

#[actix_web::test]
async fn exhausted_chain_surfaces_attempts_in_500_body() {
    let dir = tempfile::tempdir().unwrap();
    let mut app_config = test_app_config(dir.path());
    app_config.runtime.auto_refresh_on_miss = false;

    let state = build_state(app_config, HashMap::new(), HashMap::new());

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/v1/chat/completions")
        .set_json(chat_request("ghost", "hi"))
        .to_request();
    let response = test::call_service(&app, req).await;
    assert_eq!(response.status(), 500);

    let body: serde_json::Value = test::read_body_json(response).await;
    let attempts = body["error"]["attempts"].as_array().unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0]["model"], "ghost");
}

#[actix_web::test]
async fn health_reports_registry_models() {
    let backend = MockBackend::healthy().await;
    let dir = tempfile::tempdir().unwrap();
    write_openai_provider(dir.path(), "pa.yaml", "pA", &backend.uri(), &["m1", "m2"]);

    let state = build_state(test_app_config(dir.path()), HashMap::new(), HashMap::new());
    state.registry.refresh().await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["registry_models"], serde_json::json!(["m1", "m2"]));
    assert!(body["active"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn refresh_endpoint_repopulates_the_map() {
    let backend = MockBackend::healthy().await;
    let dir = tempfile::tempdir().unwrap();

    let state = build_state(test_app_config(dir.path()), HashMap::new(), HashMap::new());
    state.registry.refresh().await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure),
    )
    .await;

    write_openai_provider(dir.path(), "pa.yaml", "pA", &backend.uri(), &["m1"]);

    let req = test::TestRequest::post().uri("/refresh").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "refreshed");
    assert_eq!(body["models"], 1);
}

#[actix_web::test]
async fn admin_provider_ids_reject_path_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let state = build_state(test_app_config(dir.path()), HashMap::new(), HashMap::new());

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/admin/providers/..%2Fetc%2Fpasswd")
        .to_request();
    let response = test::call_service(&app, req).await;
    assert_eq!(response.status(), 400);
}

#[actix_web::test]
async fn admin_provider_round_trip() {
    let backend = MockBackend::healthy().await;
    let dir = tempfile::tempdir().unwrap();
    let state = build_state(test_app_config(dir.path()), HashMap::new(), HashMap::new());

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure),
    )
    .await;

    let record = format!(
        "provider_id: pNew\nprovider_type: openai_compat\napi:\n  base_url: {}\n  health:\n    path: /health\n",
        backend.uri()
    );

    // Mismatched URL and YAML id is a 400.
    let req = test::TestRequest::post()
        .uri("/admin/providers/pOther")
        .set_payload(record.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let req = test::TestRequest::post()
        .uri("/admin/providers/pNew")
        .set_payload(record)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = test::TestRequest::get()
        .uri("/admin/providers/pNew")
        .to_request();
    let response = test::call_service(&app, req).await;
    assert_eq!(response.status(), 200);
    let body = test::read_body(response).await;
    assert!(std::str::from_utf8(&body).unwrap().contains("provider_id: pNew"));
}

#[actix_web::test]
async fn admin_logs_tail_respects_limit() {
    let backend = MockBackend::healthy().await;
    backend.chat_ok("m1", "done").await;

    let dir = tempfile::tempdir().unwrap();
    write_openai_provider(dir.path(), "pa.yaml", "pA", &backend.uri(), &["m1"]);

    let state = build_state(test_app_config(dir.path()), HashMap::new(), HashMap::new());
    state.registry.refresh().await;

    for _ in 0..3 {
        state
            .controller
            .handle_chat(chat_request("m1", "hi"))
            .await
            .unwrap();
    }

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/admin/logs?limit=2")
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["logs"].as_array().unwrap().len(), 2);
}
