//! Health and refresh endpoints

use actix_web::{web, HttpResponse, Result as ActixResult};
use serde::Serialize;

use crate::server::state::AppState;

/// Configure `/health` and `/refresh`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/refresh", web::post().to(refresh_registry));
}

/// One currently executing job
#[derive(Debug, Serialize)]
struct ActiveEntry {
    model: String,
    provider: Option<String>,
}

/// Health snapshot
#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    active: Vec<ActiveEntry>,
    registry_models: Vec<String>,
}

/// Gateway health: active jobs and the registered model set.
pub async fn health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let active = state
        .scheduler
        .active_snapshot()
        .await
        .into_iter()
        .map(|job| ActiveEntry {
            model: job.model,
            provider: job.provider_id,
        })
        .collect();

    Ok(HttpResponse::Ok().json(HealthStatus {
        status: "ok",
        active,
        registry_models: state.registry.model_ids(),
    }))
}

/// Force a registry refresh.
pub async fn refresh_registry(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    state.registry.refresh().await;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "refreshed",
        "models": state.registry.model_ids().len(),
    })))
}
