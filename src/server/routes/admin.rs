//! Admin endpoints
//!
//! Raw provider records, the routes file, the merged configuration view,
//! and the request-log tail. Provider ids come straight from the URL, so
//! anything that could escape the config directory is rejected up front.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use actix_web::{web, HttpResponse, Result as ActixResult};
use serde::Deserialize;
use tracing::info;

use crate::config::{RouteConfig, RoutesFile};
use crate::core::providers::ProviderSpec;
use crate::server::state::AppState;
use crate::utils::error::GatewayError;

/// Configure the `/admin` routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/providers/{provider_id}", web::get().to(get_provider_config))
            .route(
                "/providers/{provider_id}",
                web::post().to(save_provider_config),
            )
            .route("/routes", web::get().to(get_routes))
            .route("/routes", web::post().to(update_routes))
            .route("/config", web::get().to(get_config))
            .route("/logs", web::get().to(tail_logs)),
    );
}

/// Reject ids that could traverse out of the providers directory.
fn validate_provider_id(id: &str) -> Result<(), GatewayError> {
    if id.is_empty() || id.contains("..") || id.contains('/') || id.contains('\\') {
        return Err(GatewayError::InvalidRequest(format!(
            "invalid provider id: {id}"
        )));
    }
    Ok(())
}

fn providers_dir(state: &AppState) -> PathBuf {
    PathBuf::from(&state.config.app().providers.config_dir)
}

/// Find the record file declaring `provider_id`, returning its raw content.
fn find_provider_file(dir: &Path, provider_id: &str) -> Option<String> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        ) {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        if let Ok(spec) = serde_yaml::from_str::<ProviderSpec>(&content) {
            if spec.provider_id == provider_id {
                return Some(content);
            }
        }
    }
    None
}

/// Raw YAML of one provider record.
pub async fn get_provider_config(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let provider_id = path.into_inner();
    validate_provider_id(&provider_id)?;

    match find_provider_file(&providers_dir(&state), &provider_id) {
        Some(content) => Ok(HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(content)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": { "message": format!("provider {provider_id} not found") }
        }))),
    }
}

/// Overwrite (or create) one provider record from raw YAML.
///
/// The body must parse as a provider record whose `provider_id` matches the
/// URL; the file is written as `<provider_id>.yaml`.
pub async fn save_provider_config(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Bytes,
) -> ActixResult<HttpResponse> {
    let provider_id = path.into_inner();
    validate_provider_id(&provider_id)?;

    let yaml_text = String::from_utf8(body.to_vec())
        .map_err(|_| GatewayError::InvalidRequest("body is not UTF-8".to_string()))?;
    let spec: ProviderSpec = serde_yaml::from_str(&yaml_text)
        .map_err(|e| GatewayError::InvalidRequest(format!("invalid provider YAML: {e}")))?;
    if spec.provider_id != provider_id {
        return Err(GatewayError::InvalidRequest(
            "provider_id in YAML must match URL".to_string(),
        )
        .into());
    }

    let dir = providers_dir(&state);
    std::fs::create_dir_all(&dir).map_err(GatewayError::from)?;
    std::fs::write(dir.join(format!("{provider_id}.yaml")), yaml_text)
        .map_err(GatewayError::from)?;

    info!(provider = %provider_id, "provider record saved");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "saved" })))
}

/// Current route definitions.
pub async fn get_routes(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(&*state.config.routes()))
}

/// Replace the routes file and reload it.
pub async fn update_routes(
    state: web::Data<AppState>,
    body: web::Json<HashMap<String, RouteConfig>>,
) -> ActixResult<HttpResponse> {
    let file = RoutesFile {
        routes: body.into_inner(),
    };
    let yaml = serde_yaml::to_string(&file)
        .map_err(|e| GatewayError::Internal(format!("cannot serialize routes: {e}")))?;
    std::fs::write(state.config.routes_path(), yaml).map_err(GatewayError::from)?;
    state.config.reload_routes()?;

    info!(routes = state.config.routes().len(), "routes updated");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "updated" })))
}

/// Merged configuration view: runtime config, routes, model records, and
/// per-provider summaries.
pub async fn get_config(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "config": &*state.config.app(),
        "routes": &*state.config.routes(),
        "models": &*state.config.models(),
        "providers": state.registry.provider_summaries(),
    })))
}

#[derive(Debug, Deserialize)]
struct TailQuery {
    limit: Option<usize>,
}

/// Tail of the in-memory request log ring.
pub async fn tail_logs(
    state: web::Data<AppState>,
    query: web::Query<TailQuery>,
) -> ActixResult<HttpResponse> {
    let limit = query.limit.unwrap_or(100);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "logs": state.request_log.recent(limit),
    })))
}
