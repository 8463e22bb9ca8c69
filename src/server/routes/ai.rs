//! AI API endpoints (OpenAI compatible)

use actix_web::{web, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::core::types::{ChatCompletionRequest, ModelEntry, ModelList};
use crate::server::state::AppState;

/// Configure the `/v1` routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v1")
            .route("/chat/completions", web::post().to(chat_completions))
            .route("/models", web::get().to(list_models)),
    );
}

/// Chat completions endpoint
///
/// Resolves the model (or route), schedules the job, walks the fallback
/// chain, and returns the canonical envelope. Exhaustion surfaces as a 500
/// carrying the per-attempt records.
pub async fn chat_completions(
    state: web::Data<AppState>,
    request: web::Json<ChatCompletionRequest>,
) -> ActixResult<HttpResponse> {
    info!(model = %request.model, "chat completion request");
    let response = state.controller.handle_chat(request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Model listing endpoint
///
/// Concrete models from the registry plus a synthetic `route:<name>` entry
/// per defined route, so clients can select routes like models.
pub async fn list_models(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let mut entries: Vec<ModelEntry> = state
        .registry
        .model_ids()
        .into_iter()
        .map(ModelEntry::model)
        .collect();

    let routes = state.config.routes();
    let mut route_names: Vec<&String> = routes.keys().collect();
    route_names.sort();
    entries.extend(route_names.into_iter().map(|name| ModelEntry::route(name)));

    Ok(HttpResponse::Ok().json(ModelList::new(entries)))
}
