//! HTTP server core

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer as ActixHttpServer};
use tracing::info;

use crate::config::ServerConfig;
use crate::server::routes;
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};

/// HTTP server over a wired-up application state
pub struct HttpServer {
    config: ServerConfig,
    state: AppState,
}

impl HttpServer {
    /// Bind configuration and state.
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Run until the process is stopped.
    pub async fn start(self) -> Result<()> {
        let bind_addr = format!("{}:{}", self.config.host, self.config.port);
        info!(addr = %bind_addr, "starting HTTP server");

        let state = web::Data::new(self.state);
        let server = ActixHttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .wrap(Cors::permissive())
                .wrap(Logger::default())
                .configure(routes::configure)
        })
        .bind(&bind_addr)
        .map_err(|e| GatewayError::Config(format!("cannot bind {bind_addr}: {e}")))?
        .run();

        info!(addr = %bind_addr, "HTTP server listening");
        server
            .await
            .map_err(|e| GatewayError::Internal(format!("server error: {e}")))?;

        info!("HTTP server stopped");
        Ok(())
    }
}
