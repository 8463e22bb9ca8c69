//! HTTP route configuration

pub mod admin;
pub mod ai;
pub mod health;

use actix_web::web;

/// Register every route group on one service config.
pub fn configure(cfg: &mut web::ServiceConfig) {
    ai::configure_routes(cfg);
    health::configure_routes(cfg);
    admin::configure_routes(cfg);
}
