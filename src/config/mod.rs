//! Gateway configuration
//!
//! Types, file loading, and the reloadable store.

pub mod loader;
pub mod models;
pub mod store;

pub use models::{
    AppConfig, LoggingConfig, ModelResourceConfig, ModelScoreConfig, ModelsFile, PickNextStrategy,
    ProvidersConfig, RouteConfig, RoutesFile, RoutingConfig, RuntimeConfig, SchedulingConfig,
    ServerConfig,
};
pub use store::{ConfigPaths, ConfigStore};
