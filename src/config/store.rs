//! Reloadable configuration store
//!
//! Holds the current snapshot of all three config files. Reloads swap whole
//! snapshots (`ArcSwap`), so concurrent readers always observe a coherent
//! view, never a half-applied one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use super::loader;
use super::models::{AppConfig, ModelScoreConfig, RouteConfig};
use crate::utils::error::Result;

/// Locations of the three configuration files
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Main config (`config.yaml`)
    pub config: PathBuf,
    /// Route definitions (`routes.yaml`)
    pub routes: PathBuf,
    /// Per-model scoring (`models.yaml`)
    pub models: PathBuf,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self {
            config: PathBuf::from("config.yaml"),
            routes: PathBuf::from("routes.yaml"),
            models: PathBuf::from("models.yaml"),
        }
    }
}

/// Shared, reloadable configuration
pub struct ConfigStore {
    paths: ConfigPaths,
    app: ArcSwap<AppConfig>,
    routes: ArcSwap<HashMap<String, RouteConfig>>,
    models: ArcSwap<HashMap<String, ModelScoreConfig>>,
}

impl ConfigStore {
    /// Load all three files (missing ones default) and build the store.
    pub fn load(paths: ConfigPaths) -> Result<Self> {
        let app = loader::load_app_config(&paths.config)?;
        let routes = loader::load_routes(&paths.routes)?.routes;
        let models = loader::load_models(&paths.models)?.models;
        info!(
            routes = routes.len(),
            models = models.len(),
            "configuration loaded"
        );
        Ok(Self {
            paths,
            app: ArcSwap::from_pointee(app),
            routes: ArcSwap::from_pointee(routes),
            models: ArcSwap::from_pointee(models),
        })
    }

    /// In-memory store over explicit values, for tests and embedding.
    pub fn from_values(
        app: AppConfig,
        routes: HashMap<String, RouteConfig>,
        models: HashMap<String, ModelScoreConfig>,
    ) -> Self {
        Self {
            paths: ConfigPaths::default(),
            app: ArcSwap::from_pointee(app),
            routes: ArcSwap::from_pointee(routes),
            models: ArcSwap::from_pointee(models),
        }
    }

    /// Current main config snapshot.
    pub fn app(&self) -> Arc<AppConfig> {
        self.app.load_full()
    }

    /// Current route map snapshot.
    pub fn routes(&self) -> Arc<HashMap<String, RouteConfig>> {
        self.routes.load_full()
    }

    /// Look up one route.
    pub fn route(&self, name: &str) -> Option<RouteConfig> {
        self.routes.load().get(name).cloned()
    }

    /// Current model score map snapshot.
    pub fn models(&self) -> Arc<HashMap<String, ModelScoreConfig>> {
        self.models.load_full()
    }

    /// Score record for a model, falling back to the configured default.
    pub fn model_score(&self, model_id: &str) -> ModelScoreConfig {
        self.models
            .load()
            .get(model_id)
            .cloned()
            .unwrap_or_else(|| self.app.load().scheduling.default_model_score.clone())
    }

    /// Path to the routes file (admin endpoints rewrite it in place).
    pub fn routes_path(&self) -> &Path {
        &self.paths.routes
    }

    /// Re-read the routes file and swap the snapshot.
    pub fn reload_routes(&self) -> Result<()> {
        let routes = loader::load_routes(&self.paths.routes)?.routes;
        info!(routes = routes.len(), "routes reloaded");
        self.routes.store(Arc::new(routes));
        Ok(())
    }
}
