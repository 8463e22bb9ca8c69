//! Provider registry
//!
//! Loads provider records from disk, probes each backend, and publishes the
//! `model -> provider` map. Refresh replaces the whole snapshot atomically,
//! so readers see either the old map or the new one, never a partial view.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{error, info, warn};

use super::process::ProcessSupervisor;
use super::providers::{AdapterBuilders, AdapterContext, ProviderAdapter, ProviderSpec};
use crate::config::ConfigStore;

/// Immutable view published after a load or refresh
#[derive(Default)]
pub struct RegistrySnapshot {
    /// Adapters by provider id, in load order
    pub providers: Vec<Arc<dyn ProviderAdapter>>,
    /// Owning provider id per model id
    pub model_map: HashMap<String, String>,
}

impl RegistrySnapshot {
    /// Adapter by provider id.
    pub fn provider(&self, provider_id: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.providers
            .iter()
            .find(|p| p.provider_id() == provider_id)
            .cloned()
    }
}

/// Summary of one provider for the admin surface
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProviderSummary {
    /// Provider id
    pub id: String,
    /// Adapter family
    pub provider_type: String,
    /// Whether the gateway manages its process
    pub managed: bool,
    /// Models this provider owns in the current map
    pub models: Vec<String>,
}

/// Provider registry with atomic snapshot replacement
pub struct Registry {
    config: Arc<ConfigStore>,
    builders: AdapterBuilders,
    supervisor: Arc<ProcessSupervisor>,
    snapshot: ArcSwap<RegistrySnapshot>,
    last_refresh: Mutex<Option<Instant>>,
    // Serializes refreshes so two misses cannot probe backends concurrently.
    refresh_gate: tokio::sync::Mutex<()>,
}

impl Registry {
    /// New registry with the standard adapter families.
    pub fn new(config: Arc<ConfigStore>, supervisor: Arc<ProcessSupervisor>) -> Self {
        Self::with_builders(config, supervisor, AdapterBuilders::standard())
    }

    /// New registry with a caller-supplied builder table.
    pub fn with_builders(
        config: Arc<ConfigStore>,
        supervisor: Arc<ProcessSupervisor>,
        builders: AdapterBuilders,
    ) -> Self {
        Self {
            config,
            builders,
            supervisor,
            snapshot: ArcSwap::from_pointee(RegistrySnapshot::default()),
            last_refresh: Mutex::new(None),
            refresh_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Current published snapshot.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.snapshot.load_full()
    }

    /// Owning adapter for a model, if any.
    pub fn get_provider_for_model(&self, model_id: &str) -> Option<Arc<dyn ProviderAdapter>> {
        let snapshot = self.snapshot.load();
        let provider_id = snapshot.model_map.get(model_id)?;
        snapshot.provider(provider_id)
    }

    /// Whether a model is present in the current map.
    pub fn has_model(&self, model_id: &str) -> bool {
        self.snapshot.load().model_map.contains_key(model_id)
    }

    /// Model ids in the current map.
    pub fn model_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.snapshot.load().model_map.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Per-provider summaries for the admin surface.
    pub fn provider_summaries(&self) -> Vec<ProviderSummary> {
        let snapshot = self.snapshot.load();
        snapshot
            .providers
            .iter()
            .map(|p| {
                let mut models: Vec<String> = snapshot
                    .model_map
                    .iter()
                    .filter(|(_, owner)| owner.as_str() == p.provider_id())
                    .map(|(model, _)| model.clone())
                    .collect();
                models.sort();
                ProviderSummary {
                    id: p.provider_id().to_string(),
                    provider_type: p.provider_type().to_string(),
                    managed: p.is_managed(),
                    models,
                }
            })
            .collect()
    }

    /// Whether the refresh cooldown has passed. Enforced by callers, never by
    /// [`Registry::refresh`] itself.
    pub fn cooldown_elapsed(&self, cooldown_seconds: u64) -> bool {
        match *self.last_refresh.lock() {
            Some(at) => at.elapsed().as_secs() >= cooldown_seconds,
            None => true,
        }
    }

    /// Reload provider records and re-probe every backend, replacing the
    /// published snapshot. The refresh timestamp is updated unconditionally.
    pub async fn refresh(&self) {
        let _gate = self.refresh_gate.lock().await;

        let adapters = self.load_providers_from_disk();
        let snapshot = self.detect_and_register(adapters).await;

        self.snapshot.store(Arc::new(snapshot));
        *self.last_refresh.lock() = Some(Instant::now());
    }

    fn load_providers_from_disk(&self) -> Vec<Arc<dyn ProviderAdapter>> {
        let app = self.config.app();
        let dir = PathBuf::from(&app.providers.config_dir);
        if !dir.exists() {
            warn!(dir = %dir.display(), "providers directory not found");
            return Vec::new();
        }

        let mut paths: Vec<PathBuf> = match std::fs::read_dir(&dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    matches!(
                        p.extension().and_then(|e| e.to_str()),
                        Some("yaml") | Some("yml")
                    )
                })
                .collect(),
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "cannot read providers directory");
                return Vec::new();
            }
        };
        // Filename order keeps duplicate-model resolution deterministic.
        paths.sort();

        let context = AdapterContext {
            supervisor: Arc::clone(&self.supervisor),
            chat_timeout: std::time::Duration::from_secs(app.runtime.request_timeout_seconds),
        };

        let mut adapters: Vec<Arc<dyn ProviderAdapter>> = Vec::new();
        for path in paths {
            match self.build_adapter(&path, context.clone()) {
                Ok(Some(adapter)) => {
                    if adapters
                        .iter()
                        .any(|a| a.provider_id() == adapter.provider_id())
                    {
                        warn!(
                            provider = adapter.provider_id(),
                            file = %path.display(),
                            "duplicate provider id, skipping"
                        );
                        continue;
                    }
                    adapters.push(adapter);
                }
                Ok(None) => {}
                Err(e) => {
                    error!(file = %path.display(), error = %e, "error loading provider config");
                }
            }
        }
        adapters
    }

    fn build_adapter(
        &self,
        path: &Path,
        context: AdapterContext,
    ) -> crate::utils::error::Result<Option<Arc<dyn ProviderAdapter>>> {
        let raw = std::fs::read_to_string(path)?;
        let spec: ProviderSpec = serde_yaml::from_str(&raw)?;

        let Some(builder) = self.builders.get(&spec.provider_type) else {
            error!(
                provider = %spec.provider_id,
                provider_type = %spec.provider_type,
                "unknown provider type"
            );
            return Ok(None);
        };
        Ok(Some(builder(spec, context)?))
    }

    async fn detect_and_register(
        &self,
        adapters: Vec<Arc<dyn ProviderAdapter>>,
    ) -> RegistrySnapshot {
        let mut model_map: HashMap<String, String> = HashMap::new();

        for adapter in &adapters {
            let provider_id = adapter.provider_id().to_string();
            info!(provider = %provider_id, "probing provider");

            let detect = &adapter.spec().detect;
            if detect.method.contains("path") {
                if let Some(binary) = detect.binary_name.as_deref() {
                    if find_in_path(binary).is_none() {
                        info!(provider = %provider_id, binary, "binary not found on PATH");
                        if adapter.is_managed() {
                            // Cannot start what we cannot find.
                            continue;
                        }
                    }
                }
            }

            let mut healthy = adapter.health_check().await;
            if !healthy && adapter.is_managed() {
                info!(provider = %provider_id, "provider not healthy, attempting start");
                if adapter.start().await {
                    let grace = adapter
                        .spec()
                        .start
                        .as_ref()
                        .map(|s| s.startup_grace_seconds)
                        .unwrap_or(5);
                    tokio::time::sleep(std::time::Duration::from_secs(grace)).await;
                    healthy = adapter.health_check().await;
                }
            }

            if !healthy {
                warn!(provider = %provider_id, "provider is not healthy");
                continue;
            }

            let models = adapter.list_models().await;
            info!(provider = %provider_id, ?models, "provider healthy");
            for model in models {
                if let Some(owner) = model_map.get(&model) {
                    warn!(
                        model = %model,
                        provider = %provider_id,
                        owner = %owner,
                        "duplicate model, keeping first owner"
                    );
                } else {
                    model_map.insert(model, provider_id.clone());
                }
            }

            if adapter.is_managed() && !adapter.spec().policy.keep_warm {
                adapter.stop().await;
            }
        }

        RegistrySnapshot {
            providers: adapters,
            model_map,
        }
    }
}

/// Locate an executable on the host PATH.
fn find_in_path(binary: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(binary);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}
