//! Route resolution
//!
//! A client-supplied model string is either a concrete model id or
//! `route:<name>`. Routes expand to a primary model, an ordered fallback
//! list, and the set of normalized error codes that permit walking it.

use std::sync::Arc;

use crate::config::ConfigStore;
use crate::utils::error::NormalizedCode;

/// Result of resolving a client model string
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Model tried first
    pub primary: String,
    /// Route name when the input was a route
    pub route: Option<String>,
    /// Ordered fallback candidates
    pub fallbacks: Vec<String>,
    /// Codes on which fallback is permitted
    pub triggers: Vec<NormalizedCode>,
}

impl Resolution {
    fn direct(model: impl Into<String>) -> Self {
        Self {
            primary: model.into(),
            route: None,
            fallbacks: Vec::new(),
            triggers: Vec::new(),
        }
    }
}

/// Translates model strings through the route table
pub struct RouteResolver {
    config: Arc<ConfigStore>,
}

impl RouteResolver {
    /// Resolver over the shared config store.
    pub fn new(config: Arc<ConfigStore>) -> Self {
        Self { config }
    }

    /// Resolve a model string.
    ///
    /// An unknown route name falls through unchanged so the controller can
    /// report model-not-found with the original input.
    pub fn resolve(&self, model_input: &str) -> Resolution {
        let Some(route_name) = model_input.strip_prefix("route:") else {
            return Resolution::direct(model_input);
        };

        match self.config.route(route_name) {
            Some(route) => Resolution {
                primary: route.primary_model,
                route: Some(route_name.to_string()),
                fallbacks: route.fallback_models,
                triggers: route.fallback_on,
            },
            None => Resolution::direct(model_input),
        }
    }
}
