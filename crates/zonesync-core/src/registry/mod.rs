//! Plugin-based provider registry
//!
//! The registry maps provider type names to factories so that the composing
//! application decides which authorities are available. Nothing registers
//! itself implicitly.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zonesync_core::registry::ProviderRegistry;
//! use zonesync_core::config::ProviderConfig;
//!
//! let registry = ProviderRegistry::new();
//! zonesync_provider_hostingde::register(&registry);
//!
//! let client = registry.create_client(&ProviderConfig::hostingde(api_key))?;
//! ```

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{ZoneClient, ZoneClientFactory};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Provider registry for plugin-based zone client creation
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered zone client factories
    providers: RwLock<HashMap<String, Box<dyn ZoneClientFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zone client factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "hostingde")
    /// - `factory`: Factory object for creating client instances
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn ZoneClientFactory>) {
        let name = name.into();
        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        providers.insert(name, factory);
    }

    /// Create a zone client from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn ZoneClient>)`: Created client
    /// - `Err(Error)`: If the provider type is not registered or creation fails
    pub fn create_client(&self, config: &ProviderConfig) -> Result<Arc<dyn ZoneClient>> {
        let provider_type = config.type_name();
        let providers = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// List all registered provider types, sorted
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut names: Vec<String> = providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        providers.contains_key(name)
    }
}
