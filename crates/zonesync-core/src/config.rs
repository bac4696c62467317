//! Configuration types for the zonesync system
//!
//! This module defines the provider settings, the desired zone contents and
//! the reconciler settings.

use crate::error::{Error, Result};
use crate::record::CanonicalRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Default hosting.de API endpoint
pub const DEFAULT_HOSTINGDE_BASE_URL: &str = "https://secure.hosting.de/api/";

/// Default page size for hosting.de find requests
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Main zonesync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Remote authority configuration
    pub provider: ProviderConfig,

    /// Zones to reconcile
    pub zones: Vec<ZoneSpec>,

    /// Optional reconciler settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl SyncConfig {
    /// Create a configuration for a provider with no zones
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            zones: Vec::new(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.zones.is_empty() {
            return Err(Error::config("No zones configured"));
        }

        let mut seen = HashSet::new();
        for zone in &self.zones {
            zone.validate()?;
            if !seen.insert(zone.normalized_name()) {
                return Err(Error::config(format!("Zone {} is configured twice", zone.name)));
            }
        }

        self.provider.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

/// Remote authority configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// hosting.de DNS API
    #[serde(rename = "hostingde")]
    HostingDe {
        /// API key
        api_key: String,
        /// API base URL
        #[serde(default = "default_base_url")]
        base_url: String,
        /// Page size for find requests
        #[serde(default = "default_page_limit")]
        limit: u32,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// hosting.de configuration with default endpoint and page size
    pub fn hostingde(api_key: impl Into<String>) -> Self {
        ProviderConfig::HostingDe {
            api_key: api_key.into(),
            base_url: default_base_url(),
            limit: default_page_limit(),
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<()> {
        match self {
            ProviderConfig::HostingDe {
                api_key,
                base_url,
                limit,
            } => {
                if api_key.is_empty() {
                    return Err(Error::config("hosting.de API key cannot be empty"));
                }
                if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
                    return Err(Error::config(format!(
                        "hosting.de base URL must use HTTP or HTTPS scheme. Got: {}",
                        base_url
                    )));
                }
                if *limit == 0 {
                    return Err(Error::config("hosting.de page limit must be > 0"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(Error::config("Custom provider factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(Error::config("Custom provider config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::HostingDe { .. } => "hostingde",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

// Keeps the API key out of logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderConfig::HostingDe {
                base_url, limit, ..
            } => f
                .debug_struct("HostingDe")
                .field("api_key", &"<REDACTED>")
                .field("base_url", base_url)
                .field("limit", limit)
                .finish(),
            ProviderConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", &"<REDACTED>")
                .finish(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_HOSTINGDE_BASE_URL.to_string()
}

fn default_page_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

/// Desired contents of one zone
///
/// Record names may be `@` (the apex), relative (`www`), or fully
/// qualified with or without a trailing dot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSpec {
    /// Zone name (e.g., "example.com")
    pub name: String,

    /// Desired records
    #[serde(default)]
    pub records: Vec<CanonicalRecord>,
}

impl ZoneSpec {
    /// Create a zone specification
    pub fn new(name: impl Into<String>, records: Vec<CanonicalRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Zone name lowercased, without trailing dot
    pub fn normalized_name(&self) -> String {
        self.name.trim_end_matches('.').to_ascii_lowercase()
    }

    /// Validate the zone specification
    pub fn validate(&self) -> Result<()> {
        if self.normalized_name().is_empty() {
            return Err(Error::config("Zone name cannot be empty"));
        }
        self.qualified_records().map(|_| ())
    }

    /// Desired records with fully-qualified names (no trailing dot)
    ///
    /// # Errors
    ///
    /// `Config` for an absolute name outside the zone.
    pub fn qualified_records(&self) -> Result<Vec<CanonicalRecord>> {
        let zone = self.normalized_name();
        self.records
            .iter()
            .map(|record| {
                let mut record = record.clone();
                record.name = qualify(&record.name, &zone)?;
                Ok(record)
            })
            .collect()
    }
}

fn qualify(name: &str, zone: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() || name == "@" {
        return Ok(zone.to_string());
    }

    let in_zone = |n: &str| {
        let lower = n.to_ascii_lowercase();
        lower == zone || lower.ends_with(&format!(".{}", zone))
    };

    if let Some(absolute) = name.strip_suffix('.') {
        if !in_zone(absolute) {
            return Err(Error::config(format!(
                "Record name {} is outside zone {}",
                name, zone
            )));
        }
        return Ok(absolute.to_string());
    }

    if in_zone(name) {
        Ok(name.to_string())
    } else {
        Ok(format!("{}.{}", name, zone))
    }
}

/// Reconciler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Plan and describe corrections without executing them
    #[serde(default)]
    pub dry_run: bool,

    /// Maximum number of zones reconciled at the same time
    #[serde(default = "default_max_concurrent_zones")]
    pub max_concurrent_zones: usize,

    /// Capacity of the reconciler event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine settings
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_zones == 0 {
            return Err(Error::config("max_concurrent_zones must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::config("event_channel_capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            max_concurrent_zones: default_max_concurrent_zones(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_max_concurrent_zones() -> usize {
    4
}

fn default_event_channel_capacity() -> usize {
    1000
}

/// Desired state file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesiredState {
    /// Zones and their desired records
    pub zones: Vec<ZoneSpec>,
}

impl DesiredState {
    /// Parse desired state from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load desired state from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }
}
