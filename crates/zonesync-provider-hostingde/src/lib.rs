// # hosting.de DNS Provider
//
// This crate provides a hosting.de zone client for the zonesync reconciler.
//
// ## Implementation Status
//
// - ✅ Zone lookup by Unicode name with an exactly-one-match rule
// - ✅ One batched `zoneUpdate` call per correction
// - ✅ Embedded API errors returned to the caller, not swallowed
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Specific error handling for HTTP status codes (401/403, 404, 429, 5xx)
// - ✅ Nameserver listing
// - ❌ NO retry logic (callers own retries)
// - ❌ NO caching (every reconciliation fetches fresh zone state)
// - ❌ NO multi-string TXT (the API stores a single content string)
//
// ## Security Requirements
//
// - API key NEVER appears in logs
// - Provider MUST fail fast if the key is empty
//
// ## API Reference
//
// - Find zones: POST `{base}dns/v1/json/zonesFind`
// - Update zone: POST `{base}dns/v1/json/zoneUpdate`

pub mod api;

use api::{Envelope, FindRequest, FindResult, RequestFilter, UpdateRequest, ZoneObject};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use zonesync_core::config::ProviderConfig;
use zonesync_core::record::RecordKind;
use zonesync_core::traits::{
    FetchedZone, ProviderCapabilities, ZoneClient, ZoneClientFactory, ZoneHandle, ZoneUpdate,
    ZoneUpdateResponse,
};
use zonesync_core::{Error, Result};

/// Provider type name used in configuration and the registry
pub const PROVIDER_NAME: &str = "hostingde";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// hosting.de zone client
///
/// Stateless apart from its HTTP connection pool; safe to share between
/// concurrently reconciled zones.
///
/// # Security
///
/// The Debug implementation does NOT expose the API key.
pub struct HostingDeClient {
    /// hosting.de API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// API base URL, always ending in `/`
    base_url: String,

    /// Page size for find requests
    limit: u32,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for HostingDeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostingDeClient")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("limit", &self.limit)
            .finish()
    }
}

impl HostingDeClient {
    /// Create a new hosting.de client
    ///
    /// # Parameters
    ///
    /// - `api_key`: hosting.de API key with DNS permissions
    /// - `base_url`: API endpoint, e.g. `https://secure.hosting.de/api/`
    /// - `limit`: page size for find requests
    ///
    /// # Errors
    ///
    /// `Config` when the key is empty, the limit is zero, or the HTTP client
    /// cannot be built.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, limit: u32) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("hosting.de API key cannot be empty"));
        }
        if limit == 0 {
            return Err(Error::config("hosting.de page limit must be > 0"));
        }

        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            base_url,
            limit,
            client,
        })
    }

    /// URL of a DNS API method
    fn endpoint(&self, method: &str) -> String {
        format!("{}dns/v1/json/{}", self.base_url, method)
    }

    /// Request body for finding a zone by name
    fn find_request<'a>(&'a self, zone: &'a str) -> FindRequest<'a> {
        FindRequest {
            auth_token: &self.api_key,
            filter: RequestFilter {
                field: api::ZONE_NAME_FILTER,
                value: zone,
            },
            limit: self.limit,
            page: 1,
        }
    }

    /// POST a request and decode the response envelope
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /dns/v1/json/{method}
    /// Content-Type: application/json
    /// ```
    async fn call<B, T>(&self, method: &str, body: &B) -> Result<Envelope<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.endpoint(method))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::http(format!("{} request failed: {}", method, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(method, status.as_u16(), &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("Failed to parse {} response: {}", method, e)))
    }

    /// Names of the zone's nameservers, as published in its NS records
    pub async fn nameservers(&self, zone: &str) -> Result<Vec<String>> {
        let fetched = self.fetch_zone(zone).await?;
        Ok(fetched
            .records
            .into_iter()
            .filter(|record| record.kind == RecordKind::Ns.as_str())
            .map(|record| record.content)
            .collect())
    }
}

/// Map an unsuccessful HTTP status to an error
fn status_error(method: &str, status: u16, body: &str) -> Error {
    match status {
        401 | 403 => Error::provider(
            PROVIDER_NAME,
            format!("Authentication failed: Invalid API key or insufficient permissions. Status: {}", status),
        ),
        404 => Error::lookup(format!("{} endpoint not found. Status: {}", method, status)),
        429 => Error::provider(
            PROVIDER_NAME,
            format!("Rate limit exceeded. Please retry later. Status: {}", status),
        ),
        500..=599 => Error::provider(
            PROVIDER_NAME,
            format!("hosting.de server error (transient): {} - {}", status, body),
        ),
        _ => Error::provider(PROVIDER_NAME, format!("{} failed: {} - {}", method, status, body)),
    }
}

/// Turn a zonesFind response into exactly one zone
fn single_zone(zone: &str, envelope: Envelope<FindResult<ZoneObject>>) -> Result<FetchedZone> {
    if !envelope.errors.is_empty() {
        let messages: Vec<String> = envelope.errors.iter().map(ToString::to_string).collect();
        return Err(Error::provider(
            PROVIDER_NAME,
            format!("zonesFind for {} returned {}:\n{}", zone, envelope.status, messages.join("\n")),
        ));
    }

    let (mut data, total) = envelope
        .response
        .map(|r| (r.data, r.total_entries))
        .unwrap_or_default();
    if total > 1 {
        return Err(Error::lookup(format!(
            "Zone {} is ambiguous: {} zones match",
            zone, total
        )));
    }
    if total != data.len() as u64 {
        return Err(Error::lookup(format!(
            "zonesFind for {} reported {} match(es) but returned {}",
            zone,
            total,
            data.len()
        )));
    }

    match data.len() {
        0 => Err(Error::lookup(format!("Zone {} not found", zone))),
        1 => {
            let object = data.remove(0);
            Ok(FetchedZone {
                handle: ZoneHandle::from_raw(object.zone_config)?,
                records: object.records,
            })
        }
        n => Err(Error::lookup(format!(
            "Zone {} is ambiguous: {} zones match",
            zone, n
        ))),
    }
}

#[async_trait]
impl ZoneClient for HostingDeClient {
    async fn fetch_zone(&self, zone: &str) -> Result<FetchedZone> {
        tracing::debug!("Looking up hosting.de zone: {}", zone);

        let envelope: Envelope<FindResult<ZoneObject>> =
            self.call("zonesFind", &self.find_request(zone)).await?;
        let fetched = single_zone(zone, envelope)?;

        tracing::debug!(
            "Found zone {} ({} records)",
            fetched.handle.id(),
            fetched.records.len()
        );
        Ok(fetched)
    }

    async fn update_zone(&self, update: &ZoneUpdate) -> Result<ZoneUpdateResponse> {
        tracing::info!(
            "Sending hosting.de zoneUpdate for {}: {} add, {} modify, {} delete",
            update.zone_config.name(),
            update.records_to_add.len(),
            update.records_to_modify.len(),
            update.records_to_delete.len()
        );

        let request = UpdateRequest {
            auth_token: &self.api_key,
            update,
        };
        let envelope: Envelope<serde_json::Value> = self.call("zoneUpdate", &request).await?;

        if !envelope.errors.is_empty() {
            tracing::warn!(
                "hosting.de zoneUpdate for {} returned status {:?}",
                update.zone_config.name(),
                envelope.status
            );
        }

        Ok(ZoneUpdateResponse {
            errors: envelope.errors,
        })
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            txt_multi: false,
            ..ProviderCapabilities::all()
        }
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating hosting.de clients
pub struct HostingDeFactory;

impl ZoneClientFactory for HostingDeFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Arc<dyn ZoneClient>> {
        match config {
            ProviderConfig::HostingDe {
                api_key,
                base_url,
                limit,
            } => {
                if api_key.is_empty() {
                    return Err(Error::config("hosting.de API key is required"));
                }
                Ok(Arc::new(HostingDeClient::new(
                    api_key.clone(),
                    base_url.clone(),
                    *limit,
                )?))
            }
            _ => Err(Error::config("Invalid config for hosting.de provider")),
        }
    }
}

/// Register the hosting.de provider with a registry
///
/// # Example
///
/// ```rust
/// use zonesync_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// zonesync_provider_hostingde::register(&registry);
/// assert!(registry.has_provider("hostingde"));
/// ```
pub fn register(registry: &zonesync_core::ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(HostingDeFactory));
}
