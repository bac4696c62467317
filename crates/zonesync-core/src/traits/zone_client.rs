// # Zone Client Trait
//
// Defines the interface to the remote DNS authority: fetch a zone's records
// together with the zone-configuration handle needed for writes, and submit
// one batched update.
//
// ## Implementations
//
// - hosting.de: `zonesync-provider-hostingde` crate
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::ZoneClient;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let client = /* ZoneClient implementation */;
//
//     let zone = client.fetch_zone("example.com").await?;
//     println!("{} records in {}", zone.records.len(), zone.handle.name());
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::record::ProviderRecord;
use crate::traits::capabilities::ProviderCapabilities;

/// Opaque zone-configuration object of the remote authority
///
/// The provider's full zone configuration is kept as JSON and echoed back
/// verbatim on update; only the identifier and the name are interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneHandle {
    id: String,
    name: String,
    raw: serde_json::Value,
}

impl ZoneHandle {
    /// Create a handle carrying only an identifier and a name
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        let name = name.into();
        let raw = serde_json::json!({ "id": id, "name": name });
        Self { id, name, raw }
    }

    /// Wrap a provider zone-configuration object
    ///
    /// # Errors
    ///
    /// `Lookup` when the object is missing a string `id` or `name`.
    pub fn from_raw(raw: serde_json::Value) -> Result<Self, crate::Error> {
        let field = |key: &str| {
            raw.get(key)
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    crate::Error::lookup(format!("zone configuration has no string {:?}", key))
                })
        };
        let id = field("id")?;
        let name = field("name")?;
        Ok(Self { id, name, raw })
    }

    /// Remote identifier of the zone configuration
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Zone name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The provider's zone-configuration object
    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }
}

impl Serialize for ZoneHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

/// A zone as fetched from the authority
#[derive(Debug, Clone)]
pub struct FetchedZone {
    /// Zone-configuration handle required for writes
    pub handle: ZoneHandle,
    /// Every record currently published in the zone
    pub records: Vec<ProviderRecord>,
}

/// One batched remote write for a zone
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneUpdate {
    /// Zone configuration the update applies to
    pub zone_config: ZoneHandle,
    /// Records to create (no identifiers)
    pub records_to_add: Vec<ProviderRecord>,
    /// Records to modify (with identifiers)
    pub records_to_modify: Vec<ProviderRecord>,
    /// Records to delete (with identifiers)
    pub records_to_delete: Vec<ProviderRecord>,
}

impl ZoneUpdate {
    /// Create an empty update for a zone
    pub fn new(zone_config: ZoneHandle) -> Self {
        Self {
            zone_config,
            records_to_add: Vec::new(),
            records_to_modify: Vec::new(),
            records_to_delete: Vec::new(),
        }
    }

    /// Whether the update carries no record changes
    pub fn is_empty(&self) -> bool {
        self.records_to_add.is_empty()
            && self.records_to_modify.is_empty()
            && self.records_to_delete.is_empty()
    }

    /// Total number of record changes
    pub fn len(&self) -> usize {
        self.records_to_add.len() + self.records_to_modify.len() + self.records_to_delete.len()
    }
}

/// Application-level message embedded in an API response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    /// Provider error code
    pub code: i64,
    /// Human-readable text
    #[serde(default)]
    pub text: String,
}

impl fmt::Display for ApiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.text)
    }
}

/// Response to a zone update that reached the authority
///
/// A transport-level success may still carry application errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneUpdateResponse {
    /// Embedded application errors
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
}

impl ZoneUpdateResponse {
    /// Whether the authority reported application errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Trait for remote DNS authority clients
///
/// # Thread Safety
///
/// Implementations must be thread-safe; one client is shared by every zone
/// reconciled concurrently.
///
/// # Responsibilities
///
/// Clients translate calls into the authority's API and nothing else:
///
/// - ✅ Perform API calls to their endpoint
/// - ✅ Map HTTP failures to errors
/// - ✅ Enforce the exactly-one-zone rule on lookup
/// - ❌ Retry or back off (callers own timeouts and retries)
/// - ❌ Decide which records need changing (owned by the diff engine)
/// - ❌ Turn embedded application errors into failures (owned by `Correction`)
#[async_trait]
pub trait ZoneClient: Send + Sync {
    /// Fetch a zone's records and its zone-configuration handle
    ///
    /// # Errors
    ///
    /// `Lookup` when no zone or more than one zone matches `zone`.
    async fn fetch_zone(&self, zone: &str) -> Result<FetchedZone, crate::Error>;

    /// Submit one batched update
    ///
    /// Transport failures are errors; application errors come back inside
    /// the response.
    async fn update_zone(&self, update: &ZoneUpdate) -> Result<ZoneUpdateResponse, crate::Error>;

    /// Optional record kinds this authority can manage
    fn capabilities(&self) -> ProviderCapabilities;

    /// Provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing zone clients from configuration
pub trait ZoneClientFactory: Send + Sync {
    /// Create a ZoneClient instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Arc<dyn ZoneClient>, crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_handle_from_raw_keeps_extra_fields() {
        let raw = serde_json::json!({
            "id": "zc-1",
            "name": "example.com",
            "soaValues": { "refresh": 86400 }
        });

        let handle = ZoneHandle::from_raw(raw.clone()).unwrap();

        assert_eq!(handle.id(), "zc-1");
        assert_eq!(handle.name(), "example.com");
        assert_eq!(serde_json::to_value(&handle).unwrap(), raw);
    }

    #[test]
    fn test_zone_handle_requires_id() {
        let err = ZoneHandle::from_raw(serde_json::json!({ "name": "example.com" })).unwrap_err();
        assert!(matches!(err, crate::Error::Lookup(_)));
    }

    #[test]
    fn test_zone_update_serializes_camel_case() {
        let update = ZoneUpdate::new(ZoneHandle::new("zc-1", "example.com"));
        let json = serde_json::to_value(&update).unwrap();

        assert_eq!(json["zoneConfig"]["id"], "zc-1");
        assert!(json["recordsToAdd"].as_array().unwrap().is_empty());
        assert!(json["recordsToModify"].as_array().unwrap().is_empty());
        assert!(json["recordsToDelete"].as_array().unwrap().is_empty());
        assert!(update.is_empty());
    }

    #[test]
    fn test_api_message_display() {
        let message = ApiMessage {
            code: 10205,
            text: "Record is invalid".to_string(),
        };
        assert_eq!(message.to_string(), "10205: Record is invalid");
    }
}
