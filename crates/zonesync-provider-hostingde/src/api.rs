//! hosting.de DNS API wire types
//!
//! Every call is a JSON `POST` to `{base_url}dns/v1/json/{method}` with the
//! API key in the body as `authToken`. Responses share one envelope:
//!
//! ```json
//! { "status": "success", "errors": [], "warnings": [], "response": { ... } }
//! ```

use serde::{Deserialize, Serialize};
use zonesync_core::record::ProviderRecord;
use zonesync_core::traits::{ApiMessage, ZoneUpdate};

/// Filter field matching a zone by its Unicode name
pub const ZONE_NAME_FILTER: &str = "ZoneNameUnicode";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindRequest<'a> {
    pub auth_token: &'a str,
    pub filter: RequestFilter<'a>,
    pub limit: u32,
    pub page: u32,
}

#[derive(Debug, Serialize)]
pub struct RequestFilter<'a> {
    pub field: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest<'a> {
    pub auth_token: &'a str,
    #[serde(flatten)]
    pub update: &'a ZoneUpdate,
}

/// Response envelope
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    #[serde(default = "Option::default")]
    pub response: Option<T>,
}

/// Paged result of a find call
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindResult<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub total_entries: u64,
}

/// A zone: its configuration object plus its records
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneObject {
    pub zone_config: serde_json::Value,
    #[serde(default)]
    pub records: Vec<ProviderRecord>,
}
