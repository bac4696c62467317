//! Core traits for the zonesync system
//!
//! - [`ZoneClient`]: fetch zones from and push batched updates to the remote authority
//! - [`ProviderCapabilities`]: which optional record kinds an authority supports

pub mod capabilities;
pub mod zone_client;

pub use capabilities::ProviderCapabilities;
pub use zone_client::{
    ApiMessage, FetchedZone, ZoneClient, ZoneClientFactory, ZoneHandle, ZoneUpdate,
    ZoneUpdateResponse,
};
