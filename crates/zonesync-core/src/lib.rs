// # zonesync-core
//
// Core library for reconciling DNS zones against a remote authority.
//
// ## Architecture Overview
//
// - **RecordData / CanonicalRecord**: provider-neutral record model
// - **adapter**: conversion between canonical records and the wire record shape
// - **normalize / diff**: canonical comparison of desired and existing records
// - **Correction**: a described, deferred batched zone update
// - **ZoneClient**: trait for fetching and updating zones via provider APIs
// - **Reconciler**: orchestrates fetch → diff → correct for many zones
// - **ProviderRegistry**: plugin-based registry for zone clients
//
// ## Design Principles
//
// 1. **Plan before write**: corrections are values; nothing touches the
//    remote until one is executed
// 2. **Plugin-Based**: providers are registered by the composing binary
// 3. **Library-First**: all core functionality can be used as a library
// 4. **Zone isolation**: a failing zone never affects another

pub mod adapter;
pub mod config;
pub mod correction;
pub mod diff;
pub mod error;
pub mod normalize;
pub mod reconciler;
pub mod record;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use adapter::{decode, encode};
pub use config::{DesiredState, EngineConfig, ProviderConfig, SyncConfig, ZoneSpec};
pub use correction::{Correction, build_corrections};
pub use diff::{Change, DiffEntry, DiffKey, ZoneDiff, diff};
pub use error::{Error, Result};
pub use normalize::normalize;
pub use reconciler::{ReconcileEvent, ReconcileReport, Reconciler, ZoneOutcome, ZoneReport};
pub use record::{
    CanonicalRecord, DEFAULT_TTL, ProviderHandle, ProviderRecord, RecordData, RecordKind,
};
pub use registry::ProviderRegistry;
pub use traits::{
    ApiMessage, FetchedZone, ProviderCapabilities, ZoneClient, ZoneClientFactory, ZoneHandle,
    ZoneUpdate, ZoneUpdateResponse,
};
