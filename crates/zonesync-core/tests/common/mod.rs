//! Test doubles and common utilities for contract tests
//!
//! The in-memory authority applies updates to its own zone state, so a
//! second reconciliation run observes what the first one wrote.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use zonesync_core::error::{Error, Result};
use zonesync_core::record::{CanonicalRecord, ProviderRecord, RecordData};
use zonesync_core::traits::{
    ApiMessage, FetchedZone, ProviderCapabilities, ZoneClient, ZoneHandle, ZoneUpdate,
    ZoneUpdateResponse,
};

/// An in-memory authority that tracks calls
pub struct MockZoneClient {
    /// Zones by name
    zones: Arc<Mutex<HashMap<String, FetchedZone>>>,
    /// Call counter for fetch_zone()
    fetch_call_count: Arc<AtomicUsize>,
    /// Call counter for update_zone()
    update_call_count: Arc<AtomicUsize>,
    /// Every update received, in order
    updates: Arc<Mutex<Vec<ZoneUpdate>>>,
    /// Zones whose updates come back with embedded errors
    rejecting: Arc<Mutex<HashMap<String, Vec<ApiMessage>>>>,
    /// Zones whose updates fail at the transport level
    unreachable: Arc<Mutex<Vec<String>>>,
    /// Next identifier handed out for created records
    next_id: Arc<AtomicUsize>,
    capabilities: ProviderCapabilities,
}

impl MockZoneClient {
    pub fn new() -> Self {
        Self {
            zones: Arc::new(Mutex::new(HashMap::new())),
            fetch_call_count: Arc::new(AtomicUsize::new(0)),
            update_call_count: Arc::new(AtomicUsize::new(0)),
            updates: Arc::new(Mutex::new(Vec::new())),
            rejecting: Arc::new(Mutex::new(HashMap::new())),
            unreachable: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicUsize::new(1000)),
            capabilities: hostingde_capabilities(),
        }
    }

    /// Create a new MockZoneClient that shares state with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            zones: Arc::clone(&other.zones),
            fetch_call_count: Arc::clone(&other.fetch_call_count),
            update_call_count: Arc::clone(&other.update_call_count),
            updates: Arc::clone(&other.updates),
            rejecting: Arc::clone(&other.rejecting),
            unreachable: Arc::clone(&other.unreachable),
            next_id: Arc::clone(&other.next_id),
            capabilities: other.capabilities,
        }
    }

    /// Publish a zone with the given records
    pub fn with_zone(self, name: &str, records: Vec<ProviderRecord>) -> Self {
        let zone = FetchedZone {
            handle: ZoneHandle::new(format!("zc-{}", name), name),
            records,
        };
        self.zones.lock().unwrap().insert(name.to_string(), zone);
        self
    }

    /// Make updates of a zone return embedded errors
    pub fn rejecting_updates(self, zone: &str, errors: Vec<ApiMessage>) -> Self {
        self.rejecting
            .lock()
            .unwrap()
            .insert(zone.to_string(), errors);
        self
    }

    /// Make updates of a zone fail at the transport level
    pub fn failing_updates(self, zone: &str) -> Self {
        self.unreachable.lock().unwrap().push(zone.to_string());
        self
    }

    /// Get the number of times fetch_zone() was called
    pub fn fetch_call_count(&self) -> usize {
        self.fetch_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times update_zone() was called
    pub fn update_call_count(&self) -> usize {
        self.update_call_count.load(Ordering::SeqCst)
    }

    /// Get every update received
    pub fn updates(&self) -> Vec<ZoneUpdate> {
        self.updates.lock().unwrap().clone()
    }

    /// Current records of a zone
    pub fn records(&self, zone: &str) -> Vec<ProviderRecord> {
        self.zones
            .lock()
            .unwrap()
            .get(zone)
            .map(|z| z.records.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ZoneClient for MockZoneClient {
    async fn fetch_zone(&self, zone: &str) -> Result<FetchedZone> {
        self.fetch_call_count.fetch_add(1, Ordering::SeqCst);
        self.zones
            .lock()
            .unwrap()
            .get(zone)
            .cloned()
            .ok_or_else(|| Error::lookup(format!("Zone {} not found", zone)))
    }

    async fn update_zone(&self, update: &ZoneUpdate) -> Result<ZoneUpdateResponse> {
        self.update_call_count.fetch_add(1, Ordering::SeqCst);
        self.updates.lock().unwrap().push(update.clone());

        let zone_name = update.zone_config.name().to_string();
        if self.unreachable.lock().unwrap().contains(&zone_name) {
            return Err(Error::http("connection refused"));
        }
        if let Some(errors) = self.rejecting.lock().unwrap().get(&zone_name) {
            return Ok(ZoneUpdateResponse {
                errors: errors.clone(),
            });
        }

        let mut zones = self.zones.lock().unwrap();
        let zone = zones
            .get_mut(&zone_name)
            .ok_or_else(|| Error::lookup(format!("Zone {} not found", zone_name)))?;

        let deleted: Vec<&str> = update
            .records_to_delete
            .iter()
            .filter_map(|r| r.id.as_deref())
            .collect();
        zone.records
            .retain(|r| !r.id.as_deref().is_some_and(|id| deleted.contains(&id)));

        for modified in &update.records_to_modify {
            if let Some(slot) = zone.records.iter_mut().find(|r| r.id == modified.id) {
                *slot = modified.clone();
            }
        }

        for added in &update.records_to_add {
            let mut record = added.clone();
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            record.id = Some(format!("r{}", id));
            zone.records.push(record);
        }

        Ok(ZoneUpdateResponse::default())
    }

    fn capabilities(&self) -> ProviderCapabilities {
        self.capabilities
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Capabilities matching the hosting.de authority
pub fn hostingde_capabilities() -> ProviderCapabilities {
    ProviderCapabilities {
        txt_multi: false,
        ..ProviderCapabilities::all()
    }
}

/// Provider-native record fixture
pub fn provider_record(
    id: &str,
    name: &str,
    kind: &str,
    content: &str,
    priority: Option<u16>,
) -> ProviderRecord {
    ProviderRecord {
        id: Some(id.to_string()),
        name: name.to_string(),
        kind: kind.to_string(),
        content: content.to_string(),
        ttl: 300,
        priority,
    }
}

pub fn a(name: &str, ip: &str) -> CanonicalRecord {
    CanonicalRecord::new(
        name,
        300,
        RecordData::A {
            target: ip.to_string(),
        },
    )
}

pub fn txt(name: &str, value: &str) -> CanonicalRecord {
    CanonicalRecord::new(
        name,
        300,
        RecordData::Txt {
            values: vec![value.to_string()],
        },
    )
}

pub fn mx(name: &str, preference: u16, target: &str) -> CanonicalRecord {
    CanonicalRecord::new(
        name,
        300,
        RecordData::Mx {
            preference,
            target: target.to_string(),
        },
    )
}
