//! Correction builder
//!
//! Turns a zone's diff into [`Correction`]s: described, deferred remote
//! writes. A correction is a plain command value (the zone handle plus the
//! three encoded record lists) bound to the client that will carry it out,
//! so it can be printed, inspected or serialized without any network I/O.
//!
//! ## Operand rules
//!
//! - creates are encoded from the desired record, without an identifier
//! - modifies are encoded from the desired record, with the existing
//!   record's identifier
//! - deletes are encoded from the existing record, with its identifier
//!
//! Building a modify from the existing record would send the stale values
//! back to the authority and the configuration change would never land.

use crate::adapter::encode;
use crate::diff::{Change, DiffEntry};
use crate::error::{Error, Result};
use crate::record::{CanonicalRecord, ProviderHandle, RecordKind};
use crate::traits::{ZoneClient, ZoneHandle, ZoneUpdate};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A described, deferred remote write for one zone
#[derive(Clone)]
pub struct Correction {
    description: String,
    update: ZoneUpdate,
    client: Arc<dyn ZoneClient>,
    /// Shared by clones; set once the authority accepted the update
    applied: Arc<AtomicBool>,
}

impl Correction {
    /// Human-readable description, naming the zone and every change
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The batched update this correction will submit
    pub fn update(&self) -> &ZoneUpdate {
        &self.update
    }

    /// Name of the zone being updated
    pub fn zone(&self) -> &str {
        self.update.zone_config.name()
    }

    /// Whether the authority has already accepted this correction
    pub fn is_applied(&self) -> bool {
        self.applied.load(Ordering::SeqCst)
    }

    /// Perform the remote write
    ///
    /// Submits exactly one batched update; never retries. A correction is
    /// one-shot: once it succeeded, running it again (or any clone of it)
    /// returns `Ok(())` without contacting the authority. A failed run may
    /// be executed again.
    ///
    /// # Errors
    ///
    /// `Apply` on transport failure, and when the authority's response
    /// embeds application errors.
    pub async fn execute(&self) -> Result<()> {
        if self.applied.swap(true, Ordering::SeqCst) {
            debug!("Zone {} correction already applied, skipping", self.zone());
            return Ok(());
        }

        info!(
            "Updating zone {} via {} ({} change(s))",
            self.zone(),
            self.client.provider_name(),
            self.update.len()
        );

        let response = self
            .client
            .update_zone(&self.update)
            .await
            .map_err(|e| {
                self.applied.store(false, Ordering::SeqCst);
                Error::apply(format!("update of zone {} failed: {}", self.zone(), e))
            })?;

        if response.has_errors() {
            self.applied.store(false, Ordering::SeqCst);
            let messages: Vec<String> = response.errors.iter().map(ToString::to_string).collect();
            warn!(
                "Zone {} update rejected with {} error(s)",
                self.zone(),
                messages.len()
            );
            return Err(Error::apply(format!(
                "zone {} update rejected:\n{}",
                self.zone(),
                messages.join("\n")
            )));
        }

        debug!("Zone {} updated", self.zone());
        Ok(())
    }
}

impl fmt::Debug for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Correction")
            .field("description", &self.description)
            .field("update", &self.update)
            .field("provider", &self.client.provider_name())
            .field("applied", &self.is_applied())
            .finish()
    }
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

impl Serialize for Correction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Correction", 2)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("update", &self.update)?;
        state.end()
    }
}

/// Build the corrections for one zone
///
/// All creates, modifies and deletes are batched into a single correction.
/// Returns an empty list when nothing needs to change.
///
/// # Errors
///
/// - `Diff` when an entry lacks the record its classification requires, or
///   when a modify/delete target carries no remote identifier
/// - `Conversion` when a record cannot be encoded for the provider
pub fn build_corrections(
    client: Arc<dyn ZoneClient>,
    zone: &ZoneHandle,
    entries: &[DiffEntry],
) -> Result<Vec<Correction>> {
    let mut update = ZoneUpdate::new(zone.clone());
    let mut lines = Vec::new();

    for entry in entries.iter().filter(|e| e.key.kind != RecordKind::Soa) {
        match entry.change {
            Change::Unchanged => {}
            Change::Create => {
                let desired = required(entry, entry.desired.as_ref(), "desired")?;
                update.records_to_add.push(encode(desired, None)?);
                lines.push(format!("+ CREATE {}", desired));
            }
            Change::Modify => {
                let desired = required(entry, entry.desired.as_ref(), "desired")?;
                let existing = required(entry, entry.existing.as_ref(), "existing")?;
                let handle = remote_handle(entry, existing)?;
                update.records_to_modify.push(encode(desired, Some(handle))?);
                lines.push(format!(
                    "~ MODIFY {} {}: {} ttl={} -> {} ttl={}",
                    desired.kind(),
                    desired.name,
                    existing.rdata(),
                    existing.ttl,
                    desired.rdata(),
                    desired.ttl
                ));
            }
            Change::Delete => {
                let existing = required(entry, entry.existing.as_ref(), "existing")?;
                let handle = remote_handle(entry, existing)?;
                update.records_to_delete.push(encode(existing, Some(handle))?);
                lines.push(format!("- DELETE {}", existing));
            }
        }
    }

    if update.is_empty() {
        debug!("Zone {} needs no changes", zone.name());
        return Ok(Vec::new());
    }

    let mut description = format!(
        "Update zone {}: {} create, {} modify, {} delete",
        zone.name(),
        update.records_to_add.len(),
        update.records_to_modify.len(),
        update.records_to_delete.len()
    );
    for line in lines {
        description.push_str("\n  ");
        description.push_str(&line);
    }

    Ok(vec![Correction {
        description,
        update,
        client,
        applied: Arc::new(AtomicBool::new(false)),
    }])
}

fn required<'a>(
    entry: &DiffEntry,
    record: Option<&'a CanonicalRecord>,
    side: &str,
) -> Result<&'a CanonicalRecord> {
    record.ok_or_else(|| {
        Error::diff(format!(
            "{:?} entry {} has no {} record",
            entry.change, entry.key, side
        ))
    })
}

fn remote_handle<'a>(entry: &DiffEntry, existing: &'a CanonicalRecord) -> Result<&'a ProviderHandle> {
    existing
        .handle
        .as_ref()
        .filter(|handle| !handle.id().is_empty())
        .ok_or_else(|| {
            Error::diff(format!(
                "{:?} entry {} targets a record without a remote identifier",
                entry.change, entry.key
            ))
        })
}
