//! Diff engine
//!
//! Classifies a normalized desired record set against a normalized existing
//! record set for one zone.
//!
//! ## Pairing policy
//!
//! Records are grouped by (name, kind); names compare case-insensitively.
//! Within a group:
//!
//! 1. desired and existing records with identical rdata are paired first
//! 2. the remaining records are paired positionally, in input order
//! 3. leftover desired records become creates, leftover existing records
//!    become deletes
//!
//! Each emitted entry gets the next slot number of its group, so the
//! `(name, kind, slot)` key is unique across the result. SOA records never
//! enter a group.

use crate::error::{Error, Result};
use crate::record::{CanonicalRecord, RecordKind};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::debug;

/// Identity of a diff entry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiffKey {
    /// Lowercased owner name
    pub name: String,
    /// Record kind
    pub kind: RecordKind,
    /// Disambiguator among records sharing name and kind
    pub slot: usize,
}

impl fmt::Display for DiffKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} #{}", self.name, self.kind, self.slot)
    }
}

/// Classification of a diff entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Change {
    /// Desired only
    Create,
    /// Existing only
    Delete,
    /// Both present, TTL or rdata differ
    Modify,
    /// Both present and equivalent
    Unchanged,
}

/// One desired/existing pairing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub key: DiffKey,
    pub change: Change,
    pub desired: Option<CanonicalRecord>,
    pub existing: Option<CanonicalRecord>,
}

impl DiffEntry {
    fn paired(key: DiffKey, desired: &CanonicalRecord, existing: &CanonicalRecord) -> Self {
        let change = if desired.ttl == existing.ttl && desired.rdata() == existing.rdata() {
            Change::Unchanged
        } else {
            Change::Modify
        };
        Self {
            key,
            change,
            desired: Some(desired.clone()),
            existing: Some(existing.clone()),
        }
    }

    fn create(key: DiffKey, desired: &CanonicalRecord) -> Self {
        Self {
            key,
            change: Change::Create,
            desired: Some(desired.clone()),
            existing: None,
        }
    }

    fn delete(key: DiffKey, existing: &CanonicalRecord) -> Self {
        Self {
            key,
            change: Change::Delete,
            desired: None,
            existing: Some(existing.clone()),
        }
    }
}

/// Diff result for one zone, in deterministic order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneDiff {
    entries: Vec<DiffEntry>,
}

impl ZoneDiff {
    /// All entries, grouped by (name, kind) in sorted order
    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    /// Consume the diff, returning its entries
    pub fn into_entries(self) -> Vec<DiffEntry> {
        self.entries
    }

    /// Entries with the given classification
    pub fn with_change(&self, change: Change) -> impl Iterator<Item = &DiffEntry> {
        self.entries.iter().filter(move |entry| entry.change == change)
    }

    /// Number of entries with the given classification
    pub fn count(&self, change: Change) -> usize {
        self.with_change(change).count()
    }

    /// Whether any create, delete or modify is needed
    pub fn has_changes(&self) -> bool {
        self.entries.iter().any(|entry| entry.change != Change::Unchanged)
    }
}

#[derive(Default)]
struct Group<'a> {
    desired: Vec<&'a CanonicalRecord>,
    existing: Vec<&'a CanonicalRecord>,
}

/// Diff a normalized desired set against a normalized existing set
///
/// # Errors
///
/// `Diff` when the input is contradictory: a record without a name, more
/// than one desired or existing record for a single-value kind (CNAME,
/// ALIAS) at one name, or two desired records with identical rdata at one
/// name.
pub fn diff(desired: &[CanonicalRecord], existing: &[CanonicalRecord]) -> Result<ZoneDiff> {
    let mut groups: BTreeMap<(String, RecordKind), Group<'_>> = BTreeMap::new();

    for record in desired.iter().filter(|r| r.kind() != RecordKind::Soa) {
        groups.entry(group_key(record)?).or_default().desired.push(record);
    }
    for record in existing.iter().filter(|r| r.kind() != RecordKind::Soa) {
        groups.entry(group_key(record)?).or_default().existing.push(record);
    }

    let mut entries = Vec::new();
    for ((name, kind), group) in groups {
        pair_group(name, kind, group, &mut entries)?;
    }

    let result = ZoneDiff { entries };
    debug!(
        "Diff computed: {} create, {} modify, {} delete, {} unchanged",
        result.count(Change::Create),
        result.count(Change::Modify),
        result.count(Change::Delete),
        result.count(Change::Unchanged)
    );
    Ok(result)
}

fn group_key(record: &CanonicalRecord) -> Result<(String, RecordKind)> {
    if record.name.trim().is_empty() {
        return Err(Error::diff(format!(
            "{} record has an empty name",
            record.kind()
        )));
    }
    Ok((record.name.to_ascii_lowercase(), record.kind()))
}

fn pair_group(
    name: String,
    kind: RecordKind,
    group: Group<'_>,
    entries: &mut Vec<DiffEntry>,
) -> Result<()> {
    if !kind.admits_multiple() {
        if group.desired.len() > 1 {
            return Err(Error::diff(format!(
                "{} desired {} records for {}, at most one is allowed",
                group.desired.len(),
                kind,
                name
            )));
        }
        if group.existing.len() > 1 {
            return Err(Error::diff(format!(
                "authority reports {} {} records for {}, at most one is allowed",
                group.existing.len(),
                kind,
                name
            )));
        }
    }

    let mut seen = HashSet::new();
    for record in &group.desired {
        if !seen.insert(record.rdata()) {
            return Err(Error::diff(format!(
                "duplicate desired record {} {} {}",
                kind,
                name,
                record.rdata()
            )));
        }
    }

    let mut slot = 0;
    let mut next_key = || {
        let key = DiffKey {
            name: name.clone(),
            kind,
            slot,
        };
        slot += 1;
        key
    };

    // Identical rdata first.
    let mut remaining = group.existing;
    let mut unmatched = Vec::new();
    for desired in group.desired {
        let rdata = desired.rdata();
        match remaining.iter().position(|existing| existing.rdata() == rdata) {
            Some(index) => {
                let existing = remaining.remove(index);
                entries.push(DiffEntry::paired(next_key(), desired, existing));
            }
            None => unmatched.push(desired),
        }
    }

    // Then positional.
    let mut remaining = remaining.into_iter();
    for desired in unmatched {
        match remaining.next() {
            Some(existing) => entries.push(DiffEntry::paired(next_key(), desired, existing)),
            None => entries.push(DiffEntry::create(next_key(), desired)),
        }
    }
    for existing in remaining {
        entries.push(DiffEntry::delete(next_key(), existing));
    }

    Ok(())
}
