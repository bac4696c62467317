//! Record set normalization
//!
//! Desired records come from hand-written configuration; existing records
//! come from `adapter::decode`. Both pass through [`normalize`] before
//! diffing so that equivalent records compare equal no matter which side
//! formatted them.
//!
//! Normalization never touches the name or the kind of a record.

use crate::adapter::to_fqdn;
use crate::record::{CanonicalRecord, RecordData};

/// Normalize every record of a set
///
/// Idempotent: `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    records.into_iter().map(normalize_record).collect()
}

/// Normalize a single record
///
/// - domain-name targets (NS, CNAME, ALIAS, MX, SRV) get their trailing dot
/// - TXT values are sorted and deduplicated
/// - CAA tags are lowercased
pub fn normalize_record(mut record: CanonicalRecord) -> CanonicalRecord {
    match &mut record.data {
        RecordData::Ns { target }
        | RecordData::Cname { target }
        | RecordData::Alias { target }
        | RecordData::Mx { target, .. }
        | RecordData::Srv { target, .. } => {
            *target = to_fqdn(target.trim());
        }
        RecordData::Txt { values } => {
            values.sort();
            values.dedup();
        }
        RecordData::Caa { tag, .. } => {
            tag.make_ascii_lowercase();
        }
        RecordData::A { .. }
        | RecordData::Aaaa { .. }
        | RecordData::Tlsa { .. }
        | RecordData::Sshfp { .. }
        | RecordData::Ptr { .. }
        | RecordData::Soa { .. } => {}
    }
    record
}
