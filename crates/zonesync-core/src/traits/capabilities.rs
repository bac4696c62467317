// # Provider Capabilities
//
// Not every authority can publish every record kind. A provider declares
// which optional kinds it manages, and desired records are checked against
// that declaration before any diffing happens.

use crate::error::{Error, Result};
use crate::record::{CanonicalRecord, RecordData, RecordKind};

/// Optional features a DNS authority supports
///
/// A, AAAA, NS, CNAME, MX, TXT and SOA are always supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProviderCapabilities {
    pub alias: bool,
    pub caa: bool,
    pub ptr: bool,
    pub srv: bool,
    pub sshfp: bool,
    pub tlsa: bool,
    /// TXT records made of several strings
    pub txt_multi: bool,
}

impl ProviderCapabilities {
    /// Every optional feature enabled
    pub fn all() -> Self {
        Self {
            alias: true,
            caa: true,
            ptr: true,
            srv: true,
            sshfp: true,
            tlsa: true,
            txt_multi: true,
        }
    }

    /// Whether records of `kind` can be managed at all
    pub fn supports_kind(&self, kind: RecordKind) -> bool {
        match kind {
            RecordKind::A
            | RecordKind::Aaaa
            | RecordKind::Ns
            | RecordKind::Cname
            | RecordKind::Mx
            | RecordKind::Txt
            | RecordKind::Soa => true,
            RecordKind::Alias => self.alias,
            RecordKind::Caa => self.caa,
            RecordKind::Ptr => self.ptr,
            RecordKind::Srv => self.srv,
            RecordKind::Sshfp => self.sshfp,
            RecordKind::Tlsa => self.tlsa,
        }
    }

    /// Check desired records against these capabilities
    ///
    /// # Errors
    ///
    /// `Config` naming the first record the provider cannot manage.
    pub fn check(&self, provider: &str, records: &[CanonicalRecord]) -> Result<()> {
        for record in records {
            if !self.supports_kind(record.kind()) {
                return Err(Error::config(format!(
                    "provider {} cannot manage {} records ({})",
                    provider,
                    record.kind(),
                    record.name
                )));
            }
            if let RecordData::Txt { values } = &record.data
                && values.len() > 1
                && !self.txt_multi
            {
                return Err(Error::config(format!(
                    "provider {} cannot manage multi-string TXT records ({})",
                    provider, record.name
                )));
            }
        }
        Ok(())
    }
}
