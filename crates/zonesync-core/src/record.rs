// # Record Model
//
// Two representations of a DNS record live side by side:
//
// - [`CanonicalRecord`]: provider-agnostic, one variant of [`RecordData`]
//   per record kind, with typed sub-fields (MX preference, SRV
//   priority/weight/port, CAA flag/tag, TXT values).
// - [`ProviderRecord`]: the remote authority's shape, with a single
//   composite `content` string and a shared numeric `priority`.
//
// The `adapter` module maps between them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default TTL for desired records that do not set one
pub const DEFAULT_TTL: u32 = 300;

/// Closed enumeration of supported record kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordKind {
    A,
    Aaaa,
    Ns,
    Cname,
    Alias,
    Mx,
    Srv,
    Caa,
    Tlsa,
    Sshfp,
    Ptr,
    Txt,
    Soa,
}

impl RecordKind {
    /// Every supported kind, in declaration order
    pub const ALL: [RecordKind; 13] = [
        RecordKind::A,
        RecordKind::Aaaa,
        RecordKind::Ns,
        RecordKind::Cname,
        RecordKind::Alias,
        RecordKind::Mx,
        RecordKind::Srv,
        RecordKind::Caa,
        RecordKind::Tlsa,
        RecordKind::Sshfp,
        RecordKind::Ptr,
        RecordKind::Txt,
        RecordKind::Soa,
    ];

    /// Wire name of the kind (e.g. "AAAA")
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::A => "A",
            RecordKind::Aaaa => "AAAA",
            RecordKind::Ns => "NS",
            RecordKind::Cname => "CNAME",
            RecordKind::Alias => "ALIAS",
            RecordKind::Mx => "MX",
            RecordKind::Srv => "SRV",
            RecordKind::Caa => "CAA",
            RecordKind::Tlsa => "TLSA",
            RecordKind::Sshfp => "SSHFP",
            RecordKind::Ptr => "PTR",
            RecordKind::Txt => "TXT",
            RecordKind::Soa => "SOA",
        }
    }

    /// Whether several records of this kind may share one name
    ///
    /// CNAME and ALIAS occupy a name exclusively; SOA exists once per zone.
    pub fn admits_multiple(&self) -> bool {
        !matches!(self, RecordKind::Cname | RecordKind::Alias | RecordKind::Soa)
    }

    /// Whether the record's target is itself a domain name
    pub fn has_domain_target(&self) -> bool {
        matches!(
            self,
            RecordKind::Ns | RecordKind::Cname | RecordKind::Alias | RecordKind::Mx | RecordKind::Srv
        )
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::Error::config(format!("Unsupported record kind: {}", s)))
    }
}

/// Kind-specific record payload
///
/// Domain-name targets are kept in FQDN form once normalized
/// (`mail.example.com.`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum RecordData {
    A { target: String },
    Aaaa { target: String },
    Ns { target: String },
    Cname { target: String },
    Alias { target: String },
    Mx { preference: u16, target: String },
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
    Caa {
        #[serde(default)]
        flag: u8,
        tag: String,
        target: String,
    },
    Tlsa { target: String },
    Sshfp { target: String },
    Ptr { target: String },
    Txt { values: Vec<String> },
    Soa { target: String },
}

impl RecordData {
    /// The kind of this payload
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordData::A { .. } => RecordKind::A,
            RecordData::Aaaa { .. } => RecordKind::Aaaa,
            RecordData::Ns { .. } => RecordKind::Ns,
            RecordData::Cname { .. } => RecordKind::Cname,
            RecordData::Alias { .. } => RecordKind::Alias,
            RecordData::Mx { .. } => RecordKind::Mx,
            RecordData::Srv { .. } => RecordKind::Srv,
            RecordData::Caa { .. } => RecordKind::Caa,
            RecordData::Tlsa { .. } => RecordKind::Tlsa,
            RecordData::Sshfp { .. } => RecordKind::Sshfp,
            RecordData::Ptr { .. } => RecordKind::Ptr,
            RecordData::Txt { .. } => RecordKind::Txt,
            RecordData::Soa { .. } => RecordKind::Soa,
        }
    }

    /// Canonical textual rdata, used for comparison and descriptions
    ///
    /// Two payloads are equivalent exactly when their rdata strings match.
    pub fn rdata(&self) -> String {
        match self {
            RecordData::Mx { preference, target } => format!("{} {}", preference, target),
            RecordData::Srv {
                priority,
                weight,
                port,
                target,
            } => format!("{} {} {} {}", priority, weight, port, target),
            RecordData::Caa { flag, tag, target } => format!("{} {} \"{}\"", flag, tag, target),
            RecordData::Txt { values } => values
                .iter()
                .map(|v| format!("\"{}\"", v.replace('"', "\\\"")))
                .collect::<Vec<_>>()
                .join(" "),
            RecordData::A { target }
            | RecordData::Aaaa { target }
            | RecordData::Ns { target }
            | RecordData::Cname { target }
            | RecordData::Alias { target }
            | RecordData::Tlsa { target }
            | RecordData::Sshfp { target }
            | RecordData::Ptr { target }
            | RecordData::Soa { target } => target.clone(),
        }
    }
}

/// Weak reference to the provider-native record a canonical record came from
///
/// Only `adapter::decode` produces these, and only when the provider
/// reported an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderHandle {
    id: String,
}

impl ProviderHandle {
    /// Create a handle for a remote identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// The remote-assigned identifier
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Provider-agnostic DNS record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Fully-qualified owner name, without trailing dot
    pub name: String,

    /// Time-to-live in seconds
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Kind-specific payload (serialized with a `type` tag)
    #[serde(flatten)]
    pub data: RecordData,

    /// Back-reference to the remote record; absent for desired records
    #[serde(skip)]
    pub handle: Option<ProviderHandle>,
}

impl CanonicalRecord {
    /// Create a record without a provider handle
    pub fn new(name: impl Into<String>, ttl: u32, data: RecordData) -> Self {
        Self {
            name: name.into(),
            ttl,
            data,
            handle: None,
        }
    }

    /// Attach a provider handle
    pub fn with_handle(mut self, handle: ProviderHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// The record kind
    pub fn kind(&self) -> RecordKind {
        self.data.kind()
    }

    /// Canonical textual rdata
    pub fn rdata(&self) -> String {
        self.data.rdata()
    }

    /// Remote identifier, when this record came from the authority
    pub fn remote_id(&self) -> Option<&str> {
        self.handle.as_ref().map(ProviderHandle::id)
    }
}

impl fmt::Display for CanonicalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} ttl={}", self.kind(), self.name, self.rdata(), self.ttl)
    }
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

/// Provider-native record as exchanged with the remote authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    /// Remote-assigned identifier (absent until created)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Owner name, fully qualified without trailing dot
    pub name: String,

    /// Record kind as the provider spells it
    #[serde(rename = "type")]
    pub kind: String,

    /// Composite content packing kind-specific sub-fields
    pub content: String,

    /// Time-to-live in seconds
    pub ttl: u32,

    /// MX preference or SRV priority
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
}
