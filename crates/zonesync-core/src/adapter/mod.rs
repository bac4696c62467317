//! Canonical/provider record adapter
//!
//! Stateless bidirectional mapping between [`CanonicalRecord`] and
//! [`ProviderRecord`]. The provider packs kind-specific sub-fields into one
//! space-separated `content` string and reuses `priority` for MX and SRV:
//!
//! | Kind               | content                | priority   |
//! |--------------------|------------------------|------------|
//! | SRV                | `weight port target`   | priority   |
//! | CAA                | `flag tag "value"`     | -          |
//! | MX                 | `target`               | preference |
//! | NS / CNAME / ALIAS | `target`               | -          |
//! | everything else    | target verbatim        | -          |
//!
//! Domain-name targets travel without their trailing dot; [`decode`] adds it
//! back and [`encode`] strips it.

use crate::error::{Error, Result};
use crate::record::{CanonicalRecord, ProviderHandle, ProviderRecord, RecordData, RecordKind};

/// Encode a canonical record into the provider's shape
///
/// `existing` carries the remote identifier on the modify/delete path and
/// is `None` on the create path.
///
/// # Errors
///
/// A TXT record with anything other than exactly one value cannot be
/// represented in a single `content` string.
pub fn encode(record: &CanonicalRecord, existing: Option<&ProviderHandle>) -> Result<ProviderRecord> {
    let (content, priority) = match &record.data {
        RecordData::Srv {
            priority,
            weight,
            port,
            target,
        } => (
            format!("{} {} {}", weight, port, strip_fqdn(target)),
            Some(*priority),
        ),
        RecordData::Caa { flag, tag, target } => (format!("{} {} \"{}\"", flag, tag, target), None),
        RecordData::Mx { preference, target } => (strip_fqdn(target).to_string(), Some(*preference)),
        RecordData::Ns { target } | RecordData::Cname { target } | RecordData::Alias { target } => {
            (strip_fqdn(target).to_string(), None)
        }
        RecordData::Txt { values } => (encode_txt(record, values)?, None),
        RecordData::A { target }
        | RecordData::Aaaa { target }
        | RecordData::Tlsa { target }
        | RecordData::Sshfp { target }
        | RecordData::Ptr { target }
        | RecordData::Soa { target } => (target.clone(), None),
    };

    Ok(ProviderRecord {
        id: existing.map(|handle| handle.id().to_string()),
        name: record.name.clone(),
        kind: record.kind().as_str().to_string(),
        content,
        ttl: record.ttl,
        priority,
    })
}

/// Decode a provider record fetched for `domain` into canonical form
///
/// The returned record carries a [`ProviderHandle`] whenever the provider
/// reported a non-empty identifier.
///
/// # Errors
///
/// - `Config` when the provider reports a kind outside [`RecordKind`]
/// - `Conversion` when the record lies outside `domain`, when the content
///   does not split into the expected number of fields for its kind, when a
///   numeric sub-field does not parse, or when MX/SRV lack a priority
pub fn decode(domain: &str, record: &ProviderRecord) -> Result<CanonicalRecord> {
    let kind: RecordKind = record.kind.parse()?;
    let label = format!("{} {}", record.name, record.kind);

    if !in_zone(&record.name, domain) {
        return Err(Error::conversion(
            label,
            format!("name is outside zone {}", domain),
        ));
    }

    let data = match kind {
        RecordKind::Srv => {
            let fields = split_fields(&label, &record.content, 3, false)?;
            RecordData::Srv {
                priority: required_priority(&label, record)?,
                weight: parse_field(&label, "weight", fields[0])?,
                port: parse_field(&label, "port", fields[1])?,
                target: to_fqdn(fields[2]),
            }
        }
        RecordKind::Caa => {
            let fields = split_fields(&label, &record.content, 3, true)?;
            RecordData::Caa {
                flag: parse_field(&label, "flag", fields[0])?,
                tag: fields[1].to_string(),
                target: unquote(fields[2]).to_string(),
            }
        }
        RecordKind::Mx => RecordData::Mx {
            preference: required_priority(&label, record)?,
            target: to_fqdn(&record.content),
        },
        RecordKind::Ns => RecordData::Ns {
            target: to_fqdn(&record.content),
        },
        RecordKind::Cname => RecordData::Cname {
            target: to_fqdn(&record.content),
        },
        RecordKind::Alias => RecordData::Alias {
            target: to_fqdn(&record.content),
        },
        RecordKind::Txt => RecordData::Txt {
            values: vec![record.content.clone()],
        },
        RecordKind::A => RecordData::A {
            target: record.content.clone(),
        },
        RecordKind::Aaaa => RecordData::Aaaa {
            target: record.content.clone(),
        },
        RecordKind::Tlsa => RecordData::Tlsa {
            target: record.content.clone(),
        },
        RecordKind::Sshfp => RecordData::Sshfp {
            target: record.content.clone(),
        },
        RecordKind::Ptr => RecordData::Ptr {
            target: record.content.clone(),
        },
        RecordKind::Soa => RecordData::Soa {
            target: record.content.clone(),
        },
    };

    let mut canonical = CanonicalRecord::new(record.name.clone(), record.ttl, data);
    if let Some(id) = record.id.as_deref().filter(|id| !id.is_empty()) {
        canonical = canonical.with_handle(ProviderHandle::new(id));
    }

    Ok(canonical)
}

/// Append the trailing dot to a domain-name target
pub fn to_fqdn(target: &str) -> String {
    if target.is_empty() || target.ends_with('.') {
        target.to_string()
    } else {
        format!("{}.", target)
    }
}

/// Strip the trailing dot from a domain-name target
///
/// The root name `.` is left alone.
pub fn strip_fqdn(target: &str) -> &str {
    if target.len() > 1 {
        target.strip_suffix('.').unwrap_or(target)
    } else {
        target
    }
}

fn encode_txt(record: &CanonicalRecord, values: &[String]) -> Result<String> {
    match values {
        [value] => Ok(value.clone()),
        [] => Err(Error::conversion(
            format!("{} TXT", record.name),
            "TXT record has no value",
        )),
        _ => Err(Error::conversion(
            format!("{} TXT", record.name),
            format!(
                "provider stores a single TXT string, record has {} values",
                values.len()
            ),
        )),
    }
}

/// Strip one surrounding pair of double quotes, if present
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

fn in_zone(name: &str, domain: &str) -> bool {
    let name = strip_fqdn(name).to_ascii_lowercase();
    let domain = strip_fqdn(domain).to_ascii_lowercase();
    name == domain || name.ends_with(&format!(".{}", domain))
}

/// Split content into exactly `expected` space-separated fields
///
/// With `rest_in_last` the last field absorbs any remaining spaces (a
/// quoted CAA value may contain them).
fn split_fields<'a>(
    label: &str,
    content: &'a str,
    expected: usize,
    rest_in_last: bool,
) -> Result<Vec<&'a str>> {
    let fields: Vec<&str> = if rest_in_last {
        content.splitn(expected, ' ').collect()
    } else {
        content.split(' ').collect()
    };
    if fields.len() != expected || fields.iter().any(|f| f.is_empty()) {
        return Err(Error::conversion(
            label,
            format!(
                "content {:?} has {} field(s), expected {}",
                content,
                content.split(' ').filter(|f| !f.is_empty()).count(),
                expected
            ),
        ));
    }
    Ok(fields)
}

fn parse_field<T: std::str::FromStr>(label: &str, field: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::conversion(label, format!("invalid {} {:?}", field, raw)))
}

fn required_priority(label: &str, record: &ProviderRecord) -> Result<u16> {
    record
        .priority
        .ok_or_else(|| Error::conversion(label, "missing priority"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(kind: &str, content: &str, priority: Option<u16>) -> ProviderRecord {
        ProviderRecord {
            id: Some("rec-1".to_string()),
            name: "example.com".to_string(),
            kind: kind.to_string(),
            content: content.to_string(),
            ttl: 3600,
            priority,
        }
    }

    #[test]
    fn test_mx_create_strips_trailing_dot() {
        let record = CanonicalRecord::new(
            "example.com",
            300,
            RecordData::Mx {
                preference: 10,
                target: "mail.example.com.".to_string(),
            },
        );

        let encoded = encode(&record, None).unwrap();

        assert_eq!(encoded.id, None);
        assert_eq!(encoded.kind, "MX");
        assert_eq!(encoded.priority, Some(10));
        assert_eq!(encoded.content, "mail.example.com");
    }

    #[test]
    fn test_encode_reattaches_identifier() {
        let record = CanonicalRecord::new(
            "www.example.com",
            300,
            RecordData::A {
                target: "192.0.2.1".to_string(),
            },
        );

        let encoded = encode(&record, Some(&ProviderHandle::new("abc123"))).unwrap();
        assert_eq!(encoded.id.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_srv_decode() {
        let decoded = decode("example.com", &provider("SRV", "5 5060 sip.example.com", Some(10))).unwrap();

        assert_eq!(
            decoded.data,
            RecordData::Srv {
                priority: 10,
                weight: 5,
                port: 5060,
                target: "sip.example.com.".to_string(),
            }
        );
        assert_eq!(decoded.remote_id(), Some("rec-1"));
    }

    #[test]
    fn test_srv_with_two_fields_is_rejected() {
        let err = decode("example.com", &provider("SRV", "5060 sip.example.com", Some(10))).unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }), "got {:?}", err);
    }

    #[test]
    fn test_srv_with_non_numeric_port_is_rejected() {
        let err = decode("example.com", &provider("SRV", "5 sip 5060", Some(10))).unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
    }

    #[test]
    fn test_srv_with_extra_fields_is_rejected() {
        let err = decode("example.com", &provider("SRV", "5 5060 sip.example.com extra", Some(10))).unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
    }

    #[test]
    fn test_mx_without_priority_is_rejected() {
        let err = decode("example.com", &provider("MX", "mail.example.com", None)).unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
    }

    #[test]
    fn test_caa_value_may_contain_spaces() {
        let decoded = decode(
            "example.com",
            &provider("CAA", "0 iodef \"mailto:security team@example.com\"", None),
        )
        .unwrap();

        assert_eq!(
            decoded.data,
            RecordData::Caa {
                flag: 0,
                tag: "iodef".to_string(),
                target: "mailto:security team@example.com".to_string(),
            }
        );
    }

    #[test]
    fn test_caa_value_keeps_inner_quotes() {
        let record = CanonicalRecord::new(
            "example.com",
            300,
            RecordData::Caa {
                flag: 0,
                tag: "issue".to_string(),
                target: "ca.example.net; note=\"x\"".to_string(),
            },
        );

        let encoded = encode(&record, None).unwrap();
        let decoded = decode("example.com", &encoded).unwrap();

        assert_eq!(decoded.data, record.data);
        assert_eq!(encode(&decoded, None).unwrap().content, encoded.content);
    }

    #[test]
    fn test_caa_missing_tag_is_rejected() {
        let err = decode("example.com", &provider("CAA", "0 letsencrypt.org", None)).unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
    }

    #[test]
    fn test_unknown_kind_is_a_config_error() {
        let err = decode("example.com", &provider("NAPTR", "whatever", None)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_record_outside_zone_is_rejected() {
        let mut record = provider("A", "192.0.2.1", None);
        record.name = "www.example.org".to_string();
        assert!(decode("example.com", &record).is_err());

        record.name = "badexample.com".to_string();
        assert!(decode("example.com", &record).is_err());

        record.name = "www.EXAMPLE.com".to_string();
        assert!(decode("example.com", &record).is_ok());
    }

    #[test]
    fn test_empty_identifier_yields_no_handle() {
        let mut record = provider("A", "192.0.2.1", None);
        record.id = Some(String::new());

        let decoded = decode("example.com", &record).unwrap();
        assert!(decoded.handle.is_none());
    }

    #[test]
    fn test_multi_value_txt_cannot_be_encoded() {
        let record = CanonicalRecord::new(
            "example.com",
            300,
            RecordData::Txt {
                values: vec!["a".to_string(), "b".to_string()],
            },
        );
        assert!(matches!(encode(&record, None), Err(Error::Conversion { .. })));
    }

    #[test]
    fn test_round_trip_for_every_kind() {
        let samples = [
            provider("A", "192.0.2.1", None),
            provider("AAAA", "2001:db8::1", None),
            provider("NS", "ns1.example.net", None),
            provider("CNAME", "target.example.net", None),
            provider("ALIAS", "lb.example.net", None),
            provider("MX", "mail.example.com", Some(10)),
            provider("SRV", "5 5060 sip.example.com", Some(20)),
            provider("CAA", "128 issue \"letsencrypt.org\"", None),
            provider("TLSA", "3 1 1 abcdef", None),
            provider("SSHFP", "1 1 123456789abcdef", None),
            provider("PTR", "host.example.com.", None),
            provider("TXT", "v=spf1 -all", None),
            provider("SOA", "ns1.example.net. hostmaster.example.com. 1 7200 3600 604800 300", None),
        ];

        for original in samples {
            let decoded = decode("example.com", &original).unwrap();
            let encoded = encode(&decoded, decoded.handle.as_ref()).unwrap();
            assert_eq!(encoded, original, "round trip failed for {}", original.kind);
        }
    }

    #[test]
    fn test_fqdn_helpers() {
        assert_eq!(to_fqdn("example.com"), "example.com.");
        assert_eq!(to_fqdn("example.com."), "example.com.");
        assert_eq!(to_fqdn(""), "");
        assert_eq!(strip_fqdn("example.com."), "example.com");
        assert_eq!(strip_fqdn("."), ".");
    }
}
