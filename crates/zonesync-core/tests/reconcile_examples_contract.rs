//! Contract Test: Reconciliation Semantics
//!
//! Verifies the behavior of decode → normalize → diff → correct on small
//! zones with known outcomes.
//!
//! Constraints verified:
//! - Domain-name targets compare equal whether or not the authority trimmed
//!   the trailing dot
//! - Content-identical records pair before positional ones
//! - Malformed composite content fails loudly instead of zero-filling
//! - A zone diffed against itself is empty
//! - SOA records are never touched

mod common;

use common::*;
use std::sync::Arc;
use zonesync_core::adapter::{decode, encode};
use zonesync_core::config::{EngineConfig, ZoneSpec};
use zonesync_core::diff::{Change, diff};
use zonesync_core::error::Error;
use zonesync_core::normalize::normalize;
use zonesync_core::record::{CanonicalRecord, RecordData};
use zonesync_core::{Reconciler, ZoneOutcome};

const ZONE: &str = "example.com";

fn dry_run() -> EngineConfig {
    EngineConfig {
        dry_run: true,
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn new_mx_record_is_created_with_priority_and_bare_target() {
    let client = MockZoneClient::new().with_zone(ZONE, Vec::new());
    let shared = MockZoneClient::sharing_counters_with(&client);
    let (reconciler, _events) = Reconciler::new(Arc::new(shared), EngineConfig::default()).unwrap();

    let zone = ZoneSpec::new(ZONE, vec![mx("@", 10, "mail.example.com.")]);
    let corrections = reconciler.plan_zone(&zone).await.unwrap();

    assert_eq!(corrections.len(), 1);
    let update = corrections[0].update();
    assert_eq!(update.records_to_add.len(), 1);
    assert!(update.records_to_modify.is_empty());
    assert!(update.records_to_delete.is_empty());

    let added = &update.records_to_add[0];
    assert_eq!(added.kind, "MX");
    assert_eq!(added.name, "example.com");
    assert_eq!(added.priority, Some(10));
    assert_eq!(added.content, "mail.example.com");
    assert_eq!(added.id, None);

    // Planning performs no writes
    assert_eq!(client.update_call_count(), 0);
}

#[test]
fn srv_with_trimmed_target_is_unchanged() {
    let desired = vec![CanonicalRecord::new(
        "_sip._tcp.example.com",
        300,
        RecordData::Srv {
            priority: 10,
            weight: 5,
            port: 5060,
            target: "sip.example.com.".to_string(),
        },
    )];
    let existing = vec![
        decode(
            ZONE,
            &provider_record("s1", "_sip._tcp.example.com", "SRV", "5 5060 sip.example.com", Some(10)),
        )
        .unwrap(),
    ];

    let result = diff(&normalize(desired), &normalize(existing)).unwrap();

    assert_eq!(result.entries().len(), 1);
    assert_eq!(result.count(Change::Unchanged), 1);
    assert!(!result.has_changes());
}

#[test]
fn content_matched_txt_is_kept_and_leftover_deleted() {
    let existing = vec![
        decode(ZONE, &provider_record("t1", ZONE, "TXT", "v=spf1 -all", None)).unwrap(),
        decode(ZONE, &provider_record("t2", ZONE, "TXT", "google-site-verification=abc", None))
            .unwrap(),
    ];
    let desired = vec![txt(ZONE, "google-site-verification=abc")];

    let result = diff(&normalize(desired), &normalize(existing)).unwrap();

    assert_eq!(result.count(Change::Unchanged), 1);
    assert_eq!(result.count(Change::Delete), 1);
    assert_eq!(result.count(Change::Create), 0);
    assert_eq!(result.count(Change::Modify), 0);

    let kept = result.with_change(Change::Unchanged).next().unwrap();
    assert_eq!(kept.existing.as_ref().unwrap().remote_id(), Some("t2"));
    let deleted = result.with_change(Change::Delete).next().unwrap();
    assert_eq!(deleted.existing.as_ref().unwrap().remote_id(), Some("t1"));
}

#[test]
fn srv_with_two_fields_fails_to_decode() {
    let record = provider_record("s1", "_sip._tcp.example.com", "SRV", "5 5060", Some(10));

    let err = decode(ZONE, &record).unwrap_err();
    assert!(matches!(err, Error::Conversion { .. }), "got {:?}", err);
}

#[test]
fn zone_diffed_against_itself_is_empty() {
    let records: Vec<CanonicalRecord> = [
        provider_record("1", ZONE, "A", "192.0.2.1", None),
        provider_record("2", "www.example.com", "CNAME", "example.com", None),
        provider_record("3", ZONE, "MX", "mail.example.com", Some(10)),
        provider_record("4", ZONE, "MX", "backup.example.com", Some(20)),
        provider_record("5", ZONE, "CAA", "0 issue \"letsencrypt.org\"", None),
        provider_record("6", ZONE, "TXT", "v=spf1 -all", None),
    ]
    .iter()
    .map(|r| decode(ZONE, r).unwrap())
    .collect();
    let records = normalize(records);

    let result = diff(&records, &records).unwrap();

    assert_eq!(result.entries().len(), records.len());
    assert!(!result.has_changes());
}

#[tokio::test]
async fn soa_is_never_modified_or_deleted() {
    let client = MockZoneClient::new().with_zone(
        ZONE,
        vec![
            provider_record(
                "soa",
                ZONE,
                "SOA",
                "ns1.example.com hostmaster.example.com 2024010101 86400 7200 3600000 3600",
                None,
            ),
            provider_record("a1", ZONE, "A", "192.0.2.1", None),
        ],
    );
    let (reconciler, _events) =
        Reconciler::new(Arc::new(MockZoneClient::sharing_counters_with(&client)), dry_run())
            .unwrap();

    // Desired state names neither record: only the A record goes
    let zone = ZoneSpec::new(ZONE, Vec::new());
    let corrections = reconciler.plan_zone(&zone).await.unwrap();

    assert_eq!(corrections.len(), 1);
    let update = corrections[0].update();
    assert_eq!(update.records_to_delete.len(), 1);
    assert_eq!(update.records_to_delete[0].kind, "A");
    assert!(update.records_to_modify.is_empty());
}

#[test]
fn entry_count_covers_every_key() {
    let desired = normalize(vec![
        a("www.example.com", "192.0.2.1"),
        a("www.example.com", "192.0.2.2"),
        a("www.example.com", "192.0.2.3"),
        txt(ZONE, "v=spf1 -all"),
    ]);
    let existing = normalize(vec![
        decode(ZONE, &provider_record("1", "www.example.com", "A", "192.0.2.9", None)).unwrap(),
        decode(ZONE, &provider_record("2", "ftp.example.com", "A", "192.0.2.5", None)).unwrap(),
    ]);

    let result = diff(&desired, &existing).unwrap();

    // www/A: max(3, 1) = 3, ftp/A: 1, apex/TXT: 1
    let total = result.count(Change::Create)
        + result.count(Change::Delete)
        + result.count(Change::Modify)
        + result.count(Change::Unchanged);
    assert_eq!(total, 5);
    assert_eq!(result.entries().len(), 5);
    assert_eq!(result.count(Change::Modify), 1);
    assert_eq!(result.count(Change::Create), 3);
    assert_eq!(result.count(Change::Delete), 1);
}

#[test]
fn encoded_delete_carries_existing_identifier() {
    let existing =
        decode(ZONE, &provider_record("r42", "old.example.com", "A", "192.0.2.1", None)).unwrap();
    let handle = existing.handle.clone().unwrap();

    let encoded = encode(&existing, Some(&handle)).unwrap();

    assert_eq!(encoded.id.as_deref(), Some("r42"));
    assert_eq!(encoded.content, "192.0.2.1");
}

#[tokio::test]
async fn applied_zone_converges() {
    let client = MockZoneClient::new().with_zone(
        ZONE,
        vec![
            provider_record("a1", "www.example.com", "A", "192.0.2.1", None),
            provider_record("t1", ZONE, "TXT", "stale", None),
        ],
    );
    let (reconciler, _events) = Reconciler::new(
        Arc::new(MockZoneClient::sharing_counters_with(&client)),
        EngineConfig::default(),
    )
    .unwrap();
    let zone = ZoneSpec::new(
        ZONE,
        vec![
            a("www", "192.0.2.10"),
            mx("@", 10, "mail.example.com."),
            txt("@", "v=spf1 -all"),
        ],
    );

    let first = reconciler.reconcile_zone(&zone).await;
    assert_eq!(first, ZoneOutcome::Applied { corrections: 1 });
    assert_eq!(client.update_call_count(), 1);

    let second = reconciler.reconcile_zone(&zone).await;
    assert_eq!(second, ZoneOutcome::InSync);
    assert_eq!(client.update_call_count(), 1);
    assert_eq!(client.records(ZONE).len(), 3);
}
