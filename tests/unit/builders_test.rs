//! Tests for builder modules

use std::collections::HashMap;
use std::sync::Arc;

use round_attendance::builders::{build_audit_sink, build_service};
use round_attendance::config::{EngineConfig, RoundConfig};
use round_attendance::core::{
    build_audit_event, AttendanceStore, AuditSink, InMemoryAuditSink, RequestOptions, Round,
};
use round_attendance::infra::InMemoryAttendanceStore;
use round_attendance::util::{Actor, ManualClock, MemberId, RoundId};

fn config() -> EngineConfig {
    let mut rounds = HashMap::new();
    rounds.insert(
        "morning".to_string(),
        RoundConfig {
            capacity: 1,
            rsvp_deadline_ms: None,
            ends_at_ms: None,
        },
    );
    rounds.insert(
        "evening".to_string(),
        RoundConfig {
            capacity: 0,
            rsvp_deadline_ms: Some(5_000),
            ends_at_ms: Some(9_000),
        },
    );
    EngineConfig {
        rounds,
        ..EngineConfig::default()
    }
}

#[test]
fn test_build_service_registers_rounds() {
    let store = Arc::new(InMemoryAttendanceStore::new());
    let service = build_service(&config(), Arc::clone(&store), ManualClock::new(0), None).unwrap();

    let evening = store.get_round(&RoundId::from("evening")).unwrap().unwrap();
    assert_eq!(evening.capacity, 0);
    assert_eq!(evening.ends_at_ms, Some(9_000));
    assert_eq!(service.store().list_rounds().unwrap().len(), 2);
}

#[test]
fn test_build_service_keeps_existing_rounds() {
    let store = Arc::new(InMemoryAttendanceStore::new());
    store.insert_round(Round::new("morning", 7)).unwrap();

    build_service(&config(), Arc::clone(&store), ManualClock::new(0), None).unwrap();
    let morning = store.get_round(&RoundId::from("morning")).unwrap().unwrap();
    assert_eq!(morning.capacity, 7);
}

#[test]
fn test_build_service_rejects_invalid_config() {
    let cfg = EngineConfig {
        promotion_max_attempts: 0,
        ..EngineConfig::default()
    };
    let result = build_service(&cfg, InMemoryAttendanceStore::new(), ManualClock::new(0), None);
    assert!(result.is_err());
}

#[tokio::test]
async fn test_built_service_records_audit() {
    let audit = InMemoryAuditSink::new(16);
    let service = build_service(
        &config(),
        InMemoryAttendanceStore::new(),
        ManualClock::new(0),
        Some(Arc::new(audit.clone())),
    )
    .unwrap();

    service
        .request_attendance(&RoundId::from("morning"), &MemberId::from("a"), RequestOptions::default())
        .await
        .unwrap();
    let events = audit.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, "confirm");
}

#[test]
fn test_audit_sink_sized_from_config() {
    let cfg = EngineConfig::from_json_str(r#"{ "audit_buffer": 2 }"#).unwrap();
    let sink = build_audit_sink(&cfg);
    let round = RoundId::from("r1");
    for member in ["a", "b", "c"] {
        sink.record(build_audit_event(&round, &MemberId::from(member), Actor::System, "promote", None, 1));
    }

    let members: Vec<_> = sink.events().into_iter().map(|e| e.member.as_str().to_string()).collect();
    assert_eq!(members, vec!["b".to_string(), "c".to_string()]);
}

#[tokio::test]
async fn test_build_service_without_sink_uses_default_audit() {
    let service = build_service(&config(), InMemoryAttendanceStore::new(), ManualClock::new(0), None).unwrap();
    let outcome = service
        .request_attendance(&RoundId::from("morning"), &MemberId::from("a"), RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.record.version, 1);
}
