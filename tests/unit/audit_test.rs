//! Tests for audit sink

use round_attendance::core::{build_audit_event, AuditSink, InMemoryAuditSink};
use round_attendance::util::{Actor, MemberId, RoundId};

#[test]
fn test_in_memory_audit_sink() {
    let sink = InMemoryAuditSink::new(10);
    let round = RoundId::from("r1");
    let member = MemberId::from("m1");

    let event = build_audit_event(&round, &member, Actor::Member, "confirm", Some("seat".to_string()), 42);
    sink.record(event);
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].round, round);
    assert_eq!(events[0].member, member);
    assert_eq!(events[0].action, "confirm");
    assert_eq!(events[0].created_at_ms, 42);
}

#[test]
fn test_audit_sink_overflow() {
    let sink = InMemoryAuditSink::new(2);
    let round = RoundId::from("r1");

    for member in ["a", "b", "c"] {
        sink.record(build_audit_event(&round, &MemberId::from(member), Actor::Member, "confirm", None, 1));
    }

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].member.as_str(), "b"); // First one popped
    assert_eq!(events[1].member.as_str(), "c");
}

#[test]
fn test_clones_share_buffer() {
    let sink = InMemoryAuditSink::new(8);
    let handle = sink.clone();
    let round = RoundId::from("r1");
    sink.record(build_audit_event(&round, &MemberId::from("a"), Actor::Admin, "no_show", None, 1));
    sink.record(build_audit_event(&round, &MemberId::from("b"), Actor::System, "promote", None, 2));

    assert_eq!(handle.events().len(), 2);
    let for_b = handle.events_for(&round, &MemberId::from("b"));
    assert_eq!(for_b.len(), 1);
    assert_eq!(for_b[0].actor, Actor::System);
}

#[test]
fn test_event_ids_are_unique() {
    let round = RoundId::from("r1");
    let member = MemberId::from("a");
    let first = build_audit_event(&round, &member, Actor::Member, "confirm", None, 1);
    let second = build_audit_event(&round, &member, Actor::Member, "confirm", None, 1);
    assert_ne!(first.event_id, second.event_id);
}
