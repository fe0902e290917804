//! Tests for utility functions

use round_attendance::util::{init_tracing, now_ms, Actor, Clock, ManualClock, MemberId, RoundId};

#[test]
fn test_ids_display_and_serialize() {
    let round = RoundId::from("morning");
    let member = MemberId::from(String::from("m-7"));
    assert_eq!(round.to_string(), "morning");
    assert_eq!(member.as_str(), "m-7");
    assert_eq!(serde_json::to_string(&round).unwrap(), "\"morning\"");
    let parsed: MemberId = serde_json::from_str("\"m-7\"").unwrap();
    assert_eq!(parsed, member);
}

#[test]
fn test_actor_privileges() {
    assert!(!Actor::Member.is_privileged());
    assert!(Actor::Admin.is_privileged());
    assert!(Actor::System.is_privileged());
    assert_eq!(serde_json::to_string(&Actor::Admin).unwrap(), "\"admin\"");
}

#[test]
fn test_manual_clock() {
    let clock = ManualClock::new(500);
    assert_eq!(clock.now_ms(), 500);
    clock.advance(1);
    assert_eq!(clock.now_ms(), 501);
}

#[test]
fn test_now_ms_is_monotonic_enough() {
    let a = now_ms();
    let b = now_ms();
    assert!(b >= a);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}
