//! Tests for the command surface

use round_attendance::core::{Admission, AttendanceStatus, Round, RoundAttendanceService};
use round_attendance::infra::InMemoryAttendanceStore;
use round_attendance::runtime::{command_actor, execute_command, list_rounds, AttendanceCommand, CommandResponse};
use round_attendance::util::{Actor, ManualClock};

fn service() -> RoundAttendanceService<InMemoryAttendanceStore, ManualClock> {
    let service = RoundAttendanceService::new(InMemoryAttendanceStore::new(), ManualClock::new(100));
    service.register_round(Round::new("r1", 1)).unwrap();
    service
}

fn command(json: &str) -> AttendanceCommand {
    serde_json::from_str(json).unwrap()
}

#[tokio::test]
async fn test_join_and_leave_commands() {
    let service = service();

    let joined = execute_command(&service, command(r#"{"action":"join","round_id":"r1","member_id":"a"}"#))
        .await
        .unwrap();
    let CommandResponse::Attendance(outcome) = joined else {
        panic!("unexpected response");
    };
    assert_eq!(outcome.admission, Some(Admission::Confirmed));

    let queued = execute_command(&service, command(r#"{"action":"join","round_id":"r1","member_id":"b"}"#))
        .await
        .unwrap();
    let CommandResponse::Attendance(outcome) = queued else {
        panic!("unexpected response");
    };
    assert_eq!(outcome.admission, Some(Admission::Waitlisted { position: 1 }));

    let left = execute_command(&service, command(r#"{"action":"leave","round_id":"r1","member_id":"a"}"#))
        .await
        .unwrap();
    let CommandResponse::Attendance(outcome) = left else {
        panic!("unexpected response");
    };
    assert_eq!(outcome.record.status, AttendanceStatus::NotAttending);
    assert_eq!(
        outcome.promotion.and_then(|p| p.promoted_member().map(|m| m.as_str().to_string())),
        Some("b".to_string())
    );
}

#[tokio::test]
async fn test_decline_if_full_command() {
    let service = service();
    execute_command(&service, command(r#"{"action":"join","round_id":"r1","member_id":"a"}"#))
        .await
        .unwrap();
    let response = execute_command(
        &service,
        command(r#"{"action":"join","round_id":"r1","member_id":"b","decline_if_full":true}"#),
    )
    .await
    .unwrap();
    let CommandResponse::Attendance(outcome) = response else {
        panic!("unexpected response");
    };
    assert_eq!(outcome.admission, Some(Admission::Declined));
    assert_eq!(outcome.record.status, AttendanceStatus::NotAttending);
}

#[tokio::test]
async fn test_update_capacity_command_promotes() {
    let service = service();
    for member in ["a", "b", "c"] {
        execute_command(
            &service,
            AttendanceCommand::Join {
                round_id: "r1".into(),
                member_id: member.into(),
                decline_if_full: false,
            },
        )
        .await
        .unwrap();
    }
    let response = execute_command(&service, command(r#"{"action":"update_capacity","round_id":"r1","capacity":3}"#))
        .await
        .unwrap();
    let CommandResponse::Promoted(promoted) = response else {
        panic!("unexpected response");
    };
    let members: Vec<_> = promoted.iter().map(|r| r.member_id.as_str()).collect();
    assert_eq!(members, vec!["b", "c"]);
}

#[test]
fn test_command_actor() {
    let set = command(r#"{"action":"set_status","round_id":"r1","member_id":"a","status":"no_show","actor":"admin"}"#);
    assert_eq!(command_actor(&set), Actor::Admin);
    let join = command(r#"{"action":"join","round_id":"r1","member_id":"a"}"#);
    assert_eq!(command_actor(&join), Actor::Member);
    let sweep = command(r#"{"action":"sweep_no_shows","round_id":"r1"}"#);
    assert_eq!(command_actor(&sweep), Actor::Admin);
}

#[test]
fn test_list_rounds() {
    let service = service();
    service.register_round(Round::new("r0", 0).with_rsvp_deadline(50)).unwrap();
    let listing = list_rounds(service.store()).unwrap();
    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0].id.as_str(), "r0");
    assert_eq!(listing[0].rsvp_deadline_ms, Some(50));
    assert_eq!(listing[1].capacity, 1);
}
