//! Tests for error types

use round_attendance::core::{AttendanceError, AttendanceStatus, StoreError};
use round_attendance::util::{MemberId, RoundId};

#[test]
fn test_already_queued_error() {
    let err = AttendanceError::AlreadyQueued;
    assert_eq!(format!("{}", err), "member already queued or attending");
}

#[test]
fn test_deadline_passed_error() {
    let err = AttendanceError::DeadlinePassed;
    assert_eq!(format!("{}", err), "rsvp deadline passed");
}

#[test]
fn test_invalid_transition_error() {
    let err = AttendanceError::InvalidTransition {
        from: "waitlist".to_string(),
        to: AttendanceStatus::Late,
        reason: "override requires a confirmed attendee".to_string(),
    };
    assert_eq!(
        format!("{}", err),
        "invalid transition from waitlist to late: override requires a confirmed attendee"
    );
}

#[test]
fn test_promotion_failed_error() {
    let err = AttendanceError::PromotionFailed {
        round: RoundId::from("r1"),
        member: MemberId::from("z"),
        attempts: 3,
    };
    assert_eq!(format!("{}", err), "promotion of z in r1 failed after 3 attempts");
}

#[test]
fn test_store_error_is_transparent() {
    let err: AttendanceError = StoreError::Backend("connection failed".to_string()).into();
    assert_eq!(format!("{}", err), "backend error: connection failed");
}

#[test]
fn test_transient_store_errors() {
    assert!(StoreError::VersionConflict { expected: 1, actual: 2 }.is_transient());
    assert!(StoreError::Backend("timeout".into()).is_transient());
    assert!(!StoreError::Missing.is_transient());
    assert!(!StoreError::DuplicateRound(RoundId::from("r")).is_transient());
}
