//! Tests for notifier backends

use round_attendance::core::{AttendanceNotice, AttendanceStatus, NoticeKind, Notifier};
use round_attendance::infra::{ChannelNotifier, InMemoryNotifier};
use round_attendance::util::{MemberId, RoundId};

fn notice(member: &str, kind: NoticeKind, at: u128) -> AttendanceNotice {
    AttendanceNotice {
        round: RoundId::from("r1"),
        member: MemberId::from(member),
        kind,
        created_at_ms: at,
    }
}

#[tokio::test]
async fn test_in_memory_notifier_fetch() {
    let notifier = InMemoryNotifier::new();
    notifier.deliver(notice("a", NoticeKind::Confirmed, 10)).await.unwrap();
    notifier
        .deliver(notice("a", NoticeKind::StatusChanged { status: AttendanceStatus::Late }, 20))
        .await
        .unwrap();
    notifier.deliver(notice("b", NoticeKind::Waitlisted { position: 1 }, 30)).await.unwrap();

    let member = MemberId::from("a");
    assert_eq!(notifier.fetch(&member, None, 10).len(), 2);
    let since = notifier.fetch(&member, Some(15), 10);
    assert_eq!(since.len(), 1);
    assert_eq!(since[0].kind, NoticeKind::StatusChanged { status: AttendanceStatus::Late });
    assert_eq!(notifier.fetch(&member, None, 1).len(), 1);
    assert_eq!(notifier.len(), 3);
    assert!(notifier.fetch(&MemberId::from("nobody"), None, 10).is_empty());
}

#[tokio::test]
async fn test_channel_notifier_delivers_in_order() {
    let (notifier, rx) = ChannelNotifier::bounded(4);
    notifier.deliver(notice("a", NoticeKind::Withdrawn, 1)).await.unwrap();
    notifier.deliver(notice("b", NoticeKind::Promoted, 1)).await.unwrap();

    assert_eq!(rx.recv().unwrap().kind, NoticeKind::Withdrawn);
    assert_eq!(rx.recv().unwrap().member.as_str(), "b");
}

#[tokio::test]
async fn test_channel_notifier_reports_full_and_closed() {
    let (notifier, rx) = ChannelNotifier::bounded(1);
    notifier.deliver(notice("a", NoticeKind::Confirmed, 1)).await.unwrap();
    assert!(notifier.deliver(notice("b", NoticeKind::Confirmed, 1)).await.is_err());

    drop(rx);
    assert!(notifier.deliver(notice("c", NoticeKind::Confirmed, 1)).await.is_err());
}

#[test]
fn test_notice_kind_serialization() {
    let json = serde_json::to_string(&NoticeKind::Waitlisted { position: 3 }).unwrap();
    assert_eq!(json, r#"{"kind":"waitlisted","position":3}"#);
}
