//! Notification boundary.
//!
//! Delivery is an external concern. The service hands notices to a [`Notifier`]
//! only after the round critical section is released, so a slow channel never
//! holds up admission.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{AppResult, AttendanceStatus};
use crate::util::serde::{MemberId, RoundId};

/// What happened to the member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoticeKind {
    /// Signup confirmed with a seat.
    Confirmed,
    /// Signup queued.
    Waitlisted {
        /// Assigned waitlist position.
        position: u64,
    },
    /// Round was full and the member chose not to queue.
    Declined,
    /// Moved from the waitlist into a seat.
    Promoted,
    /// Seat or queue slot given up.
    Withdrawn,
    /// Any other status change, typically an administrator override.
    StatusChanged {
        /// New status.
        status: AttendanceStatus,
    },
    /// Check-in recorded.
    CheckedIn,
    /// Check-out recorded.
    CheckedOut,
}

/// A message for one member about one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceNotice {
    /// Round concerned.
    pub round: RoundId,
    /// Recipient.
    pub member: MemberId,
    /// Event.
    pub kind: NoticeKind,
    /// Instant the underlying change was committed.
    pub created_at_ms: u128,
}

/// Abstraction for notification backends.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notice.
    async fn deliver(&self, notice: AttendanceNotice) -> AppResult<()>;
}
