//! Error types for attendance and admission operations.

use thiserror::Error;

use crate::core::AttendanceStatus;
use crate::util::serde::{MemberId, RoundId};

/// Failures reported by an [`AttendanceStore`](crate::core::AttendanceStore) backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A record already exists for the (round, member) pair.
    #[error("duplicate attendance record for {member} in {round}")]
    DuplicateRecord {
        /// Round of the conflicting record.
        round: RoundId,
        /// Member of the conflicting record.
        member: MemberId,
    },
    /// A round with the same id is already registered.
    #[error("round {0} already registered")]
    DuplicateRound(RoundId),
    /// The record was written by someone else since it was read.
    #[error("version conflict: expected {expected}, found {actual}")]
    VersionConflict {
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },
    /// The record to update does not exist.
    #[error("record missing")]
    Missing,
    /// Backend-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Conflicts and backend hiccups may succeed on a fresh read; everything else will not.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::VersionConflict { .. } | Self::Backend(_))
    }
}

/// Errors produced by the admission engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttendanceError {
    /// The member already holds a waitlist or attending record for the round.
    #[error("member already queued or attending")]
    AlreadyQueued,
    /// The round's RSVP deadline has passed.
    #[error("rsvp deadline passed")]
    DeadlinePassed,
    /// Check-in or check-out precondition violated.
    #[error("invalid check-in state: {0}")]
    InvalidCheckInState(String),
    /// Status change not permitted from the current state.
    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        /// Current status, `none` when no record exists.
        from: String,
        /// Requested status.
        to: AttendanceStatus,
        /// Why the transition was refused.
        reason: String,
    },
    /// The caller is not allowed to request this transition.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Promoting the head of the waitlist kept failing.
    #[error("promotion of {member} in {round} failed after {attempts} attempts")]
    PromotionFailed {
        /// Round whose slot stayed open.
        round: RoundId,
        /// Waitlist head that could not be promoted.
        member: MemberId,
        /// Attempts made before giving up.
        attempts: u32,
    },
    /// No record or round for the given ids.
    #[error("not found: {0}")]
    NotFound(String),
    /// Storage failure outside of promotion retries.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
