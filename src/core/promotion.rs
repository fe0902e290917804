//! Promotion coordinator: fills a freed seat from the head of the waitlist.

use serde::{Deserialize, Serialize};

use crate::core::{
    AttendanceError, AttendanceRecord, AttendanceStatus, AttendanceStore, CapacityGate,
    GateDecision, Round, StatusStateMachine, WaitlistOrderer,
};
use crate::util::serde::{Actor, MemberId};

/// Default number of write attempts against the same waitlist head.
pub const DEFAULT_PROMOTION_ATTEMPTS: u32 = 3;

/// Result of releasing a seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionOutcome {
    /// The waitlist head now holds the seat; carries its updated record.
    Promoted(AttendanceRecord),
    /// Nobody was waiting, or the round is still full.
    NoPromotion,
}

impl PromotionOutcome {
    /// Member that received the seat, if any.
    pub const fn promoted_member(&self) -> Option<&MemberId> {
        match self {
            Self::Promoted(record) => Some(&record.member_id),
            Self::NoPromotion => None,
        }
    }
}

enum HeadAttempt {
    Promoted(AttendanceRecord),
    /// The orderer pointed at a record that is no longer waiting.
    Stale,
}

/// Moves waitlisted members into freed seats in position order.
///
/// Must be driven from inside the round critical section that released the seat.
#[derive(Debug, Clone, Copy)]
pub struct PromotionCoordinator {
    max_attempts: u32,
}

impl Default for PromotionCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_PROMOTION_ATTEMPTS)
    }
}

impl PromotionCoordinator {
    /// Create a coordinator retrying each head up to `max_attempts` times (at least once).
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Configured attempts per head.
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Promote the waitlist head into a free seat, if there is one.
    ///
    /// A failed write is retried against the same head; the next member is only
    /// considered when the head turns out to be stale (no longer waitlisted).
    /// Occupancy is re-read before every head, so a stale entry never lets a
    /// second member into the same seat.
    ///
    /// # Errors
    ///
    /// - `PromotionFailed` when every attempt for the head hit a transient store error.
    /// - `Store` for non-transient storage failures.
    pub fn release_slot<S: AttendanceStore + ?Sized>(
        &self,
        store: &S,
        round: &Round,
        waitlist: &mut WaitlistOrderer,
        now_ms: u128,
    ) -> Result<PromotionOutcome, AttendanceError> {
        loop {
            let occupied = store.occupied_count(&round.id)?;
            if CapacityGate::admit(&round.id, occupied, round.capacity) == GateDecision::Waitlisted {
                tracing::debug!(round = %round.id, occupied, capacity = round.capacity, "no free seat to promote into");
                return Ok(PromotionOutcome::NoPromotion);
            }

            let Some((position, head)) = waitlist.peek_head() else {
                tracing::debug!(round = %round.id, "waitlist empty, seat stays open");
                return Ok(PromotionOutcome::NoPromotion);
            };
            let head = head.clone();

            match self.promote_head(store, round, &head, now_ms)? {
                HeadAttempt::Promoted(record) => {
                    waitlist.remove(&head);
                    tracing::info!(round = %round.id, member = %head, position, "promoted from waitlist");
                    return Ok(PromotionOutcome::Promoted(record));
                }
                HeadAttempt::Stale => {
                    tracing::warn!(round = %round.id, member = %head, position, "dropping stale waitlist entry");
                    waitlist.remove(&head);
                }
            }
        }
    }

    fn promote_head<S: AttendanceStore + ?Sized>(
        &self,
        store: &S,
        round: &Round,
        head: &MemberId,
        now_ms: u128,
    ) -> Result<HeadAttempt, AttendanceError> {
        // Set once a write failed without telling us whether it landed.
        let mut unacknowledged = false;
        for attempt in 1..=self.max_attempts {
            let current = match store.get(&round.id, head) {
                Ok(Some(record)) => record,
                Ok(None) => return Ok(HeadAttempt::Stale),
                Err(err) if err.is_transient() => {
                    tracing::warn!(round = %round.id, member = %head, attempt, error = %err, "promotion read failed, retrying");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            if unacknowledged && current.status == AttendanceStatus::Attending {
                tracing::info!(round = %round.id, member = %head, attempt, "earlier promotion write had landed");
                return Ok(HeadAttempt::Promoted(current));
            }
            if current.status != AttendanceStatus::Waitlist {
                return Ok(HeadAttempt::Stale);
            }
            StatusStateMachine::validate(Some(&current), AttendanceStatus::Attending, Actor::System)?;

            let mut next = current;
            StatusStateMachine::apply(&mut next, AttendanceStatus::Attending, None, now_ms);
            match store.compare_and_swap(next) {
                Ok(stored) => return Ok(HeadAttempt::Promoted(stored)),
                Err(err) if err.is_transient() => {
                    unacknowledged = true;
                    tracing::warn!(round = %round.id, member = %head, attempt, error = %err, "promotion write failed, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        tracing::error!(
            round = %round.id,
            member = %head,
            attempts = self.max_attempts,
            "promotion attempts exhausted, seat left open"
        );
        Err(AttendanceError::PromotionFailed {
            round: round.id.clone(),
            member: head.clone(),
            attempts: self.max_attempts,
        })
    }
}
