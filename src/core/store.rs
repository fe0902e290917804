//! Round and attendance record model plus the storage abstraction.
//!
//! The store is the single source of truth. It enforces one record per
//! (round, member) pair and exposes a versioned compare-and-swap so writers can
//! detect that a record moved underneath them.

use serde::{Deserialize, Serialize};

use crate::core::{AttendanceStatus, StoreError};
use crate::util::serde::{MemberId, RoundId};

/// A capacity-bounded timeslot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Unique round identifier.
    pub id: RoundId,
    /// Maximum confirmed attendees; zero means unlimited.
    pub capacity: u32,
    /// Instant after which member RSVP changes are refused.
    pub rsvp_deadline_ms: Option<u128>,
    /// Instant the round ends; no-show sweeps wait for it.
    pub ends_at_ms: Option<u128>,
}

impl Round {
    /// Create a round without deadline or end instant.
    pub fn new(id: impl Into<RoundId>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            capacity,
            rsvp_deadline_ms: None,
            ends_at_ms: None,
        }
    }

    /// Set the RSVP deadline.
    #[must_use]
    pub fn with_rsvp_deadline(mut self, deadline_ms: u128) -> Self {
        self.rsvp_deadline_ms = Some(deadline_ms);
        self
    }

    /// Set the end instant.
    #[must_use]
    pub fn with_end(mut self, ends_at_ms: u128) -> Self {
        self.ends_at_ms = Some(ends_at_ms);
        self
    }

    /// Whether the RSVP deadline has passed at `now_ms`.
    pub fn deadline_passed(&self, now_ms: u128) -> bool {
        self.rsvp_deadline_ms.is_some_and(|deadline| now_ms > deadline)
    }
}

/// Per-member state for a given round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Round the record belongs to.
    pub round_id: RoundId,
    /// Member the record belongs to.
    pub member_id: MemberId,
    /// Current status.
    pub status: AttendanceStatus,
    /// Arrival-order marker, present only while waitlisted.
    pub waitlist_position: Option<u64>,
    /// Check-in instant.
    pub checked_in_at_ms: Option<u128>,
    /// Check-out instant; only set after a check-in.
    pub checked_out_at_ms: Option<u128>,
    /// Free-form note from the member.
    pub member_note: Option<String>,
    /// Free-form note from an administrator.
    pub admin_note: Option<String>,
    /// Creation instant.
    pub created_at_ms: u128,
    /// Last modification instant.
    pub updated_at_ms: u128,
    /// Write counter, bumped by the store on every successful write.
    pub version: u64,
}

impl AttendanceRecord {
    /// Build an unsaved record.
    pub const fn new(
        round_id: RoundId,
        member_id: MemberId,
        status: AttendanceStatus,
        now_ms: u128,
    ) -> Self {
        Self {
            round_id,
            member_id,
            status,
            waitlist_position: None,
            checked_in_at_ms: None,
            checked_out_at_ms: None,
            member_note: None,
            admin_note: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            version: 0,
        }
    }
}

/// Abstraction for attendance storage backends.
///
/// Implementations must make each call atomic on its own. Sequencing several
/// calls into one admission decision is the job of the round critical section.
pub trait AttendanceStore: Send + Sync + 'static {
    /// Register a new round.
    fn insert_round(&self, round: Round) -> Result<(), StoreError>;
    /// Replace an existing round definition.
    fn update_round(&self, round: Round) -> Result<(), StoreError>;
    /// Look up a round.
    fn get_round(&self, id: &RoundId) -> Result<Option<Round>, StoreError>;
    /// List registered rounds.
    fn list_rounds(&self) -> Result<Vec<Round>, StoreError>;
    /// Look up the record for a (round, member) pair.
    fn get(&self, round: &RoundId, member: &MemberId) -> Result<Option<AttendanceRecord>, StoreError>;
    /// Create a record; fails with `DuplicateRecord` if the pair already exists.
    /// Returns the stored record with its assigned version.
    fn insert(&self, record: AttendanceRecord) -> Result<AttendanceRecord, StoreError>;
    /// Replace a record if its stored version still equals `record.version`.
    /// Returns the stored record with the bumped version.
    fn compare_and_swap(&self, record: AttendanceRecord) -> Result<AttendanceRecord, StoreError>;
    /// All records of a round, in no particular order.
    fn list_round(&self, round: &RoundId) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Number of records in the round currently holding a seat.
    fn occupied_count(&self, round: &RoundId) -> Result<u32, StoreError> {
        let records = self.list_round(round)?;
        let occupied = records.iter().filter(|r| r.status.occupies_slot()).count();
        u32::try_from(occupied).map_err(|_| StoreError::Backend("occupancy overflow".into()))
    }

    /// Number of records in the round with exactly `status`.
    fn count_status(&self, round: &RoundId, status: AttendanceStatus) -> Result<usize, StoreError> {
        Ok(self
            .list_round(round)?
            .iter()
            .filter(|r| r.status == status)
            .count())
    }
}

impl<S: AttendanceStore> AttendanceStore for std::sync::Arc<S> {
    fn insert_round(&self, round: Round) -> Result<(), StoreError> {
        (**self).insert_round(round)
    }

    fn update_round(&self, round: Round) -> Result<(), StoreError> {
        (**self).update_round(round)
    }

    fn get_round(&self, id: &RoundId) -> Result<Option<Round>, StoreError> {
        (**self).get_round(id)
    }

    fn list_rounds(&self) -> Result<Vec<Round>, StoreError> {
        (**self).list_rounds()
    }

    fn get(&self, round: &RoundId, member: &MemberId) -> Result<Option<AttendanceRecord>, StoreError> {
        (**self).get(round, member)
    }

    fn insert(&self, record: AttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        (**self).insert(record)
    }

    fn compare_and_swap(&self, record: AttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        (**self).compare_and_swap(record)
    }

    fn list_round(&self, round: &RoundId) -> Result<Vec<AttendanceRecord>, StoreError> {
        (**self).list_round(round)
    }

    fn occupied_count(&self, round: &RoundId) -> Result<u32, StoreError> {
        (**self).occupied_count(round)
    }
}
