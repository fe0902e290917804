//! Per-round FIFO waitlist.
//!
//! Positions are monotonic identifiers, not dense ranks: removing a member never
//! renumbers the others. One orderer exists per round and it is only touched
//! from inside that round's critical section, so appends are linearized by the
//! lock that guards it.

use std::collections::{BTreeMap, HashMap};

use crate::core::{AttendanceError, AttendanceRecord, AttendanceStatus};
use crate::util::serde::{MemberId, RoundId};

/// Ordered waitlist for one round.
#[derive(Debug, Clone)]
pub struct WaitlistOrderer {
    round: RoundId,
    by_position: BTreeMap<u64, MemberId>,
    positions: HashMap<MemberId, u64>,
}

impl WaitlistOrderer {
    /// Create an empty waitlist.
    pub fn new(round: RoundId) -> Self {
        Self {
            round,
            by_position: BTreeMap::new(),
            positions: HashMap::new(),
        }
    }

    /// Rebuild from persisted records; only `waitlist` records with a position count.
    pub fn from_records<'a>(
        round: RoundId,
        records: impl IntoIterator<Item = &'a AttendanceRecord>,
    ) -> Self {
        let mut orderer = Self::new(round);
        for record in records {
            if record.status != AttendanceStatus::Waitlist {
                continue;
            }
            let Some(position) = record.waitlist_position else {
                tracing::warn!(
                    round = %orderer.round,
                    member = %record.member_id,
                    "waitlist record without position skipped"
                );
                continue;
            };
            orderer.by_position.insert(position, record.member_id.clone());
            orderer.positions.insert(record.member_id.clone(), position);
        }
        orderer
    }

    /// Round this waitlist belongs to.
    pub const fn round(&self) -> &RoundId {
        &self.round
    }

    /// Position the next append would receive.
    pub fn next_position(&self) -> u64 {
        self.by_position.keys().next_back().map_or(1, |last| last + 1)
    }

    /// Append a member at the tail and return the assigned position.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyQueued` if the member is already waiting.
    pub fn append(&mut self, member: MemberId) -> Result<u64, AttendanceError> {
        if self.positions.contains_key(&member) {
            return Err(AttendanceError::AlreadyQueued);
        }
        let position = self.next_position();
        self.by_position.insert(position, member.clone());
        self.positions.insert(member, position);
        Ok(position)
    }

    /// Lowest-position member, without removing it.
    pub fn peek_head(&self) -> Option<(u64, &MemberId)> {
        self.by_position.iter().next().map(|(pos, member)| (*pos, member))
    }

    /// Remove a specific member, returning the position they held.
    pub fn remove(&mut self, member: &MemberId) -> Option<u64> {
        let position = self.positions.remove(member)?;
        self.by_position.remove(&position);
        Some(position)
    }

    /// Position currently held by `member`.
    pub fn position_of(&self, member: &MemberId) -> Option<u64> {
        self.positions.get(member).copied()
    }

    /// Members in promotion order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &MemberId)> {
        self.by_position.iter().map(|(pos, member)| (*pos, member))
    }

    /// Number of waiting members.
    pub fn len(&self) -> usize {
        self.by_position.len()
    }

    /// Whether nobody is waiting.
    pub fn is_empty(&self) -> bool {
        self.by_position.is_empty()
    }
}
