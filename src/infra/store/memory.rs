//! In-memory attendance store keyed by (round, member).

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::core::{AttendanceRecord, AttendanceStore, Round, StoreError};
use crate::util::serde::{MemberId, RoundId};

/// Records of one round, keyed by member.
type RoundRecords = HashMap<MemberId, AttendanceRecord>;

/// Store backed by hash maps behind `parking_lot` locks.
///
/// Each call is atomic; the per-(round, member) key makes duplicate inserts
/// impossible and versions make concurrent updates detectable.
#[derive(Debug, Default)]
pub struct InMemoryAttendanceStore {
    rounds: RwLock<HashMap<RoundId, Round>>,
    records: RwLock<HashMap<RoundId, RoundRecords>>,
}

impl InMemoryAttendanceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all rounds.
    pub fn len(&self) -> usize {
        self.records.read().values().map(HashMap::len).sum()
    }

    /// Whether no record has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AttendanceStore for InMemoryAttendanceStore {
    fn insert_round(&self, round: Round) -> Result<(), StoreError> {
        let mut rounds = self.rounds.write();
        if rounds.contains_key(&round.id) {
            return Err(StoreError::DuplicateRound(round.id));
        }
        rounds.insert(round.id.clone(), round);
        Ok(())
    }

    fn update_round(&self, round: Round) -> Result<(), StoreError> {
        let mut rounds = self.rounds.write();
        let slot = rounds.get_mut(&round.id).ok_or(StoreError::Missing)?;
        *slot = round;
        Ok(())
    }

    fn get_round(&self, id: &RoundId) -> Result<Option<Round>, StoreError> {
        Ok(self.rounds.read().get(id).cloned())
    }

    fn list_rounds(&self) -> Result<Vec<Round>, StoreError> {
        let mut rounds: Vec<Round> = self.rounds.read().values().cloned().collect();
        rounds.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rounds)
    }

    fn get(&self, round: &RoundId, member: &MemberId) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .get(round)
            .and_then(|records| records.get(member))
            .cloned())
    }

    fn insert(&self, mut record: AttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        let mut records = self.records.write();
        let round = records.entry(record.round_id.clone()).or_default();
        if round.contains_key(&record.member_id) {
            return Err(StoreError::DuplicateRecord {
                round: record.round_id,
                member: record.member_id,
            });
        }
        record.version = 1;
        round.insert(record.member_id.clone(), record.clone());
        Ok(record)
    }

    fn compare_and_swap(&self, mut record: AttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        let mut records = self.records.write();
        let stored = records
            .get_mut(&record.round_id)
            .and_then(|round| round.get_mut(&record.member_id))
            .ok_or(StoreError::Missing)?;
        if stored.version != record.version {
            return Err(StoreError::VersionConflict {
                expected: record.version,
                actual: stored.version,
            });
        }
        record.version += 1;
        *stored = record.clone();
        Ok(record)
    }

    fn list_round(&self, round: &RoundId) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .get(round)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }
}
