//! Per-round critical sections.
//!
//! Every round gets its own async mutex; rounds never contend with each other.
//! The registry lock is only held long enough to find or create a round's entry.
//! An entry, with its cached waitlist, is evicted when the last holder leaves
//! and nobody is waiting, so the registry only tracks rounds in active use.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::core::{AttendanceStore, StoreError, WaitlistOrderer};
use crate::util::serde::RoundId;

/// State owned by one round's critical section.
#[derive(Debug, Default)]
pub struct RoundSection {
    waitlist: Option<WaitlistOrderer>,
}

impl RoundSection {
    /// The round's waitlist, rebuilt from storage on first use.
    ///
    /// # Errors
    ///
    /// Propagates storage failures from the initial load.
    pub fn waitlist<S: AttendanceStore + ?Sized>(
        &mut self,
        store: &S,
        round: &RoundId,
    ) -> Result<&mut WaitlistOrderer, StoreError> {
        if self.waitlist.is_none() {
            let records = store.list_round(round)?;
            let orderer = WaitlistOrderer::from_records(round.clone(), &records);
            tracing::debug!(round = %round, waiting = orderer.len(), "waitlist loaded");
            self.waitlist = Some(orderer);
        }
        Ok(self
            .waitlist
            .get_or_insert_with(|| WaitlistOrderer::new(round.clone())))
    }
}

/// Registry of round critical sections.
#[derive(Debug, Default)]
pub struct RoundLocks {
    sections: Mutex<HashMap<RoundId, Arc<AsyncMutex<RoundSection>>>>,
}

impl RoundLocks {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `round`.
    ///
    /// Dropping the returned future before it resolves leaves no trace, so a
    /// cancelled caller never takes effect.
    pub async fn enter(&self, round: &RoundId) -> RoundGuard<'_> {
        let section = {
            let mut sections = self.sections.lock();
            Arc::clone(sections.entry(round.clone()).or_default())
        };
        RoundGuard {
            locks: self,
            round: round.clone(),
            guard: Some(section.lock_owned().await),
        }
    }

    /// Number of rounds with a critical section currently held or awaited.
    pub fn len(&self) -> usize {
        self.sections.lock().len()
    }

    /// Whether no round is currently entered.
    pub fn is_empty(&self) -> bool {
        self.sections.lock().is_empty()
    }
}

/// Exclusive access to one round's section.
pub struct RoundGuard<'a> {
    locks: &'a RoundLocks,
    round: RoundId,
    guard: Option<OwnedMutexGuard<RoundSection>>,
}

impl Deref for RoundGuard<'_> {
    type Target = RoundSection;

    fn deref(&self) -> &RoundSection {
        self.guard.as_deref().unwrap_or_else(|| unreachable!("guard taken only on drop"))
    }
}

impl DerefMut for RoundGuard<'_> {
    fn deref_mut(&mut self) -> &mut RoundSection {
        self.guard.as_deref_mut().unwrap_or_else(|| unreachable!("guard taken only on drop"))
    }
}

impl Drop for RoundGuard<'_> {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        // Entries are cloned out under the registry lock, so the count is stable here:
        // one reference in the registry, one in this guard.
        let mut sections = self.locks.sections.lock();
        let idle = Arc::strong_count(OwnedMutexGuard::mutex(&guard)) == 2;
        drop(guard);
        if idle {
            sections.remove(&self.round);
            tracing::trace!(round = %self.round, "round section evicted");
        }
    }
}
