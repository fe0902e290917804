//! Round attendance façade.
//!
//! Every mutating call runs as one unit inside the round's critical section:
//! read the record and occupancy, decide, write. Notifications and audit events
//! produced by the unit are collected and flushed only after the section is
//! released.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::status::invalid;
use crate::core::{
    build_audit_event, AttendanceError, AttendanceNotice, AttendanceRecord, AttendanceStatus,
    AttendanceStore, AuditEvent, AuditSink, CapacityGate, GateDecision, NoticeKind, Notifier,
    PromotionCoordinator, PromotionOutcome, Round, RoundGuard, RoundLocks, RoundSection,
    StatusStateMachine,
};
use crate::util::clock::Clock;
use crate::util::serde::{Actor, MemberId, RoundId};

/// Options for a signup request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Record a decline instead of queueing when the round is full.
    #[serde(default)]
    pub decline_if_full: bool,
}

/// How a signup was admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "admission", rename_all = "snake_case")]
pub enum Admission {
    /// A seat was granted.
    Confirmed,
    /// The member was queued.
    Waitlisted {
        /// Assigned waitlist position.
        position: u64,
    },
    /// The round was full and the caller asked not to queue.
    Declined,
}

/// Result of a single-record operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceOutcome {
    /// The caller's record after the operation.
    pub record: AttendanceRecord,
    /// Admission decision, for operations that asked for a seat.
    pub admission: Option<Admission>,
    /// Promotion triggered by a released seat.
    pub promotion: Option<PromotionOutcome>,
}

/// Records changed by a no-show sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Round swept.
    pub round: RoundId,
    /// Records moved to `no_show`.
    pub marked: Vec<AttendanceRecord>,
    /// Waitlisted members moved into the seats the no-shows released.
    pub promoted: Vec<AttendanceRecord>,
}

/// One waiting member in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    /// Waiting member.
    pub member: MemberId,
    /// Their position.
    pub position: u64,
}

/// Read-side view of a round; may be stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    /// Round definition.
    pub round: Round,
    /// Seats currently held.
    pub occupied: u32,
    /// Free seats, `None` for unlimited rounds.
    pub open_slots: Option<u32>,
    /// Waiting members in promotion order.
    pub waitlist: Vec<WaitlistEntry>,
}

/// Notices and audit events produced inside a critical section.
#[derive(Default)]
struct Effects {
    notices: Vec<AttendanceNotice>,
    audit: Vec<AuditEvent>,
}

impl Effects {
    fn notify(&mut self, record: &AttendanceRecord, kind: NoticeKind) {
        self.notices.push(AttendanceNotice {
            round: record.round_id.clone(),
            member: record.member_id.clone(),
            kind,
            created_at_ms: record.updated_at_ms,
        });
    }

    fn audit(&mut self, record: &AttendanceRecord, actor: Actor, action: &str, detail: Option<String>) {
        self.audit.push(build_audit_event(
            &record.round_id,
            &record.member_id,
            actor,
            action,
            detail,
            record.updated_at_ms,
        ));
    }

    fn promoted(&mut self, outcome: &PromotionOutcome) {
        if let PromotionOutcome::Promoted(record) = outcome {
            self.notify(record, NoticeKind::Promoted);
            self.audit(record, Actor::System, "promote", None);
        }
    }
}

/// The single entry point for attendance changes.
///
/// Callers are expected to have validated membership before reaching this type.
pub struct RoundAttendanceService<S, C> {
    store: S,
    clock: C,
    locks: RoundLocks,
    promotion: PromotionCoordinator,
    notifier: Option<Arc<dyn Notifier>>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl<S, C> RoundAttendanceService<S, C>
where
    S: AttendanceStore,
    C: Clock,
{
    /// Create a service over a store and clock with default promotion retries.
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            locks: RoundLocks::new(),
            promotion: PromotionCoordinator::default(),
            notifier: None,
            audit: None,
        }
    }

    /// Replace the promotion coordinator.
    #[must_use]
    pub fn with_promotion(mut self, promotion: PromotionCoordinator) -> Self {
        self.promotion = promotion;
        self
    }

    /// Attach a notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Register a new round.
    ///
    /// # Errors
    ///
    /// Returns `Store(DuplicateRound)` when the id is taken.
    pub fn register_round(&self, round: Round) -> Result<(), AttendanceError> {
        tracing::info!(round = %round.id, capacity = round.capacity, "round registered");
        self.store.insert_round(round)?;
        Ok(())
    }

    /// Ask for a seat. The member is either confirmed or queued, never refused for capacity.
    ///
    /// # Errors
    ///
    /// - `DeadlinePassed` after the RSVP deadline.
    /// - `AlreadyQueued` when the member already holds a seat or a queue slot.
    /// - `NotFound` for an unknown round.
    pub async fn request_attendance(
        &self,
        round: &RoundId,
        member: &MemberId,
        options: RequestOptions,
    ) -> Result<AttendanceOutcome, AttendanceError> {
        let mut section = self.enter(round).await?;
        let mut fx = Effects::default();
        let result = self.request_locked(&mut section, &mut fx, round, member, options);
        drop(section);
        self.flush(fx).await;
        result
    }

    /// Give up a seat or queue slot. A released seat is offered to the waitlist head.
    ///
    /// # Errors
    ///
    /// - `DeadlinePassed` after the RSVP deadline.
    /// - `NotFound` when the member has no record.
    /// - `PromotionFailed` when the freed seat could not be handed on; the withdrawal stands.
    pub async fn withdraw(
        &self,
        round: &RoundId,
        member: &MemberId,
    ) -> Result<AttendanceOutcome, AttendanceError> {
        self.set_status(round, member, AttendanceStatus::NotAttending, Actor::Member)
            .await
    }

    /// Change a member's status.
    ///
    /// Asking for `attending` goes through admission, so a full round queues the
    /// member instead. Administrators may override `late`, `early_leave` and
    /// `no_show`; a no-show releases the seat to the waitlist.
    ///
    /// # Errors
    ///
    /// - `DeadlinePassed` for member requests after the RSVP deadline.
    /// - `Forbidden` for member requests of administrator overrides.
    /// - `InvalidTransition` when the transition table refuses the change.
    /// - `PromotionFailed` when a released seat could not be handed on.
    pub async fn set_status(
        &self,
        round: &RoundId,
        member: &MemberId,
        status: AttendanceStatus,
        actor: Actor,
    ) -> Result<AttendanceOutcome, AttendanceError> {
        let mut section = self.enter(round).await?;
        let mut fx = Effects::default();
        let result = self.set_status_locked(&mut section, &mut fx, round, member, status, actor);
        drop(section);
        self.flush(fx).await;
        result
    }

    /// Record a check-in for a confirmed attendee.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCheckInState` unless the member is `attending` and not yet checked in.
    pub async fn check_in(
        &self,
        round: &RoundId,
        member: &MemberId,
    ) -> Result<AttendanceOutcome, AttendanceError> {
        self.stamp(round, member, true).await
    }

    /// Record a check-out.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCheckInState` without a prior check-in.
    pub async fn check_out(
        &self,
        round: &RoundId,
        member: &MemberId,
    ) -> Result<AttendanceOutcome, AttendanceError> {
        self.stamp(round, member, false).await
    }

    /// Mark every `attending` record without a check-in as `no_show`, then
    /// hand the released seats to the waitlist in position order.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` before the round's end instant.
    /// - `PromotionFailed` when a released seat could not be handed on; the marks stand.
    pub async fn sweep_no_shows(&self, round: &RoundId) -> Result<SweepReport, AttendanceError> {
        let mut section = self.enter(round).await?;
        let mut fx = Effects::default();
        let result = self.sweep_locked(&mut section, &mut fx, round);
        drop(section);
        self.flush(fx).await;
        result
    }

    /// Change a round's capacity. Extra seats are filled from the waitlist;
    /// a reduction never demotes existing attendees.
    ///
    /// # Errors
    ///
    /// Returns `PromotionFailed` if filling the new seats stalls.
    pub async fn update_capacity(
        &self,
        round: &RoundId,
        capacity: u32,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let mut section = self.enter(round).await?;
        let mut fx = Effects::default();
        let result = self.update_capacity_locked(&mut section, &mut fx, round, capacity);
        drop(section);
        self.flush(fx).await;
        result
    }

    /// Promote into every open seat. Used as a retry sweep after `PromotionFailed`.
    ///
    /// # Errors
    ///
    /// Returns `PromotionFailed` if the head still cannot be written.
    pub async fn fill_open_slots(&self, round: &RoundId) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let mut section = self.enter(round).await?;
        let mut fx = Effects::default();
        let result = self
            .load_round(round)
            .and_then(|r| self.fill_locked(&mut section, &mut fx, &r));
        drop(section);
        self.flush(fx).await;
        result
    }

    /// Set the member's own note (member actor) or the administrator note (admin actor).
    ///
    /// # Errors
    ///
    /// - `NotFound` when the member has no record.
    /// - `Forbidden` for the system actor, which has no note of its own.
    pub async fn annotate(
        &self,
        round: &RoundId,
        member: &MemberId,
        actor: Actor,
        note: Option<String>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let section = self.enter(round).await?;
        let mut fx = Effects::default();
        let result = self.existing(round, member).and_then(|mut record| {
            match actor {
                Actor::Member => record.member_note = note,
                Actor::Admin => record.admin_note = note,
                Actor::System => {
                    return Err(AttendanceError::Forbidden("notes are written by members or administrators".into()));
                }
            }
            record.updated_at_ms = self.clock.now_ms();
            let stored = self.store.compare_and_swap(record)?;
            fx.audit(&stored, actor, "note", None);
            Ok(stored)
        });
        drop(section);
        self.flush(fx).await;
        result
    }

    /// Current record for a member, read without the round lock.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub fn record(
        &self,
        round: &RoundId,
        member: &MemberId,
    ) -> Result<Option<AttendanceRecord>, AttendanceError> {
        Ok(self.store.get(round, member)?)
    }

    /// Occupancy and waitlist of a round, read without the round lock.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown round.
    pub fn snapshot(&self, round: &RoundId) -> Result<RoundSnapshot, AttendanceError> {
        let definition = self.load_round(round)?;
        let records = self.store.list_round(round)?;
        let occupied = u32::try_from(records.iter().filter(|r| r.status.occupies_slot()).count())
            .unwrap_or(u32::MAX);
        let mut waitlist: Vec<WaitlistEntry> = records
            .iter()
            .filter(|r| r.status == AttendanceStatus::Waitlist)
            .filter_map(|r| {
                r.waitlist_position.map(|position| WaitlistEntry {
                    member: r.member_id.clone(),
                    position,
                })
            })
            .collect();
        waitlist.sort_by_key(|entry| entry.position);
        let open_slots =
            (definition.capacity > 0).then(|| definition.capacity.saturating_sub(occupied));
        Ok(RoundSnapshot {
            round: definition,
            occupied,
            open_slots,
            waitlist,
        })
    }

    async fn enter(&self, round: &RoundId) -> Result<RoundGuard<'_>, AttendanceError> {
        // Unknown rounds never get a section.
        self.load_round(round)?;
        Ok(self.locks.enter(round).await)
    }

    async fn flush(&self, fx: Effects) {
        if let Some(audit) = &self.audit {
            for event in fx.audit {
                audit.record(event);
            }
        }
        if let Some(notifier) = &self.notifier {
            for notice in fx.notices {
                let member = notice.member.clone();
                if let Err(err) = notifier.deliver(notice).await {
                    tracing::error!(member = %member, error = %err, "notice delivery failed");
                }
            }
        }
    }

    fn load_round(&self, round: &RoundId) -> Result<Round, AttendanceError> {
        self.store
            .get_round(round)?
            .ok_or_else(|| AttendanceError::NotFound(format!("round {round}")))
    }

    fn existing(&self, round: &RoundId, member: &MemberId) -> Result<AttendanceRecord, AttendanceError> {
        self.store
            .get(round, member)?
            .ok_or_else(|| AttendanceError::NotFound(format!("record for {member} in {round}")))
    }

    fn save(&self, record: AttendanceRecord, is_new: bool) -> Result<AttendanceRecord, AttendanceError> {
        let stored = if is_new {
            self.store.insert(record)?
        } else {
            self.store.compare_and_swap(record)?
        };
        Ok(stored)
    }

    fn request_locked(
        &self,
        section: &mut RoundSection,
        fx: &mut Effects,
        round_id: &RoundId,
        member: &MemberId,
        options: RequestOptions,
    ) -> Result<AttendanceOutcome, AttendanceError> {
        let round = self.load_round(round_id)?;
        let now = self.clock.now_ms();
        if round.deadline_passed(now) {
            tracing::warn!(round = %round_id, member = %member, "signup after rsvp deadline");
            return Err(AttendanceError::DeadlinePassed);
        }
        let existing = self.store.get(round_id, member)?;
        self.admit_locked(section, fx, &round, member, existing, Actor::Member, options, now)
    }

    #[allow(clippy::too_many_arguments)]
    fn admit_locked(
        &self,
        section: &mut RoundSection,
        fx: &mut Effects,
        round: &Round,
        member: &MemberId,
        existing: Option<AttendanceRecord>,
        actor: Actor,
        options: RequestOptions,
        now: u128,
    ) -> Result<AttendanceOutcome, AttendanceError> {
        if let Some(record) = &existing {
            if record.status.occupies_slot() || record.status == AttendanceStatus::Waitlist {
                tracing::debug!(round = %round.id, member = %member, status = %record.status, "duplicate signup");
                return Err(AttendanceError::AlreadyQueued);
            }
        }

        let is_new = existing.is_none();
        let mut next = existing.clone().unwrap_or_else(|| {
            AttendanceRecord::new(round.id.clone(), member.clone(), AttendanceStatus::NotAttending, now)
        });
        let occupied = self.store.occupied_count(&round.id)?;

        match CapacityGate::admit(&round.id, occupied, round.capacity) {
            GateDecision::Confirmed => {
                StatusStateMachine::validate(existing.as_ref(), AttendanceStatus::Attending, Actor::System)?;
                StatusStateMachine::apply(&mut next, AttendanceStatus::Attending, None, now);
                let stored = self.save(next, is_new)?;
                tracing::info!(round = %round.id, member = %member, occupied = occupied + 1, "signup confirmed");
                fx.notify(&stored, NoticeKind::Confirmed);
                fx.audit(&stored, actor, "confirm", None);
                Ok(AttendanceOutcome {
                    record: stored,
                    admission: Some(Admission::Confirmed),
                    promotion: None,
                })
            }
            GateDecision::Waitlisted if options.decline_if_full => {
                let record = if is_new {
                    let stored = self.save(next, true)?;
                    fx.audit(&stored, actor, "decline", Some("round full".into()));
                    stored
                } else {
                    next
                };
                tracing::info!(round = %round.id, member = %member, "round full, signup declined");
                fx.notify(&record, NoticeKind::Declined);
                Ok(AttendanceOutcome {
                    record,
                    admission: Some(Admission::Declined),
                    promotion: None,
                })
            }
            GateDecision::Waitlisted => {
                StatusStateMachine::validate(existing.as_ref(), AttendanceStatus::Waitlist, Actor::System)?;
                let waitlist = section.waitlist(&self.store, &round.id)?;
                let position = waitlist.append(member.clone())?;
                StatusStateMachine::apply(&mut next, AttendanceStatus::Waitlist, Some(position), now);
                let stored = match self.save(next, is_new) {
                    Ok(stored) => stored,
                    Err(err) => {
                        waitlist.remove(member);
                        return Err(err);
                    }
                };
                tracing::info!(round = %round.id, member = %member, position, "round full, member waitlisted");
                fx.notify(&stored, NoticeKind::Waitlisted { position });
                fx.audit(&stored, actor, "waitlist", Some(format!("position {position}")));
                Ok(AttendanceOutcome {
                    record: stored,
                    admission: Some(Admission::Waitlisted { position }),
                    promotion: None,
                })
            }
        }
    }

    fn set_status_locked(
        &self,
        section: &mut RoundSection,
        fx: &mut Effects,
        round_id: &RoundId,
        member: &MemberId,
        status: AttendanceStatus,
        actor: Actor,
    ) -> Result<AttendanceOutcome, AttendanceError> {
        let round = self.load_round(round_id)?;
        let now = self.clock.now_ms();
        if actor == Actor::Member && round.deadline_passed(now) {
            tracing::warn!(round = %round_id, member = %member, %status, "status change after rsvp deadline");
            return Err(AttendanceError::DeadlinePassed);
        }
        let existing = self.store.get(round_id, member)?;

        match status {
            AttendanceStatus::Attending => match existing {
                Some(record) if record.status.occupies_slot() && actor.is_privileged() => {
                    self.override_locked(section, fx, &round, record, status, actor, now)
                }
                other => self.admit_locked(section, fx, &round, member, other, actor, RequestOptions::default(), now),
            },
            AttendanceStatus::Waitlist => Err(invalid(
                existing.map(|r| r.status),
                status,
                "waitlist positions are assigned by admission",
            )),
            AttendanceStatus::NotAttending | AttendanceStatus::Maybe => {
                let record = existing.ok_or_else(|| {
                    AttendanceError::NotFound(format!("record for {member} in {round_id}"))
                })?;
                self.release_locked(section, fx, &round, record, status, actor, now)
            }
            AttendanceStatus::Late | AttendanceStatus::EarlyLeave | AttendanceStatus::NoShow => {
                let record = existing.ok_or_else(|| {
                    AttendanceError::NotFound(format!("record for {member} in {round_id}"))
                })?;
                self.override_locked(section, fx, &round, record, status, actor, now)
            }
        }
    }

    /// Move a record to a seatless status, handing a released seat to the waitlist.
    #[allow(clippy::too_many_arguments)]
    fn release_locked(
        &self,
        section: &mut RoundSection,
        fx: &mut Effects,
        round: &Round,
        record: AttendanceRecord,
        to: AttendanceStatus,
        actor: Actor,
        now: u128,
    ) -> Result<AttendanceOutcome, AttendanceError> {
        StatusStateMachine::validate(Some(&record), to, actor)?;
        let was = record.status;
        let mut next = record;
        StatusStateMachine::apply(&mut next, to, None, now);
        let stored = self.save(next, false)?;

        let kind = if to == AttendanceStatus::NotAttending {
            NoticeKind::Withdrawn
        } else {
            NoticeKind::StatusChanged { status: to }
        };
        fx.notify(&stored, kind);
        fx.audit(&stored, actor, if to == AttendanceStatus::NotAttending { "withdraw" } else { "status" }, Some(format!("{was} -> {to}")));
        tracing::info!(round = %round.id, member = %stored.member_id, from = %was, to = %to, "record released");

        let promotion = if was == AttendanceStatus::Waitlist {
            section.waitlist(&self.store, &round.id)?.remove(&stored.member_id);
            None
        } else if was.occupies_slot() {
            let waitlist = section.waitlist(&self.store, &round.id)?;
            let outcome = self.promotion.release_slot(&self.store, round, waitlist, now)?;
            fx.promoted(&outcome);
            Some(outcome)
        } else {
            None
        };

        Ok(AttendanceOutcome {
            record: stored,
            admission: None,
            promotion,
        })
    }

    /// Administrator overrides on an existing record.
    #[allow(clippy::too_many_arguments)]
    fn override_locked(
        &self,
        section: &mut RoundSection,
        fx: &mut Effects,
        round: &Round,
        record: AttendanceRecord,
        to: AttendanceStatus,
        actor: Actor,
        now: u128,
    ) -> Result<AttendanceOutcome, AttendanceError> {
        StatusStateMachine::validate(Some(&record), to, actor)?;
        let was = record.status;
        let mut next = record;
        StatusStateMachine::apply(&mut next, to, None, now);
        let stored = self.save(next, false)?;

        let action = if to == AttendanceStatus::NoShow { "no_show" } else { "status" };
        fx.notify(&stored, NoticeKind::StatusChanged { status: to });
        fx.audit(&stored, actor, action, Some(format!("{was} -> {to}")));
        tracing::info!(round = %round.id, member = %stored.member_id, from = %was, to = %to, "status overridden");

        let promotion = if was.occupies_slot() && !to.occupies_slot() {
            let waitlist = section.waitlist(&self.store, &round.id)?;
            let outcome = self.promotion.release_slot(&self.store, round, waitlist, now)?;
            fx.promoted(&outcome);
            Some(outcome)
        } else {
            None
        };

        Ok(AttendanceOutcome {
            record: stored,
            admission: None,
            promotion,
        })
    }

    async fn stamp(
        &self,
        round: &RoundId,
        member: &MemberId,
        check_in: bool,
    ) -> Result<AttendanceOutcome, AttendanceError> {
        let section = self.enter(round).await?;
        let mut fx = Effects::default();
        let result = self.existing(round, member).and_then(|mut record| {
            let now = self.clock.now_ms();
            if check_in {
                StatusStateMachine::check_in(&mut record, now)?;
            } else {
                StatusStateMachine::check_out(&mut record, now)?;
            }
            let stored = self.save(record, false)?;
            let (kind, action) = if check_in {
                (NoticeKind::CheckedIn, "check_in")
            } else {
                (NoticeKind::CheckedOut, "check_out")
            };
            tracing::info!(round = %round, member = %member, action, "presence recorded");
            fx.notify(&stored, kind);
            fx.audit(&stored, Actor::Admin, action, None);
            Ok(AttendanceOutcome {
                record: stored,
                admission: None,
                promotion: None,
            })
        });
        drop(section);
        self.flush(fx).await;
        result
    }

    fn sweep_locked(
        &self,
        section: &mut RoundSection,
        fx: &mut Effects,
        round_id: &RoundId,
    ) -> Result<SweepReport, AttendanceError> {
        let round = self.load_round(round_id)?;
        let now = self.clock.now_ms();
        if round.ends_at_ms.is_some_and(|end| now < end) {
            return Err(invalid(
                Some(AttendanceStatus::Attending),
                AttendanceStatus::NoShow,
                "round has not ended",
            ));
        }

        let mut marked = Vec::new();
        for record in self.store.list_round(round_id)? {
            if record.status != AttendanceStatus::Attending || record.checked_in_at_ms.is_some() {
                continue;
            }
            StatusStateMachine::validate(Some(&record), AttendanceStatus::NoShow, Actor::Admin)?;
            let mut next = record;
            StatusStateMachine::apply(&mut next, AttendanceStatus::NoShow, None, now);
            let stored = self.save(next, false)?;
            fx.notify(&stored, NoticeKind::StatusChanged { status: AttendanceStatus::NoShow });
            fx.audit(&stored, Actor::Admin, "no_show", Some("sweep".into()));
            marked.push(stored);
        }
        let promoted = if marked.is_empty() {
            Vec::new()
        } else {
            self.fill_locked(section, fx, &round)?
        };
        tracing::info!(round = %round_id, marked = marked.len(), promoted = promoted.len(), "no-show sweep complete");
        Ok(SweepReport {
            round: round_id.clone(),
            marked,
            promoted,
        })
    }

    fn update_capacity_locked(
        &self,
        section: &mut RoundSection,
        fx: &mut Effects,
        round_id: &RoundId,
        capacity: u32,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let mut round = self.load_round(round_id)?;
        let previous = round.capacity;
        round.capacity = capacity;
        self.store.update_round(round.clone())?;

        let occupied = self.store.occupied_count(round_id)?;
        if capacity > 0 && occupied > capacity {
            tracing::warn!(round = %round_id, occupied, capacity, "capacity reduced below current attendance; no one is demoted");
        }
        tracing::info!(round = %round_id, previous, capacity, "capacity updated");
        self.fill_locked(section, fx, &round)
    }

    fn fill_locked(
        &self,
        section: &mut RoundSection,
        fx: &mut Effects,
        round: &Round,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let now = self.clock.now_ms();
        let mut promoted = Vec::new();
        loop {
            let waitlist = section.waitlist(&self.store, &round.id)?;
            let outcome = self.promotion.release_slot(&self.store, round, waitlist, now)?;
            fx.promoted(&outcome);
            match outcome {
                PromotionOutcome::Promoted(record) => promoted.push(record),
                PromotionOutcome::NoPromotion => break,
            }
        }
        Ok(promoted)
    }
}
