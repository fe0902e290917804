//! Audit sink implementations.
//!
//! Every committed mutation leaves one event. Events are recorded after the
//! round critical section has been released.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::util::serde::{Actor, MemberId, RoundId};

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Round the mutation applied to.
    pub round: RoundId,
    /// Member whose record changed.
    pub member: MemberId,
    /// Who asked for the change.
    pub actor: Actor,
    /// Action taken (confirm, waitlist, decline, promote, withdraw, status, check_in, check_out, no_show, note).
    pub action: String,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
///
/// Clones share the same bounded buffer.
#[derive(Clone)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<VecDeque<AuditEvent>>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events.min(1024)))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Events concerning one member of one round, oldest first.
    pub fn events_for(&self, round: &RoundId, member: &MemberId) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| &e.round == round && &e.member == member)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    round: &RoundId,
    member: &MemberId,
    actor: Actor,
    action: impl Into<String>,
    detail: Option<String>,
    created_at_ms: u128,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        round: round.clone(),
        member: member.clone(),
        actor,
        action: action.into(),
        created_at_ms,
        detail,
    }
}
