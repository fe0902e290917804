//! Capacity gate: decides whether a new signup gets a seat or a queue slot.

use serde::{Deserialize, Serialize};

use crate::util::serde::RoundId;

/// Outcome of a capacity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    /// A seat is free.
    Confirmed,
    /// The round is full; the request belongs on the waitlist.
    Waitlisted,
}

/// Pure admission decision. Callers must read `occupied` and act on the
/// decision inside the same round critical section.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapacityGate;

impl CapacityGate {
    /// Decide admission for one more attendee.
    ///
    /// `capacity == 0` means unlimited and always confirms.
    pub fn admit(round: &RoundId, occupied: u32, capacity: u32) -> GateDecision {
        let decision = if capacity == 0 || occupied < capacity {
            GateDecision::Confirmed
        } else {
            GateDecision::Waitlisted
        };
        tracing::trace!(round = %round, occupied, capacity, ?decision, "capacity gate");
        decision
    }
}
