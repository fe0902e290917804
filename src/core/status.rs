//! Attendance status lifecycle and transition rules.
//!
//! Statuses form a closed set; every change is validated against the table in
//! [`StatusStateMachine::validate`] before it can reach storage. Admission into
//! `attending` and `waitlist` is owned by the engine: members and administrators
//! ask for a seat and the capacity gate decides which of the two they get.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{AttendanceError, AttendanceRecord};
use crate::util::serde::Actor;

/// Attendance status of one member for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Confirmed seat.
    Attending,
    /// Queued for a seat.
    Waitlist,
    /// Undecided; holds no seat.
    Maybe,
    /// Declined or withdrawn.
    NotAttending,
    /// Arrived late; still holds the seat.
    Late,
    /// Checked in and left before the end; still holds the seat.
    EarlyLeave,
    /// Confirmed but never showed up.
    NoShow,
}

impl AttendanceStatus {
    /// All statuses, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Attending,
        Self::Waitlist,
        Self::Maybe,
        Self::NotAttending,
        Self::Late,
        Self::EarlyLeave,
        Self::NoShow,
    ];

    /// Returns the string representation used for persistence and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Attending => "attending",
            Self::Waitlist => "waitlist",
            Self::Maybe => "maybe",
            Self::NotAttending => "not_attending",
            Self::Late => "late",
            Self::EarlyLeave => "early_leave",
            Self::NoShow => "no_show",
        }
    }

    /// Whether a record in this status counts against the round's capacity.
    ///
    /// `late` and `early_leave` are annotations on a confirmed attendee, so they
    /// keep the seat they were admitted into.
    pub const fn occupies_slot(self) -> bool {
        matches!(self, Self::Attending | Self::Late | Self::EarlyLeave)
    }

    /// Statuses that are only reachable through an administrator override.
    pub const fn is_admin_override(self) -> bool {
        matches!(self, Self::Late | Self::EarlyLeave | Self::NoShow)
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = AttendanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AttendanceError::NotFound(format!("status `{s}`")))
    }
}

/// Validates and applies status transitions on attendance records.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusStateMachine;

impl StatusStateMachine {
    /// Validate a transition from `from` (`None` when no record exists yet) to `to`.
    ///
    /// Seat admission (`attending` from a seatless state, and `waitlist`) is only
    /// accepted from [`Actor::System`]; callers that want a seat go through the
    /// capacity gate, which then applies the transition as the system.
    ///
    /// # Errors
    ///
    /// - `Forbidden` when a member asks for an administrator override.
    /// - `InvalidTransition` when the table does not allow the change.
    /// - `InvalidCheckInState` for `early_leave` without a prior check-in.
    pub fn validate(
        from: Option<&AttendanceRecord>,
        to: AttendanceStatus,
        actor: Actor,
    ) -> Result<(), AttendanceError> {
        let current = from.map(|r| r.status);
        if current == Some(to) {
            return Err(invalid(current, to, "record already has this status"));
        }

        match to {
            AttendanceStatus::NotAttending | AttendanceStatus::Maybe => Ok(()),
            AttendanceStatus::Waitlist => match (actor, current) {
                (Actor::System, None | Some(AttendanceStatus::Maybe | AttendanceStatus::NotAttending)) => {
                    Ok(())
                }
                (Actor::System, _) => Err(invalid(current, to, "only seatless records can be queued")),
                _ => Err(invalid(current, to, "waitlist positions are assigned by admission")),
            },
            AttendanceStatus::Attending => match (actor, current) {
                (
                    Actor::System,
                    None
                    | Some(
                        AttendanceStatus::Waitlist
                        | AttendanceStatus::Maybe
                        | AttendanceStatus::NotAttending,
                    ),
                ) => Ok(()),
                // Correcting an override on someone who already holds the seat.
                (Actor::Admin | Actor::System, Some(AttendanceStatus::Late | AttendanceStatus::EarlyLeave)) => {
                    Ok(())
                }
                (_, Some(AttendanceStatus::NoShow)) => {
                    Err(invalid(current, to, "no-show records are closed"))
                }
                _ => Err(invalid(current, to, "seats are granted by admission or promotion")),
            },
            AttendanceStatus::Late | AttendanceStatus::EarlyLeave | AttendanceStatus::NoShow => {
                if !actor.is_privileged() {
                    return Err(AttendanceError::Forbidden(format!(
                        "{to} is an administrator override"
                    )));
                }
                let allowed = match to {
                    AttendanceStatus::Late => current == Some(AttendanceStatus::Attending),
                    AttendanceStatus::EarlyLeave => matches!(
                        current,
                        Some(AttendanceStatus::Attending | AttendanceStatus::Late)
                    ),
                    _ => current == Some(AttendanceStatus::Attending),
                };
                if !allowed {
                    return Err(invalid(current, to, "override requires a confirmed attendee"));
                }
                if to == AttendanceStatus::EarlyLeave
                    && from.is_some_and(|r| r.checked_in_at_ms.is_none())
                {
                    return Err(AttendanceError::InvalidCheckInState(
                        "early leave requires a check-in".into(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Apply an already validated transition, keeping the waitlist position
    /// present exactly when the status is `waitlist`.
    pub fn apply(
        record: &mut AttendanceRecord,
        to: AttendanceStatus,
        waitlist_position: Option<u64>,
        now_ms: u128,
    ) {
        let reseated = !record.status.occupies_slot() && to == AttendanceStatus::Attending;
        record.status = to;
        record.waitlist_position = if to == AttendanceStatus::Waitlist {
            waitlist_position
        } else {
            None
        };
        if reseated || to == AttendanceStatus::Waitlist {
            // A fresh seat starts without stale presence stamps.
            record.checked_in_at_ms = None;
            record.checked_out_at_ms = None;
        }
        record.updated_at_ms = now_ms;
    }

    /// Stamp a check-in. Only confirmed attendees can check in, once.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCheckInState` when the record is not `attending` or is already checked in.
    pub fn check_in(record: &mut AttendanceRecord, now_ms: u128) -> Result<(), AttendanceError> {
        if record.status != AttendanceStatus::Attending {
            return Err(AttendanceError::InvalidCheckInState(format!(
                "cannot check in while {}",
                record.status
            )));
        }
        if record.checked_in_at_ms.is_some() {
            return Err(AttendanceError::InvalidCheckInState("already checked in".into()));
        }
        record.checked_in_at_ms = Some(now_ms);
        record.updated_at_ms = now_ms;
        Ok(())
    }

    /// Stamp a check-out. Requires a prior check-in.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCheckInState` without a check-in or on a second check-out.
    pub fn check_out(record: &mut AttendanceRecord, now_ms: u128) -> Result<(), AttendanceError> {
        if record.checked_in_at_ms.is_none() {
            return Err(AttendanceError::InvalidCheckInState("not checked in".into()));
        }
        if record.checked_out_at_ms.is_some() {
            return Err(AttendanceError::InvalidCheckInState("already checked out".into()));
        }
        record.checked_out_at_ms = Some(now_ms);
        record.updated_at_ms = now_ms;
        Ok(())
    }
}

pub(crate) fn invalid(from: Option<AttendanceStatus>, to: AttendanceStatus, reason: &str) -> AttendanceError {
    AttendanceError::InvalidTransition {
        from: from.map_or_else(|| "none".to_string(), |s| s.as_str().to_string()),
        to,
        reason: reason.to_string(),
    }
}
