//! API-facing command/response models.
//!
//! The enclosing application authenticates the caller and checks membership,
//! then hands a command to [`execute_command`].

use serde::{Deserialize, Serialize};

use crate::core::{
    AttendanceError, AttendanceOutcome, AttendanceRecord, AttendanceStatus, AttendanceStore,
    RequestOptions, RoundAttendanceService, SweepReport,
};
use crate::util::clock::Clock;
use crate::util::serde::{Actor, MemberId, RoundId};

/// A mutating request routed to the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AttendanceCommand {
    /// Ask for a seat.
    Join {
        /// Round.
        round_id: RoundId,
        /// Member.
        member_id: MemberId,
        /// Record a decline instead of queueing when full.
        #[serde(default)]
        decline_if_full: bool,
    },
    /// Give up a seat or queue slot.
    Leave {
        /// Round.
        round_id: RoundId,
        /// Member.
        member_id: MemberId,
    },
    /// Change status.
    SetStatus {
        /// Round.
        round_id: RoundId,
        /// Member.
        member_id: MemberId,
        /// Requested status.
        status: AttendanceStatus,
        /// Who is asking.
        actor: Actor,
    },
    /// Record arrival.
    CheckIn {
        /// Round.
        round_id: RoundId,
        /// Member.
        member_id: MemberId,
    },
    /// Record departure.
    CheckOut {
        /// Round.
        round_id: RoundId,
        /// Member.
        member_id: MemberId,
    },
    /// Mark unchecked attendees as no-shows.
    SweepNoShows {
        /// Round.
        round_id: RoundId,
    },
    /// Change a round's capacity.
    UpdateCapacity {
        /// Round.
        round_id: RoundId,
        /// New capacity; zero means unlimited.
        capacity: u32,
    },
}

/// Result of a command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandResponse {
    /// Single-record operations.
    Attendance(AttendanceOutcome),
    /// No-show sweep.
    Sweep(SweepReport),
    /// Members promoted by a capacity change.
    Promoted(Vec<AttendanceRecord>),
}

/// Round listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundListing {
    /// Round identifier.
    pub id: RoundId,
    /// Capacity.
    pub capacity: u32,
    /// RSVP deadline (ms since epoch).
    pub rsvp_deadline_ms: Option<u128>,
}

/// Run a command against the service.
///
/// # Errors
///
/// Returns whatever the underlying operation returns.
pub async fn execute_command<S, C>(
    service: &RoundAttendanceService<S, C>,
    command: AttendanceCommand,
) -> Result<CommandResponse, AttendanceError>
where
    S: AttendanceStore,
    C: Clock,
{
    let response = match command {
        AttendanceCommand::Join {
            round_id,
            member_id,
            decline_if_full,
        } => CommandResponse::Attendance(
            service
                .request_attendance(&round_id, &member_id, RequestOptions { decline_if_full })
                .await?,
        ),
        AttendanceCommand::Leave {
            round_id,
            member_id,
        } => CommandResponse::Attendance(service.withdraw(&round_id, &member_id).await?),
        AttendanceCommand::SetStatus {
            round_id,
            member_id,
            status,
            actor,
        } => CommandResponse::Attendance(
            service
                .set_status(&round_id, &member_id, status, actor)
                .await?,
        ),
        AttendanceCommand::CheckIn {
            round_id,
            member_id,
        } => CommandResponse::Attendance(service.check_in(&round_id, &member_id).await?),
        AttendanceCommand::CheckOut {
            round_id,
            member_id,
        } => CommandResponse::Attendance(service.check_out(&round_id, &member_id).await?),
        AttendanceCommand::SweepNoShows { round_id } => {
            CommandResponse::Sweep(service.sweep_no_shows(&round_id).await?)
        }
        AttendanceCommand::UpdateCapacity { round_id, capacity } => {
            CommandResponse::Promoted(service.update_capacity(&round_id, capacity).await?)
        }
    };
    Ok(response)
}

/// Build round listings from the store.
///
/// # Errors
///
/// Propagates storage failures.
pub fn list_rounds<S: AttendanceStore>(store: &S) -> Result<Vec<RoundListing>, AttendanceError> {
    Ok(store
        .list_rounds()?
        .into_iter()
        .map(|round| RoundListing {
            id: round.id,
            capacity: round.capacity,
            rsvp_deadline_ms: round.rsvp_deadline_ms,
        })
        .collect())
}

/// Return the actor a command acts as, for callers that authorize by role.
pub const fn command_actor(command: &AttendanceCommand) -> Actor {
    match command {
        AttendanceCommand::Join { .. } | AttendanceCommand::Leave { .. } => Actor::Member,
        AttendanceCommand::SetStatus { actor, .. } => *actor,
        AttendanceCommand::CheckIn { .. }
        | AttendanceCommand::CheckOut { .. }
        | AttendanceCommand::SweepNoShows { .. }
        | AttendanceCommand::UpdateCapacity { .. } => Actor::Admin,
    }
}
