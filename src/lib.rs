//! # Round Attendance
//!
//! A race-free admission engine for capacity-bounded rounds of a scheduled activity.
//!
//! Members sign up for a round and are either confirmed into a seat or queued on a
//! FIFO waitlist. When a confirmed attendee withdraws (or is marked a no-show), the
//! freed seat is handed to the head of the waitlist inside the same critical
//! section that released it. Check-in, check-out and administrator overrides
//! (`late`, `early_leave`, `no_show`) are tracked on the same record.
//!
//! ## Core Guarantees
//!
//! - **Capacity**: the number of seat-holding records never exceeds a round's capacity
//! - **FIFO promotion**: waitlisted members are promoted strictly by arrival order
//! - **No stranded seats**: a released seat is always offered to the waitlist head
//! - **No refusals for capacity**: a signup is confirmed or queued, never rejected
//!
//! ## Concurrency Model
//!
//! Each round has its own async critical section. Operations on one round are
//! totally ordered by lock acquisition; different rounds proceed in parallel. A
//! caller cancelled while waiting for the lock leaves no effect behind.
//! Notifications and audit events are flushed after the lock is released.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use round_attendance::core::{RequestOptions, Round, RoundAttendanceService};
//! use round_attendance::infra::InMemoryAttendanceStore;
//! use round_attendance::util::{MemberId, RoundId, SystemClock};
//!
//! let service = RoundAttendanceService::new(InMemoryAttendanceStore::new(), SystemClock);
//! service.register_round(Round::new("morning", 2))?;
//!
//! let outcome = service
//!     .request_attendance(&RoundId::from("morning"), &MemberId::from("x"), RequestOptions::default())
//!     .await?;
//! ```
//!
//! For complete scenarios, see `tests/admission_engine_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core admission engine: records, capacity, waitlist, promotion and the façade.
pub mod core;
/// Configuration models for the engine and its rounds.
pub mod config;
/// Builders to construct the service from configuration.
pub mod builders;
/// Infrastructure adapters for storage and notification delivery.
pub mod infra;
/// In-process command surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
