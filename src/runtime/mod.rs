//! In-process command surface for the enclosing application.

pub mod api;

pub use api::{command_actor, execute_command, list_rounds, AttendanceCommand, CommandResponse, RoundListing};
