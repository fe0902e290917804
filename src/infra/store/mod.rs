//! Attendance store backends.

pub mod memory;

pub use memory::InMemoryAttendanceStore;
