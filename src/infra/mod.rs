//! Infrastructure adapters for attendance storage and notification delivery.

pub mod notifier;
pub mod store;
pub use notifier::{ChannelNotifier, InMemoryNotifier};
pub use store::InMemoryAttendanceStore;
