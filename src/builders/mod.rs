//! Builders to construct the attendance service from configuration.

pub mod service_builder;

pub use service_builder::{build_audit_sink, build_service};
