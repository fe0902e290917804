//! Configuration models for the engine and its rounds.

pub mod engine;

pub use engine::{EngineConfig, RoundConfig};
