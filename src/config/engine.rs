//! Engine and round configuration structures.

use std::collections::HashMap;
use std::env;
use std::fs;

use serde::{Deserialize, Serialize};

use crate::core::{Round, DEFAULT_PROMOTION_ATTEMPTS};

/// Environment variable pointing at a JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "ROUND_ATTENDANCE_CONFIG_PATH";
/// Environment override for [`EngineConfig::promotion_max_attempts`].
pub const PROMOTION_ATTEMPTS_ENV: &str = "ROUND_ATTENDANCE_PROMOTION_MAX_ATTEMPTS";
/// Environment override for [`EngineConfig::audit_buffer`].
pub const AUDIT_BUFFER_ENV: &str = "ROUND_ATTENDANCE_AUDIT_BUFFER";

const DEFAULT_AUDIT_BUFFER: usize = 1024;

/// Round definition as configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Maximum confirmed attendees; zero means unlimited.
    pub capacity: u32,
    /// RSVP deadline (ms since epoch).
    #[serde(default)]
    pub rsvp_deadline_ms: Option<u128>,
    /// End of the round (ms since epoch).
    #[serde(default)]
    pub ends_at_ms: Option<u128>,
}

impl RoundConfig {
    /// Validate round configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if let (Some(deadline), Some(end)) = (self.rsvp_deadline_ms, self.ends_at_ms) {
            if deadline > end {
                return Err("rsvp_deadline_ms must not be after ends_at_ms".into());
            }
        }
        Ok(())
    }

    /// Build the round this entry describes.
    pub fn to_round(&self, id: &str) -> Round {
        Round {
            id: id.into(),
            capacity: self.capacity,
            rsvp_deadline_ms: self.rsvp_deadline_ms,
            ends_at_ms: self.ends_at_ms,
        }
    }
}

/// Root engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Write attempts against one waitlist head before reporting `PromotionFailed`.
    pub promotion_max_attempts: u32,
    /// Events kept by the in-memory audit sink.
    pub audit_buffer: usize,
    /// Rounds registered at startup, keyed by round id.
    pub rounds: HashMap<String, RoundConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            promotion_max_attempts: DEFAULT_PROMOTION_ATTEMPTS,
            audit_buffer: DEFAULT_AUDIT_BUFFER,
            rounds: HashMap::new(),
        }
    }
}

impl EngineConfig {
    /// Validate engine settings and every round.
    pub fn validate(&self) -> Result<(), String> {
        if self.promotion_max_attempts == 0 {
            return Err("promotion_max_attempts must be greater than 0".into());
        }
        if self.audit_buffer == 0 {
            return Err("audit_buffer must be greater than 0".into());
        }
        for (id, round) in &self.rounds {
            if id.trim().is_empty() {
                return Err("round ids must not be empty".into());
            }
            round
                .validate()
                .map_err(|e| format!("round `{id}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the environment (after reading a `.env` file if present).
    ///
    /// [`CONFIG_PATH_ENV`] names an optional JSON file; the scalar settings can be
    /// overridden individually. Missing values keep their defaults.
    pub fn from_env() -> Result<Self, String> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                tracing::warn!(error = %err, "failed to read .env file");
            }
        }

        let mut cfg = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => {
                let contents =
                    fs::read_to_string(&path).map_err(|e| format!("read {path}: {e}"))?;
                tracing::info!(path = %path, "loaded engine config file");
                serde_json::from_str(&contents).map_err(|e| format!("parse error: {e}"))?
            }
            Err(_) => Self::default(),
        };

        if let Ok(raw) = env::var(PROMOTION_ATTEMPTS_ENV) {
            cfg.promotion_max_attempts = raw
                .parse()
                .map_err(|e| format!("{PROMOTION_ATTEMPTS_ENV}: {e}"))?;
        }
        if let Ok(raw) = env::var(AUDIT_BUFFER_ENV) {
            cfg.audit_buffer = raw.parse().map_err(|e| format!("{AUDIT_BUFFER_ENV}: {e}"))?;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}
