//! Tests for configuration validation

use std::collections::HashMap;
use std::env;
use std::fs;

use round_attendance::config::engine::{AUDIT_BUFFER_ENV, CONFIG_PATH_ENV, PROMOTION_ATTEMPTS_ENV};
use round_attendance::config::{EngineConfig, RoundConfig};

fn round(capacity: u32) -> RoundConfig {
    RoundConfig {
        capacity,
        rsvp_deadline_ms: None,
        ends_at_ms: None,
    }
}

#[test]
fn test_default_config_is_valid() {
    let config = EngineConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.promotion_max_attempts, 3);
}

#[test]
fn test_zero_promotion_attempts_invalid() {
    let config = EngineConfig {
        promotion_max_attempts: 0,
        ..EngineConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_zero_audit_buffer_invalid() {
    let config = EngineConfig {
        audit_buffer: 0,
        ..EngineConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_deadline_after_end_invalid() {
    let mut rounds = HashMap::new();
    rounds.insert(
        "r1".to_string(),
        RoundConfig {
            capacity: 2,
            rsvp_deadline_ms: Some(2_000),
            ends_at_ms: Some(1_000),
        },
    );
    let config = EngineConfig {
        rounds,
        ..EngineConfig::default()
    };
    let err = config.validate().unwrap_err();
    assert!(err.contains("r1"));
}

#[test]
fn test_unlimited_round_is_valid() {
    let mut rounds = HashMap::new();
    rounds.insert("open".to_string(), round(0));
    let config = EngineConfig {
        rounds,
        ..EngineConfig::default()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_from_json() {
    let json = r#"{
        "promotion_max_attempts": 5,
        "rounds": {
            "morning": { "capacity": 2, "rsvp_deadline_ms": 1000 },
            "evening": { "capacity": 0 }
        }
    }"#;

    let config = EngineConfig::from_json_str(json).unwrap();
    assert_eq!(config.promotion_max_attempts, 5);
    assert_eq!(config.audit_buffer, 1024);
    assert_eq!(config.rounds["morning"].rsvp_deadline_ms, Some(1000));
    assert_eq!(config.rounds["evening"].capacity, 0);

    let round = config.rounds["morning"].to_round("morning");
    assert_eq!(round.id.as_str(), "morning");
    assert_eq!(round.capacity, 2);
}

#[test]
fn test_config_from_bad_json() {
    assert!(EngineConfig::from_json_str("{ not json").is_err());
    assert!(EngineConfig::from_json_str(r#"{ "promotion_max_attempts": 0 }"#).is_err());
}

// Environment variables are process-wide, so every from_env case lives in one test.
#[test]
fn test_config_from_env() {
    let path = env::temp_dir().join(format!("round_attendance_config_{}.json", std::process::id()));
    fs::write(
        &path,
        r#"{ "promotion_max_attempts": 4, "rounds": { "morning": { "capacity": 3 } } }"#,
    )
    .unwrap();

    env::set_var(CONFIG_PATH_ENV, &path);
    let from_file = EngineConfig::from_env().unwrap();
    assert_eq!(from_file.promotion_max_attempts, 4);
    assert_eq!(from_file.rounds["morning"].capacity, 3);

    env::set_var(PROMOTION_ATTEMPTS_ENV, "7");
    env::set_var(AUDIT_BUFFER_ENV, "16");
    let overridden = EngineConfig::from_env().unwrap();
    assert_eq!(overridden.promotion_max_attempts, 7);
    assert_eq!(overridden.audit_buffer, 16);
    assert_eq!(overridden.rounds.len(), 1);

    env::set_var(PROMOTION_ATTEMPTS_ENV, "lots");
    let err = EngineConfig::from_env().unwrap_err();
    assert!(err.contains(PROMOTION_ATTEMPTS_ENV));

    env::set_var(PROMOTION_ATTEMPTS_ENV, "0");
    assert!(EngineConfig::from_env().is_err());

    env::remove_var(PROMOTION_ATTEMPTS_ENV);
    env::set_var(AUDIT_BUFFER_ENV, "-1");
    let err = EngineConfig::from_env().unwrap_err();
    assert!(err.contains(AUDIT_BUFFER_ENV));

    env::remove_var(AUDIT_BUFFER_ENV);
    env::set_var(CONFIG_PATH_ENV, path.with_extension("missing"));
    assert!(EngineConfig::from_env().is_err());

    env::remove_var(CONFIG_PATH_ENV);
    let defaults = EngineConfig::from_env().unwrap();
    assert_eq!(defaults.promotion_max_attempts, 3);
    assert!(defaults.rounds.is_empty());

    fs::remove_file(&path).unwrap();
}
