/*!
 * Tests for application configuration
 */

use std::str::FromStr;

use dubwai::app_config::{CompositionModeSetting, Config, EngineProvider, LogLevel};

/// Test default configuration values
#[test]
fn test_defaultConfig_shouldHaveExpectedValues() {
    let config = Config::default();

    assert_eq!(config.sample_rate, 22050);
    assert_eq!(config.engine.provider, EngineProvider::Http);
    assert_eq!(config.engine.model, "xtts_v2");
    assert_eq!(config.engine.endpoint, "http://localhost:8020");
    assert_eq!(config.engine.max_retries, 3);
    assert_eq!(config.sync.strategy, "stretch");
    assert!((config.sync.min_speed_factor - 0.7).abs() < 1e-9);
    assert!((config.sync.max_speed_factor - 1.5).abs() < 1e-9);
    assert!((config.sync.quality_min_speed - 0.8).abs() < 1e-9);
    assert!((config.sync.quality_max_speed - 1.3).abs() < 1e-9);
    assert_eq!(config.sync.iterative_max_attempts, 4);
    assert_eq!(config.sync.adaptive_max_attempts, 5);
    assert_eq!(config.sync.max_concurrent_requests, 1);
    assert!(config.sync.allow_overlap);
    assert!(config.sync.composition_mode.is_none());
    assert_eq!(config.log_level, LogLevel::Info);
}

#[test]
fn test_defaultConfig_shouldValidate() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_validate_withUnknownStrategy_shouldFail() {
    let mut config = Config::default();
    config.sync.strategy = "warp_drive".to_string();

    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains("warp_drive"));
    // Error names the available strategies
    assert!(err.contains("stretch"));
}

#[test]
fn test_validate_withZeroSampleRate_shouldFail() {
    let mut config = Config::default();
    config.sample_rate = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withInvalidSpeedBand_shouldFail() {
    let mut config = Config::default();
    config.sync.min_speed_factor = 1.5;
    config.sync.max_speed_factor = 0.7;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withZeroAttemptCap_shouldFail() {
    let mut config = Config::default();
    config.sync.iterative_max_attempts = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withZeroConcurrency_shouldFail() {
    let mut config = Config::default();
    config.sync.max_concurrent_requests = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withHttpEngineAndEmptyEndpoint_shouldFail() {
    let mut config = Config::default();
    config.engine.endpoint = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_engineProvider_fromStr_shouldParseKnownProviders() {
    assert_eq!(EngineProvider::from_str("http").unwrap(), EngineProvider::Http);
    assert_eq!(EngineProvider::from_str("Mock").unwrap(), EngineProvider::Mock);
    assert!(EngineProvider::from_str("espeak").is_err());
}

/// Test JSON deserialization with partial content and serde defaults
#[test]
fn test_configDeserialization_withPartialJson_shouldFillDefaults() {
    let json = r#"{
        "sample_rate": 44100,
        "engine": { "provider": "mock" },
        "sync": {
            "strategy": "iterative",
            "composition_mode": "time_synchronized",
            "allow_overlap": false
        }
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();
    assert_eq!(config.sample_rate, 44100);
    assert_eq!(config.engine.provider, EngineProvider::Mock);
    assert_eq!(config.engine.model, "xtts_v2");
    assert_eq!(config.sync.strategy, "iterative");
    assert_eq!(
        config.sync.composition_mode,
        Some(CompositionModeSetting::TimeSynchronized)
    );
    assert!(!config.sync.allow_overlap);
    // Untouched fields keep their defaults
    assert!((config.sync.stretch_threshold - 0.05).abs() < 1e-9);
    assert!(config.validate().is_ok());
}

#[test]
fn test_configSerialization_shouldRoundTrip() {
    let config = Config::default();
    let json = serde_json::to_string_pretty(&config).unwrap();
    let parsed: Config = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.sample_rate, config.sample_rate);
    assert_eq!(parsed.engine.provider, config.engine.provider);
    assert_eq!(parsed.sync.strategy, config.sync.strategy);
}
