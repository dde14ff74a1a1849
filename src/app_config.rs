use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Output sample rate in Hz; every segment in a batch is carried at this rate
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Synthesis engine config
    #[serde(default)]
    pub engine: EngineConfig,

    /// Duration-matching config
    #[serde(default)]
    pub sync: SyncConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Synthesis engine type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineProvider {
    // @provider: HTTP synthesis server
    #[default]
    Http,
    // @provider: In-process mock (offline runs and tests)
    Mock,
}

impl EngineProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Http => "HTTP",
            Self::Mock => "Mock",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Http => "http".to_string(),
            Self::Mock => "mock".to_string(),
        }
    }
}

// Implement Display trait for EngineProvider
impl std::fmt::Display for EngineProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for EngineProvider
impl std::str::FromStr for EngineProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "mock" => Ok(Self::Mock),
            _ => Err(anyhow!("Invalid engine type: {}", s)),
        }
    }
}

/// Synthesis engine configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineConfig {
    // @field: Engine type identifier
    #[serde(default)]
    pub provider: EngineProvider,

    // @field: Synthesis model name passed through to the server
    #[serde(default = "default_engine_model")]
    pub model: String,

    // @field: Service URL
    #[serde(default = "default_engine_endpoint")]
    pub endpoint: String,

    // @field: Timeout seconds per synthesis request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Retry count for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    // @field: Backoff base for retries (in milliseconds, doubled per retry)
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider: EngineProvider::default(),
            model: default_engine_model(),
            endpoint: default_engine_endpoint(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

/// Duration-matching configuration shared by the strategies
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncConfig {
    /// Strategy name (see `sync::list_strategies`)
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Lower bound of the standard speed band
    #[serde(default = "default_min_speed")]
    pub min_speed_factor: f64,

    /// Upper bound of the standard speed band
    #[serde(default = "default_max_speed")]
    pub max_speed_factor: f64,

    /// Lower bound of the quality-preserving speed band
    #[serde(default = "default_quality_min_speed")]
    pub quality_min_speed: f64,

    /// Upper bound of the quality-preserving speed band
    #[serde(default = "default_quality_max_speed")]
    pub quality_max_speed: f64,

    /// Relative deviation below which no stretch is applied
    #[serde(default = "default_stretch_threshold")]
    pub stretch_threshold: f64,

    /// Relative duration tolerance for the iterative strategy
    #[serde(default = "default_iterative_tolerance")]
    pub iterative_tolerance: f64,

    /// Synthesis attempt cap for the iterative strategy
    #[serde(default = "default_iterative_max_attempts")]
    pub iterative_max_attempts: u32,

    /// Feedback gain applied to the duration ratio between attempts
    #[serde(default = "default_adjustment_factor")]
    pub adjustment_factor: f64,

    /// Absolute duration tolerance in seconds for the adaptive strategy
    #[serde(default = "default_adaptive_tolerance_secs")]
    pub adaptive_tolerance_secs: f64,

    /// Synthesis attempt cap for the adaptive strategy
    #[serde(default = "default_adaptive_max_attempts")]
    pub adaptive_max_attempts: u32,

    /// Whether time-synchronized merging mixes overlapping segments
    /// instead of shifting them forward
    #[serde(default = "default_true")]
    pub allow_overlap: bool,

    /// Merge mode override; `None` uses the strategy's preferred mode
    #[serde(default)]
    pub composition_mode: Option<CompositionModeSetting>,

    /// Maximum number of in-flight synthesis requests
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            min_speed_factor: default_min_speed(),
            max_speed_factor: default_max_speed(),
            quality_min_speed: default_quality_min_speed(),
            quality_max_speed: default_quality_max_speed(),
            stretch_threshold: default_stretch_threshold(),
            iterative_tolerance: default_iterative_tolerance(),
            iterative_max_attempts: default_iterative_max_attempts(),
            adjustment_factor: default_adjustment_factor(),
            adaptive_tolerance_secs: default_adaptive_tolerance_secs(),
            adaptive_max_attempts: default_adaptive_max_attempts(),
            allow_overlap: true,
            composition_mode: None,
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}

/// Merge mode selector as it appears in the config file
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CompositionModeSetting {
    NaturalConcatenation,
    TimeSynchronized,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_sample_rate() -> u32 {
    22050
}

fn default_engine_model() -> String {
    "xtts_v2".to_string()
}

fn default_engine_endpoint() -> String {
    "http://localhost:8020".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    3 // Default to 3 retries
}

fn default_backoff_base_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_strategy() -> String {
    "stretch".to_string()
}

fn default_min_speed() -> f64 {
    0.7
}

fn default_max_speed() -> f64 {
    1.5
}

fn default_quality_min_speed() -> f64 {
    0.8
}

fn default_quality_max_speed() -> f64 {
    1.3
}

fn default_stretch_threshold() -> f64 {
    0.05 // Deviations under 5% are left alone
}

fn default_iterative_tolerance() -> f64 {
    0.05
}

fn default_iterative_max_attempts() -> u32 {
    4
}

fn default_adjustment_factor() -> f64 {
    1.5
}

fn default_adaptive_tolerance_secs() -> f64 {
    0.1
}

fn default_adaptive_max_attempts() -> u32 {
    5
}

fn default_max_concurrent_requests() -> usize {
    1 // Sequential per batch unless raised explicitly
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(anyhow!("Sample rate must be greater than zero"));
        }

        if !crate::sync::is_known_strategy(&self.sync.strategy) {
            return Err(anyhow!(
                "Unknown strategy '{}', available: {}",
                self.sync.strategy,
                crate::sync::list_strategies().join(", ")
            ));
        }

        let sync = &self.sync;
        if sync.min_speed_factor <= 0.0 || sync.min_speed_factor >= sync.max_speed_factor {
            return Err(anyhow!(
                "Invalid speed band: {} .. {}",
                sync.min_speed_factor,
                sync.max_speed_factor
            ));
        }
        if sync.quality_min_speed <= 0.0 || sync.quality_min_speed >= sync.quality_max_speed {
            return Err(anyhow!(
                "Invalid quality speed band: {} .. {}",
                sync.quality_min_speed,
                sync.quality_max_speed
            ));
        }
        if !(0.0..1.0).contains(&sync.stretch_threshold) {
            return Err(anyhow!(
                "Stretch threshold must be in [0, 1), got {}",
                sync.stretch_threshold
            ));
        }
        if sync.iterative_max_attempts == 0 || sync.adaptive_max_attempts == 0 {
            return Err(anyhow!("Attempt caps must be at least 1"));
        }
        if sync.max_concurrent_requests == 0 {
            return Err(anyhow!("max_concurrent_requests must be at least 1"));
        }

        // Validate endpoint for the HTTP engine
        if self.engine.provider == EngineProvider::Http && self.engine.endpoint.is_empty() {
            return Err(anyhow!("An endpoint is required for the HTTP engine"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            sample_rate: default_sample_rate(),
            engine: EngineConfig::default(),
            sync: SyncConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
