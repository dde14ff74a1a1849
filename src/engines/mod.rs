/*!
 * Synthesis engine implementations.
 *
 * This module contains clients for text-to-speech backends:
 * - Http: Network synthesis server speaking multipart requests
 * - Mock: In-process engine with configurable behaviors
 */

use std::fmt::Debug;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::errors::EngineError;

/// One synthesis call
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// Text to speak
    pub text: String,
    /// Voice reference audio used for cloning
    pub voice_reference: PathBuf,
    /// Scalar control knob in [-2.0, 2.0]; larger values shorten the output
    pub length_penalty: Option<f32>,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, voice_reference: impl Into<PathBuf>) -> Self {
        Self {
            text: text.into(),
            voice_reference: voice_reference.into(),
            length_penalty: None,
        }
    }

    /// Set the length penalty
    pub fn with_length_penalty(mut self, penalty: f32) -> Self {
        self.length_penalty = Some(penalty);
        self
    }
}

/// Audio returned by an engine, at whatever rate its backend produces
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    /// Mono samples
    pub samples: Vec<f32>,
    /// Sample rate of `samples`
    pub sample_rate: u32,
}

impl SynthesisOutput {
    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Common trait for all synthesis engines
///
/// This trait defines the interface that all engine implementations must
/// follow, allowing them to be used interchangeably by the strategies.
/// Engines are black boxes: duration control beyond `length_penalty` is an
/// optional capability, not an assumption.
#[async_trait]
pub trait TtsEngine: Send + Sync + Debug {
    /// Name of the concrete engine, used in logs and capability errors
    fn name(&self) -> &str;

    /// Synthesize speech for a request
    ///
    /// # Arguments
    /// * `request` - The synthesis request
    ///
    /// # Returns
    /// * `Result<SynthesisOutput, EngineError>` - The synthesized audio or an error
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisOutput, EngineError>;

    /// Synthesize speech targeting a specific duration in seconds
    ///
    /// Only engines whose backend can steer its own output length implement
    /// this. The default refuses with a capability error.
    async fn synthesize_to_duration(
        &self,
        request: &SynthesisRequest,
        target_duration: f64,
    ) -> Result<SynthesisOutput, EngineError> {
        let _ = (request, target_duration);
        Err(EngineError::CapabilityNotSupported {
            engine: self.name().to_string(),
            operation: "synthesize_to_duration".to_string(),
        })
    }

    /// Whether `synthesize_to_duration` is implemented
    fn supports_duration_targeting(&self) -> bool {
        false
    }

    /// Check that the engine backend is reachable and ready
    async fn check_ready(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

pub mod http;
pub mod mock;
