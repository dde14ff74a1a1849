/*!
 * Mock engine implementations for testing.
 *
 * This module provides mock engines that simulate different behaviors:
 * - `MockTtsEngine::fixed(secs)` - Always answers with the same duration
 * - `MockTtsEngine::param_driven(base)` - Duration steered by the length penalty
 * - `MockTtsEngine::non_monotonic(base)` - Penalty moves duration the wrong way
 * - `MockTtsEngine::failing()` - Always fails with an error
 * - `MockTtsEngine::intermittent(n)` - Fails every nth request
 * - `MockTtsEngine::empty()` - Returns zero samples
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::engines::{SynthesisOutput, SynthesisRequest, TtsEngine};
use crate::errors::EngineError;

/// Behavior mode for the mock engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always answers with the same duration, penalty ignored
    FixedDuration { seconds: f64 },
    /// Duration shrinks as the length penalty grows (monotonic)
    ParamDriven { base_seconds: f64 },
    /// Duration grows with the penalty's magnitude, breaking the
    /// larger-penalty-means-shorter assumption
    NonMonotonic { base_seconds: f64 },
    /// Fails intermittently (every nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns zero samples
    EmptyAudio,
}

/// Mock engine for testing strategy behavior
#[derive(Debug)]
pub struct MockTtsEngine {
    /// Behavior mode
    behavior: MockBehavior,
    /// Sample rate of generated audio
    sample_rate: u32,
    /// Whether `synthesize_to_duration` is available
    supports_targeting: bool,
    /// Seeded RNG for duration jitter, `None` for deterministic output
    jitter: Option<Mutex<StdRng>>,
    /// Jitter magnitude as a fraction of the duration
    jitter_fraction: f64,
    /// Request counter, shared across clones
    call_count: Arc<AtomicUsize>,
    /// Zero-based attempt indices that answer with zero samples
    empty_on_attempts: Vec<usize>,
}

impl MockTtsEngine {
    /// Create a new mock engine with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            sample_rate: 22050,
            supports_targeting: false,
            jitter: None,
            jitter_fraction: 0.0,
            call_count: Arc::new(AtomicUsize::new(0)),
            empty_on_attempts: Vec::new(),
        }
    }

    /// Create a mock that always answers with `seconds` of audio
    pub fn fixed(seconds: f64) -> Self {
        Self::new(MockBehavior::FixedDuration { seconds })
    }

    /// Create a mock whose duration follows the length penalty
    pub fn param_driven(base_seconds: f64) -> Self {
        Self::new(MockBehavior::ParamDriven { base_seconds })
    }

    /// Create a mock that violates the penalty monotonicity assumption
    pub fn non_monotonic(base_seconds: f64) -> Self {
        Self::new(MockBehavior::NonMonotonic { base_seconds })
    }

    /// Create an intermittently failing mock engine
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing mock engine that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that returns zero samples
    pub fn empty() -> Self {
        Self::new(MockBehavior::EmptyAudio)
    }

    /// Enable `synthesize_to_duration`
    pub fn with_duration_targeting(mut self) -> Self {
        self.supports_targeting = true;
        self
    }

    /// Answer at a different sample rate than the batch default
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Add seeded duration jitter to model non-deterministic synthesis
    pub fn with_jitter(mut self, seed: u64, fraction: f64) -> Self {
        self.jitter = Some(Mutex::new(StdRng::seed_from_u64(seed)));
        self.jitter_fraction = fraction;
        self
    }

    /// Answer with zero samples on these zero-based attempt indices
    pub fn with_empty_on_attempts(mut self, attempts: Vec<usize>) -> Self {
        self.empty_on_attempts = attempts;
        self
    }

    /// Number of synthesis calls made so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Duration this mock answers with for a given penalty
    fn resolve_duration(&self, length_penalty: Option<f32>) -> f64 {
        let penalty = length_penalty.unwrap_or(0.0) as f64;
        let base = match self.behavior {
            MockBehavior::FixedDuration { seconds } => seconds,
            // Penalty domain [-2, 2] maps to a factor range of [0.5, 1.5]
            MockBehavior::ParamDriven { base_seconds } => {
                base_seconds * (1.0 - 0.25 * penalty)
            }
            MockBehavior::NonMonotonic { base_seconds } => {
                base_seconds * (1.0 + 0.3 * penalty.abs())
            }
            _ => 1.0,
        };
        self.apply_jitter(base.max(0.05))
    }

    fn apply_jitter(&self, duration: f64) -> f64 {
        match &self.jitter {
            Some(rng) => {
                let wobble: f64 = rng.lock().random_range(-1.0..1.0);
                (duration * (1.0 + wobble * self.jitter_fraction)).max(0.05)
            }
            None => duration,
        }
    }

    /// A quiet test tone of the given duration
    fn tone(&self, duration: f64) -> SynthesisOutput {
        let len = (duration * self.sample_rate as f64).round() as usize;
        let samples = (0..len)
            .map(|i| {
                (2.0 * std::f32::consts::PI * 440.0 * i as f32 / self.sample_rate as f32).sin()
                    * 0.5
            })
            .collect();
        SynthesisOutput {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    fn answer(
        &self,
        count: usize,
        length_penalty: Option<f32>,
    ) -> Result<SynthesisOutput, EngineError> {
        if self.empty_on_attempts.contains(&count) {
            return Ok(SynthesisOutput {
                samples: Vec::new(),
                sample_rate: self.sample_rate,
            });
        }

        match self.behavior {
            MockBehavior::Failing => Err(EngineError::RequestFailed(
                "Simulated engine failure".to_string(),
            )),
            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(EngineError::RequestFailed(format!(
                        "Simulated intermittent failure (request #{})",
                        count + 1
                    )))
                } else {
                    Ok(self.tone(self.resolve_duration(length_penalty)))
                }
            }
            MockBehavior::EmptyAudio => Ok(SynthesisOutput {
                samples: Vec::new(),
                sample_rate: self.sample_rate,
            }),
            _ => Ok(self.tone(self.resolve_duration(length_penalty))),
        }
    }
}

impl Clone for MockTtsEngine {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            sample_rate: self.sample_rate,
            supports_targeting: self.supports_targeting,
            jitter: None,
            jitter_fraction: self.jitter_fraction,
            call_count: Arc::clone(&self.call_count),
            empty_on_attempts: self.empty_on_attempts.clone(),
        }
    }
}

#[async_trait]
impl TtsEngine for MockTtsEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisOutput, EngineError> {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.answer(count, request.length_penalty)
    }

    async fn synthesize_to_duration(
        &self,
        request: &SynthesisRequest,
        target_duration: f64,
    ) -> Result<SynthesisOutput, EngineError> {
        if !self.supports_targeting {
            return Err(EngineError::CapabilityNotSupported {
                engine: self.name().to_string(),
                operation: "synthesize_to_duration".to_string(),
            });
        }

        let count = self.call_count.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            // Penalty-steered behaviors ignore the target so the caller's
            // search actually drives convergence
            MockBehavior::ParamDriven { .. } | MockBehavior::NonMonotonic { .. } => {
                self.answer(count, request.length_penalty)
            }
            MockBehavior::FixedDuration { .. } => {
                if self.empty_on_attempts.contains(&count) {
                    return Ok(SynthesisOutput {
                        samples: Vec::new(),
                        sample_rate: self.sample_rate,
                    });
                }
                Ok(self.tone(self.apply_jitter(target_duration)))
            }
            _ => self.answer(count, request.length_penalty),
        }
    }

    fn supports_duration_targeting(&self) -> bool {
        self.supports_targeting
    }
}
