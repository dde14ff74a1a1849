/*!
 * Shared engine-call plumbing for the strategies.
 *
 * Every engine answer passes through here: resampled to the batch rate and
 * peak-limited before any strategy looks at its duration. Attempt
 * bookkeeping for the search-based strategies also lives here.
 */

use std::path::Path;
use std::sync::Arc;

use crate::audio::{limit_peak, resample, stretch, AudioSegment};
use crate::engines::{SynthesisRequest, TtsEngine};
use crate::errors::{DubError, EngineError};
use crate::subtitle_processor::SubtitleCue;

/// Engine handle plus the batch rate its answers are normalized to
pub struct Synthesizer {
    engine: Arc<dyn TtsEngine>,
    sample_rate: u32,
}

impl Synthesizer {
    pub fn new(engine: Arc<dyn TtsEngine>, sample_rate: u32) -> Self {
        Self {
            engine,
            sample_rate,
        }
    }

    pub fn engine(&self) -> &Arc<dyn TtsEngine> {
        &self.engine
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// One synthesis call, normalized to the batch rate. Empty engine output
    /// comes back as an empty sample vector, callers decide whether that is
    /// an error or an invalid attempt.
    pub async fn generate(
        &self,
        text: &str,
        voice_reference: &Path,
        length_penalty: Option<f32>,
    ) -> Result<Vec<f32>, DubError> {
        let mut request = SynthesisRequest::new(text, voice_reference);
        if let Some(penalty) = length_penalty {
            request = request.with_length_penalty(penalty);
        }

        let output = self.engine.synthesize(&request).await?;
        self.normalize(output.samples, output.sample_rate)
    }

    /// One duration-targeted synthesis call, normalized to the batch rate
    pub async fn generate_to_duration(
        &self,
        text: &str,
        voice_reference: &Path,
        length_penalty: Option<f32>,
        target_duration: f64,
    ) -> Result<Vec<f32>, DubError> {
        let mut request = SynthesisRequest::new(text, voice_reference);
        if let Some(penalty) = length_penalty {
            request = request.with_length_penalty(penalty);
        }

        let output = self
            .engine
            .synthesize_to_duration(&request, target_duration)
            .await?;
        self.normalize(output.samples, output.sample_rate)
    }

    fn normalize(&self, samples: Vec<f32>, source_rate: u32) -> Result<Vec<f32>, DubError> {
        let mut samples = resample::resample(&samples, source_rate, self.sample_rate)?;
        limit_peak(&mut samples);
        Ok(samples)
    }

    /// The degenerate-target path: one raw synthesis, no correction
    pub async fn raw_segment(
        &self,
        cue: &SubtitleCue,
        voice_reference: &Path,
    ) -> Result<AudioSegment, DubError> {
        let samples = self.generate(&cue.text, voice_reference, None).await?;
        if samples.is_empty() {
            return Err(EngineError::EmptyAudio(cue.text.clone()).into());
        }
        Ok(AudioSegment::new(
            cue.index,
            cue.start_time,
            samples,
            self.sample_rate,
        ))
    }

    /// Stretch-clamp-pad refinement shared by several strategies: compute the
    /// rate that fills the window, clamp it into the band, skip stretching
    /// for deviations under the threshold, and pad undershoot with trailing
    /// silence. Overshoot is kept whole, speech is never truncated.
    pub fn stretch_to_target(
        &self,
        samples: Vec<f32>,
        target_duration: f64,
        band: (f64, f64),
        threshold: f64,
    ) -> Result<Vec<f32>, DubError> {
        let target_len = (target_duration * self.sample_rate as f64).round() as usize;
        if samples.is_empty() {
            return Ok(vec![0.0; target_len]);
        }

        let source_duration = samples.len() as f64 / self.sample_rate as f64;
        let rate = source_duration / target_duration;

        let stretched = if (rate - 1.0).abs() <= threshold {
            samples
        } else {
            let (clamped, was_clamped) = stretch::clamp_rate(rate, band.0, band.1);
            if was_clamped {
                log::warn!(
                    "Required speed factor {:.3} outside the band [{}, {}], clamping to {:.3}",
                    rate,
                    band.0,
                    band.1,
                    clamped
                );
            }
            stretch::stretch(&samples, clamped)?
        };

        Ok(stretch::pad_to_target(stretched, target_len))
    }
}

/// One synthesis attempt of a search-based strategy
#[derive(Debug, Clone)]
pub struct GenerationAttempt {
    /// Length penalty this attempt was made with
    pub penalty: f64,
    /// Normalized samples
    pub samples: Vec<f32>,
    /// Duration in seconds at the batch rate
    pub duration: f64,
    /// Zero-length attempts are recorded but never selected
    pub valid: bool,
}

impl GenerationAttempt {
    pub fn new(penalty: f64, samples: Vec<f32>, sample_rate: u32) -> Self {
        let duration = samples.len() as f64 / sample_rate as f64;
        let valid = !samples.is_empty();
        Self {
            penalty,
            samples,
            duration,
            valid,
        }
    }

    /// Achieved over target
    pub fn ratio(&self, target: f64) -> f64 {
        self.duration / target
    }

    /// Absolute duration error in seconds
    pub fn absolute_diff(&self, target: f64) -> f64 {
        (self.duration - target).abs()
    }
}

/// Pick the valid attempt with the smallest absolute duration error
pub fn best_attempt(attempts: &[GenerationAttempt], target: f64) -> Option<&GenerationAttempt> {
    attempts
        .iter()
        .filter(|a| a.valid)
        .min_by(|a, b| a.absolute_diff(target).total_cmp(&b.absolute_diff(target)))
}
