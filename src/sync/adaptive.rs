/*!
 * Adaptive strategy: bounded binary search over the length penalty using
 * duration-targeted synthesis.
 *
 * Only works against engines that implement `synthesize_to_duration`; asking
 * for it on any other engine is a configuration error that aborts the batch.
 * The search assumes larger penalties shorten the output. The first two
 * attempts double as a monotonicity probe: when the observed durations move
 * against the assumption the search stops and the best attempt so far goes
 * through the stretch refinement instead.
 */

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};

use crate::app_config::SyncConfig;
use crate::audio::compositor::CompositionMode;
use crate::audio::AudioSegment;
use crate::engines::TtsEngine;
use crate::errors::{DubError, EngineError};
use crate::subtitle_processor::SubtitleCue;
use crate::sync::generation::{best_attempt, GenerationAttempt, Synthesizer};
use crate::sync::iterative::PENALTY_DOMAIN;
use crate::sync::{SyncStrategy, MIN_TARGET_DURATION};

pub struct AdaptiveStrategy {
    synth: Synthesizer,
    max_attempts: u32,
    tolerance_secs: f64,
    band: (f64, f64),
    threshold: f64,
}

impl AdaptiveStrategy {
    pub fn new(engine: Arc<dyn TtsEngine>, config: &SyncConfig, sample_rate: u32) -> Self {
        Self {
            synth: Synthesizer::new(engine, sample_rate),
            max_attempts: config.adaptive_max_attempts,
            tolerance_secs: config.adaptive_tolerance_secs,
            band: (config.min_speed_factor, config.max_speed_factor),
            threshold: config.stretch_threshold,
        }
    }

    /// Stretch-refine the best attempt; the fallback path when the engine's
    /// penalty response turned out not to be monotonic
    fn refined_segment(
        &self,
        cue: &SubtitleCue,
        attempts: &[GenerationAttempt],
        target: f64,
    ) -> Result<AudioSegment, DubError> {
        let best = best_attempt(attempts, target)
            .ok_or_else(|| DubError::from(EngineError::EmptyAudio(cue.text.clone())))?;
        let adjusted =
            self.synth
                .stretch_to_target(best.samples.clone(), target, self.band, self.threshold)?;
        Ok(AudioSegment::new(
            cue.index,
            cue.start_time,
            adjusted,
            self.synth.sample_rate(),
        ))
    }
}

#[async_trait]
impl SyncStrategy for AdaptiveStrategy {
    fn name(&self) -> &'static str {
        "adaptive"
    }

    fn description(&self) -> &'static str {
        "Binary search over the penalty, requires duration targeting"
    }

    fn sample_rate(&self) -> u32 {
        self.synth.sample_rate()
    }

    fn preferred_composition(&self) -> CompositionMode {
        CompositionMode::NaturalConcatenation
    }

    async fn process_cue(
        &self,
        cue: &SubtitleCue,
        voice_reference: &Path,
    ) -> Result<AudioSegment, DubError> {
        // Capability check up front so misconfiguration surfaces on the
        // first cue, not somewhere mid-batch
        if !self.synth.engine().supports_duration_targeting() {
            return Err(EngineError::CapabilityNotSupported {
                engine: self.synth.engine().name().to_string(),
                operation: "synthesize_to_duration".to_string(),
            }
            .into());
        }

        let target = cue.target_duration();
        if target < MIN_TARGET_DURATION {
            debug!("Cue {} target {:.3}s is degenerate, synthesizing as-is", cue.index, target);
            return self.synth.raw_segment(cue, voice_reference).await;
        }

        let (mut lo, mut hi) = PENALTY_DOMAIN;
        let mut attempts: Vec<GenerationAttempt> = Vec::with_capacity(self.max_attempts as usize);

        for attempt_index in 0..self.max_attempts {
            let mid = (lo + hi) / 2.0;
            let samples = self
                .synth
                .generate_to_duration(&cue.text, voice_reference, Some(mid as f32), target)
                .await?;
            let attempt = GenerationAttempt::new(mid, samples, self.synth.sample_rate());

            if !attempt.valid {
                return Err(EngineError::EmptyAudio(cue.text.clone()).into());
            }

            debug!(
                "Cue {}: attempt {} at penalty {:.3} gave {:.3}s (target {:.3}s)",
                cue.index,
                attempt_index + 1,
                mid,
                attempt.duration,
                target
            );

            let achieved = attempt.duration;
            attempts.push(attempt);

            if (achieved - target).abs() < self.tolerance_secs {
                break;
            }

            // Monotonicity probe: larger penalty must have shortened the
            // output between the first two attempts
            if attempts.len() == 2 {
                let first = &attempts[0];
                let second = &attempts[1];
                let penalty_step = second.penalty - first.penalty;
                let duration_step = second.duration - first.duration;
                if penalty_step * duration_step > 0.0 {
                    warn!(
                        "Cue {}: penalty response is not monotonic \
                         ({:+.3} penalty moved duration by {:+.3}s), \
                         falling back to stretch refinement",
                        cue.index, penalty_step, duration_step
                    );
                    return self.refined_segment(cue, &attempts, target);
                }
            }

            // Too long means we need a larger penalty
            if achieved > target {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let best = best_attempt(&attempts, target)
            .ok_or_else(|| DubError::from(EngineError::EmptyAudio(cue.text.clone())))?;

        debug!(
            "Cue {}: selected penalty {:.3} with {:.3}s after {} attempts",
            cue.index,
            best.penalty,
            best.duration,
            attempts.len()
        );

        Ok(AudioSegment::new(
            cue.index,
            cue.start_time,
            best.samples.clone(),
            self.synth.sample_rate(),
        ))
    }
}
