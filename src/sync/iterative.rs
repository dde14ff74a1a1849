/*!
 * Iterative strategy: a resynthesis loop steered by the length penalty.
 *
 * Attempt 0 runs at penalty 0.0. After each attempt the penalty is nudged
 * against the duration error of the best attempt so far; the loop stops as
 * soon as an attempt lands within the relative tolerance. On exhaustion the
 * globally closest attempt wins, so the result never regresses below the
 * first attempt.
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
use crate::sync::{SyncStrategy, MIN_TARGET_DURATION};

/// Length penalty domain accepted by the engines
pub const PENALTY_DOMAIN: (f64, f64) = (-2.0, 2.0);

pub struct IterativeStrategy {
    synth: Synthesizer,
    max_attempts: u32,
    tolerance: f64,
    adjustment_factor: f64,
}

impl IterativeStrategy {
    pub fn new(engine: Arc<dyn TtsEngine>, config: &SyncConfig, sample_rate: u32) -> Self {
        Self {
            synth: Synthesizer::new(engine, sample_rate),
            max_attempts: config.iterative_max_attempts,
            tolerance: config.iterative_tolerance,
            adjustment_factor: config.adjustment_factor,
        }
    }
}

#[async_trait]
impl SyncStrategy for IterativeStrategy {
    fn name(&self) -> &'static str {
        "iterative"
    }

    fn description(&self) -> &'static str {
        "Resynthesis loop steered by the length penalty"
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
        let target = cue.target_duration();
        if target < MIN_TARGET_DURATION {
            debug!("Cue {} target {:.3}s is degenerate, synthesizing as-is", cue.index, target);
            return self.synth.raw_segment(cue, voice_reference).await;
        }

        let mut attempts: Vec<GenerationAttempt> = Vec::with_capacity(self.max_attempts as usize);
        let mut penalty = 0.0f64;

        for attempt_index in 0..self.max_attempts {
            let samples = self
                .synth
                .generate(&cue.text, voice_reference, Some(penalty as f32))
                .await?;
            let attempt = GenerationAttempt::new(penalty, samples, self.synth.sample_rate());

            if !attempt.valid {
                warn!(
                    "Cue {}: attempt {} produced no audio, recording as invalid",
                    cue.index,
                    attempt_index + 1
                );
            } else {
                debug!(
                    "Cue {}: attempt {} at penalty {:.2} gave {:.3}s (target {:.3}s)",
                    cue.index,
                    attempt_index + 1,
                    penalty,
                    attempt.duration,
                    target
                );
            }

            let done = attempt.valid && (attempt.ratio(target) - 1.0).abs() <= self.tolerance;
            attempts.push(attempt);
            if done {
                break;
            }

            // Steer the next attempt by the best observation so far
            if let Some(best) = best_attempt(&attempts, target) {
                let ratio = best.ratio(target);
                penalty = (penalty - (ratio - 1.0) * self.adjustment_factor)
                    .clamp(PENALTY_DOMAIN.0, PENALTY_DOMAIN.1);
            }
        }

        let best = best_attempt(&attempts, target)
            .ok_or_else(|| DubError::from(EngineError::EmptyAudio(cue.text.clone())))?;

        debug!(
            "Cue {}: selected attempt at penalty {:.2} with {:.3}s after {} attempts",
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
