/*!
 * Two-stage strategy: a baseline synthesis, at most one corrective
 * resynthesis, and a stretch refinement at the end.
 *
 * When the baseline already lands near the window (ratio within
 * [0.85, 1.15]) the stretch refinement alone closes the gap. Further out, a
 * single resynthesis with a corrective length penalty gets the duration into
 * range first, and that second result is always refined.
 */

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::app_config::SyncConfig;
use crate::audio::compositor::CompositionMode;
use crate::audio::AudioSegment;
use crate::engines::TtsEngine;
use crate::errors::{DubError, EngineError};
use crate::subtitle_processor::SubtitleCue;
use crate::sync::generation::Synthesizer;
use crate::sync::iterative::PENALTY_DOMAIN;
use crate::sync::{SyncStrategy, MIN_TARGET_DURATION};

/// Baseline ratios inside this window skip the corrective resynthesis
const REFINE_ONLY_WINDOW: (f64, f64) = (0.85, 1.15);

/// Feedback gain for the corrective penalty
const CORRECTION_GAIN: f64 = 1.5;

pub struct TwoStageStrategy {
    synth: Synthesizer,
    band: (f64, f64),
    threshold: f64,
}

impl TwoStageStrategy {
    pub fn new(engine: Arc<dyn TtsEngine>, config: &SyncConfig, sample_rate: u32) -> Self {
        Self {
            synth: Synthesizer::new(engine, sample_rate),
            band: (config.min_speed_factor, config.max_speed_factor),
            threshold: config.stretch_threshold,
        }
    }
}

#[async_trait]
impl SyncStrategy for TwoStageStrategy {
    fn name(&self) -> &'static str {
        "two_stage"
    }

    fn description(&self) -> &'static str {
        "One corrective resynthesis, then stretch refinement"
    }

    fn sample_rate(&self) -> u32 {
        self.synth.sample_rate()
    }

    fn preferred_composition(&self) -> CompositionMode {
        CompositionMode::TimeSynchronized
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

        let sample_rate = self.synth.sample_rate();

        let baseline = self.synth.generate(&cue.text, voice_reference, None).await?;
        if baseline.is_empty() {
            return Err(EngineError::EmptyAudio(cue.text.clone()).into());
        }

        let ratio = baseline.len() as f64 / sample_rate as f64 / target;

        let to_refine = if ratio >= REFINE_ONLY_WINDOW.0 && ratio <= REFINE_ONLY_WINDOW.1 {
            debug!(
                "Cue {}: baseline ratio {:.3} within refine-only window",
                cue.index, ratio
            );
            baseline
        } else {
            let penalty =
                (-(ratio - 1.0) * CORRECTION_GAIN).clamp(PENALTY_DOMAIN.0, PENALTY_DOMAIN.1);
            debug!(
                "Cue {}: baseline ratio {:.3}, resynthesizing at penalty {:.2}",
                cue.index, ratio, penalty
            );

            let corrected = self
                .synth
                .generate(&cue.text, voice_reference, Some(penalty as f32))
                .await?;
            if corrected.is_empty() {
                return Err(EngineError::EmptyAudio(cue.text.clone()).into());
            }
            corrected
        };

        let adjusted = self
            .synth
            .stretch_to_target(to_refine, target, self.band, self.threshold)?;

        Ok(AudioSegment::new(
            cue.index,
            cue.start_time,
            adjusted,
            sample_rate,
        ))
    }
}
