/*!
 * High-quality stretch strategy.
 *
 * Same single-call flow as `stretch`, but the transform is a hybrid: the
 * time-domain overlap-add kernel (transient-friendly) blended 0.75/0.25 with
 * a phase-vocoder stretch (smoother on tonal material) at the same clamped
 * rate, the vocoder output reconciled to the overlap-add length. Uses the
 * quality-preserving band and classifies the quality risk of each cue from
 * how far the clamped rate sits from 1.0.
 */

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};

use crate::app_config::SyncConfig;
use crate::audio::compositor::CompositionMode;
use crate::audio::{limit_peak, stretch, vocoder, AudioSegment};
use crate::engines::TtsEngine;
use crate::errors::{DubError, EngineError};
use crate::subtitle_processor::SubtitleCue;
use crate::sync::generation::Synthesizer;
use crate::sync::{SyncStrategy, MIN_TARGET_DURATION};

/// Overlap-add share of the blend
const PRIMARY_WEIGHT: f32 = 0.75;

/// Quality risk classification for one cue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityRisk {
    Low,
    Medium,
    High,
}

impl QualityRisk {
    /// Classify from the clamped rate's deviation from 1.0
    pub fn from_rate(rate: f64) -> Self {
        let deviation = (rate - 1.0).abs();
        if deviation <= 0.15 {
            QualityRisk::Low
        } else if deviation <= 0.25 {
            QualityRisk::Medium
        } else {
            QualityRisk::High
        }
    }
}

pub struct HqStretchStrategy {
    synth: Synthesizer,
    band: (f64, f64),
    threshold: f64,
}

impl HqStretchStrategy {
    pub fn new(engine: Arc<dyn TtsEngine>, config: &SyncConfig, sample_rate: u32) -> Self {
        Self {
            synth: Synthesizer::new(engine, sample_rate),
            band: (config.quality_min_speed, config.quality_max_speed),
            threshold: config.stretch_threshold,
        }
    }

    /// Blend the two kernels at the same rate, vocoder output resized to the
    /// overlap-add length
    fn hybrid_stretch(&self, samples: &[f32], rate: f64) -> Result<Vec<f32>, DubError> {
        let primary = stretch::stretch(samples, rate)?;
        let mut secondary = vocoder::stretch(samples, rate)?;
        secondary.resize(primary.len(), 0.0);

        let mut blended: Vec<f32> = primary
            .iter()
            .zip(secondary.iter())
            .map(|(a, b)| a * PRIMARY_WEIGHT + b * (1.0 - PRIMARY_WEIGHT))
            .collect();
        limit_peak(&mut blended);
        Ok(blended)
    }
}

#[async_trait]
impl SyncStrategy for HqStretchStrategy {
    fn name(&self) -> &'static str {
        "hq_stretch"
    }

    fn description(&self) -> &'static str {
        "Hybrid time/frequency-domain stretch with quality risk reporting"
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

        let samples = self.synth.generate(&cue.text, voice_reference, None).await?;
        if samples.is_empty() {
            return Err(EngineError::EmptyAudio(cue.text.clone()).into());
        }

        let sample_rate = self.synth.sample_rate();
        let source_duration = samples.len() as f64 / sample_rate as f64;
        let rate = source_duration / target;
        let target_len = (target * sample_rate as f64).round() as usize;

        let adjusted = if (rate - 1.0).abs() <= self.threshold {
            samples
        } else {
            let (clamped, was_clamped) = stretch::clamp_rate(rate, self.band.0, self.band.1);
            if was_clamped {
                warn!(
                    "Cue {}: required speed factor {:.3} outside the quality band [{}, {}], clamping to {:.3}",
                    cue.index, rate, self.band.0, self.band.1, clamped
                );
            }

            match QualityRisk::from_rate(clamped) {
                QualityRisk::Low => debug!("Cue {}: low quality risk at rate {:.3}", cue.index, clamped),
                QualityRisk::Medium => {
                    info!("Cue {}: medium quality risk at rate {:.3}", cue.index, clamped)
                }
                QualityRisk::High => {
                    warn!("Cue {}: high quality risk at rate {:.3}", cue.index, clamped)
                }
            }

            self.hybrid_stretch(&samples, clamped)?
        };

        Ok(AudioSegment::new(
            cue.index,
            cue.start_time,
            stretch::pad_to_target(adjusted, target_len),
            sample_rate,
        ))
    }
}
