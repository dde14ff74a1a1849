/*!
 * Stretch strategy: one synthesis call, then time-domain stretching into a
 * speed band.
 *
 * Two presets share this implementation: `stretch` with the standard band
 * and `stretch_hq` with the tighter quality-preserving band, which accepts
 * more residual drift in exchange for fewer audible artifacts.
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
use crate::sync::{SyncStrategy, MIN_TARGET_DURATION};

pub struct StretchStrategy {
    synth: Synthesizer,
    band: (f64, f64),
    threshold: f64,
    quality: bool,
}

impl StretchStrategy {
    /// Standard band preset (registered as `stretch`)
    pub fn standard(engine: Arc<dyn TtsEngine>, config: &SyncConfig, sample_rate: u32) -> Self {
        Self {
            synth: Synthesizer::new(engine, sample_rate),
            band: (config.min_speed_factor, config.max_speed_factor),
            threshold: config.stretch_threshold,
            quality: false,
        }
    }

    /// Quality band preset (registered as `stretch_hq`)
    pub fn quality(engine: Arc<dyn TtsEngine>, config: &SyncConfig, sample_rate: u32) -> Self {
        Self {
            synth: Synthesizer::new(engine, sample_rate),
            band: (config.quality_min_speed, config.quality_max_speed),
            threshold: config.stretch_threshold,
            quality: true,
        }
    }
}

#[async_trait]
impl SyncStrategy for StretchStrategy {
    fn name(&self) -> &'static str {
        if self.quality {
            "stretch_hq"
        } else {
            "stretch"
        }
    }

    fn description(&self) -> &'static str {
        if self.quality {
            "Time-stretch limited to the quality band (0.8-1.3)"
        } else {
            "Time-stretch into the standard speed band (0.7-1.5)"
        }
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

        let samples = self.synth.generate(&cue.text, voice_reference, None).await?;
        if samples.is_empty() {
            return Err(EngineError::EmptyAudio(cue.text.clone()).into());
        }

        let adjusted = self
            .synth
            .stretch_to_target(samples, target, self.band, self.threshold)?;

        Ok(AudioSegment::new(
            cue.index,
            cue.start_time,
            adjusted,
            self.synth.sample_rate(),
        ))
    }
}
