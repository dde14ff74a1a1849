/*!
 * Direct synthesis strategy: one engine call per cue, duration left alone.
 *
 * Cheapest in synthesis calls and the baseline everything else is judged
 * against. Output drifts from the subtitle windows, which is why its
 * preferred merge mode is natural concatenation.
 */

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::app_config::SyncConfig;
use crate::audio::compositor::CompositionMode;
use crate::audio::AudioSegment;
use crate::engines::TtsEngine;
use crate::errors::DubError;
use crate::subtitle_processor::SubtitleCue;
use crate::sync::generation::Synthesizer;
use crate::sync::SyncStrategy;

pub struct DirectStrategy {
    synth: Synthesizer,
}

impl DirectStrategy {
    pub fn new(engine: Arc<dyn TtsEngine>, _config: &SyncConfig, sample_rate: u32) -> Self {
        Self {
            synth: Synthesizer::new(engine, sample_rate),
        }
    }
}

#[async_trait]
impl SyncStrategy for DirectStrategy {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn description(&self) -> &'static str {
        "One synthesis call per cue, no duration correction"
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
        self.synth.raw_segment(cue, voice_reference).await
    }
}
