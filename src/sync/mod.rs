/*!
 * Duration-matching strategies.
 *
 * A strategy drives the synthesis engine so each cue's audio fills its
 * subtitle window. The engine is a black box; strategies differ in how many
 * synthesis calls they spend and whether they post-process the result:
 *
 * - `direct`: One call per cue, no correction
 * - `stretch`: One call plus time-domain stretching into the speed band
 * - `stretch_hq`: `stretch` with the tighter quality-preserving band
 * - `hq_stretch`: Hybrid time/frequency-domain stretching
 * - `iterative`: Resynthesis loop steered by the length penalty
 * - `two_stage`: One corrective resynthesis, then stretch refinement
 * - `adaptive`: Binary search over the penalty, needs duration targeting
 */

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use log::warn;

use crate::app_config::SyncConfig;
use crate::audio::compositor::CompositionMode;
use crate::audio::AudioSegment;
use crate::engines::TtsEngine;
use crate::errors::DubError;
use crate::subtitle_processor::SubtitleCue;

pub mod adaptive;
pub mod batch;
pub mod direct;
pub mod generation;
pub mod hq_stretch;
pub mod iterative;
pub mod stretch;
pub mod two_stage;

/// Targets below this are degenerate; they get one direct synthesis with no
/// duration correction
pub const MIN_TARGET_DURATION: f64 = 0.1;

/// Per-cue progress callback: (processed, total)
pub type ProgressFn = dyn Fn(usize, usize) + Send + Sync;

/// Common trait for all duration-matching strategies
#[async_trait]
pub trait SyncStrategy: Send + Sync {
    /// Registry name
    fn name(&self) -> &'static str;

    /// One-line description for `--list-strategies`
    fn description(&self) -> &'static str;

    /// Batch sample rate every returned segment is carried at
    fn sample_rate(&self) -> u32;

    /// Merge mode this strategy's output is meant for
    fn preferred_composition(&self) -> CompositionMode;

    /// Produce the audio segment for one cue
    async fn process_cue(
        &self,
        cue: &SubtitleCue,
        voice_reference: &Path,
    ) -> Result<AudioSegment, DubError>;

    /// Process a whole cue sheet sequentially.
    ///
    /// Per-cue failures degrade to silence covering the cue's window so one
    /// bad cue cannot sink the batch; capability mismatches are configuration
    /// errors and abort immediately.
    async fn process_entries(
        &self,
        cues: &[SubtitleCue],
        voice_reference: &Path,
        progress: Option<&(dyn Fn(usize, usize) + Send + Sync)>,
    ) -> Result<Vec<AudioSegment>, DubError> {
        let total = cues.len();
        let mut segments = Vec::with_capacity(total);

        for (done, cue) in cues.iter().enumerate() {
            let segment = match self.process_cue(cue, voice_reference).await {
                Ok(segment) => segment,
                Err(e) if e.is_capability() => return Err(e),
                Err(e) => {
                    warn!(
                        "Cue {} failed ({}), inserting {:.2}s of silence",
                        cue.index,
                        e,
                        cue.target_duration()
                    );
                    AudioSegment::silence(
                        cue.index,
                        cue.start_time,
                        cue.target_duration(),
                        self.sample_rate(),
                    )
                }
            };
            segments.push(segment);

            if let Some(callback) = progress {
                callback(done + 1, total);
            }
        }

        Ok(segments)
    }
}

/// Constructor signature stored in the registry
pub type StrategyFactory =
    fn(Arc<dyn TtsEngine>, &SyncConfig, u32) -> Arc<dyn SyncStrategy>;

/// One registry row
pub struct StrategyEntry {
    pub description: &'static str,
    pub factory: StrategyFactory,
}

/// The explicit strategy table. Built on demand, ordered by name; adding a
/// strategy means adding a row here.
pub fn build_registry() -> BTreeMap<&'static str, StrategyEntry> {
    let mut registry: BTreeMap<&'static str, StrategyEntry> = BTreeMap::new();

    registry.insert(
        "direct",
        StrategyEntry {
            description: "One synthesis call per cue, no duration correction",
            factory: |engine, config, rate| {
                Arc::new(direct::DirectStrategy::new(engine, config, rate))
            },
        },
    );
    registry.insert(
        "stretch",
        StrategyEntry {
            description: "Time-stretch into the standard speed band (0.7-1.5)",
            factory: |engine, config, rate| {
                Arc::new(stretch::StretchStrategy::standard(engine, config, rate))
            },
        },
    );
    registry.insert(
        "stretch_hq",
        StrategyEntry {
            description: "Time-stretch limited to the quality band (0.8-1.3)",
            factory: |engine, config, rate| {
                Arc::new(stretch::StretchStrategy::quality(engine, config, rate))
            },
        },
    );
    registry.insert(
        "hq_stretch",
        StrategyEntry {
            description: "Hybrid time/frequency-domain stretch with quality risk reporting",
            factory: |engine, config, rate| {
                Arc::new(hq_stretch::HqStretchStrategy::new(engine, config, rate))
            },
        },
    );
    registry.insert(
        "iterative",
        StrategyEntry {
            description: "Resynthesis loop steered by the length penalty",
            factory: |engine, config, rate| {
                Arc::new(iterative::IterativeStrategy::new(engine, config, rate))
            },
        },
    );
    registry.insert(
        "two_stage",
        StrategyEntry {
            description: "One corrective resynthesis, then stretch refinement",
            factory: |engine, config, rate| {
                Arc::new(two_stage::TwoStageStrategy::new(engine, config, rate))
            },
        },
    );
    registry.insert(
        "adaptive",
        StrategyEntry {
            description: "Binary search over the penalty, requires duration targeting",
            factory: |engine, config, rate| {
                Arc::new(adaptive::AdaptiveStrategy::new(engine, config, rate))
            },
        },
    );

    registry
}

/// Whether `name` is a registered strategy
pub fn is_known_strategy(name: &str) -> bool {
    build_registry().contains_key(name)
}

/// Registered strategy names, sorted
pub fn list_strategies() -> Vec<&'static str> {
    build_registry().keys().copied().collect()
}

/// Description for one strategy name
pub fn strategy_info(name: &str) -> Option<&'static str> {
    build_registry().get(name).map(|entry| entry.description)
}

/// Instantiate a strategy by name
pub fn create_strategy(
    name: &str,
    engine: Arc<dyn TtsEngine>,
    config: &SyncConfig,
    sample_rate: u32,
) -> Option<Arc<dyn SyncStrategy>> {
    build_registry()
        .get(name)
        .map(|entry| (entry.factory)(engine, config, sample_rate))
}
