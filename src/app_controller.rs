use anyhow::{Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::app_config::{CompositionModeSetting, Config, EngineProvider};
use crate::audio::compositor::{self, CompositionMode, CompositionOptions};
use crate::audio::{wav, AudioSegment};
use crate::engines::http::HttpTtsEngine;
use crate::engines::mock::MockTtsEngine;
use crate::engines::TtsEngine;
use crate::file_utils::FileManager;
use crate::subtitle_processor::CueSheet;
use crate::sync::batch::BatchRunner;
use crate::sync::{self, SyncStrategy};

// @module: Application controller for the dubbing pipeline

/// Main application controller for subtitle dubbing
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes: default configuration
    /// pointed at the mock engine so no synthesis server is needed
    pub fn new_for_test() -> Result<Self> {
        let mut config = Config::default();
        config.engine.provider = EngineProvider::Mock;
        Self::with_config(config)
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    /// Run the main workflow: subtitle file plus voice reference in, dubbed
    /// WAV out
    pub async fn run(
        &self,
        subtitle_file: PathBuf,
        voice_reference: PathBuf,
        output_path: PathBuf,
    ) -> Result<()> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(subtitle_file, voice_reference, output_path, &multi_progress)
            .await
    }

    /// Run the controller with progress reporting
    async fn run_with_progress(
        &self,
        subtitle_file: PathBuf,
        voice_reference: PathBuf,
        output_path: PathBuf,
        multi_progress: &MultiProgress,
    ) -> Result<()> {
        // Start timing the process
        let start_time = std::time::Instant::now();

        // Input checks up front, before any synthesis is attempted
        if !FileManager::file_exists(&subtitle_file) {
            return Err(anyhow::anyhow!(
                "Subtitle file does not exist: {:?}",
                subtitle_file
            ));
        }
        if !FileManager::file_exists(&voice_reference) {
            return Err(anyhow::anyhow!(
                "Voice reference does not exist: {:?}",
                voice_reference
            ));
        }
        if let Some(parent) = output_path.parent() {
            FileManager::ensure_dir(parent)?;
        }

        // Parse the cue sheet
        let sheet = CueSheet::from_srt_file(&subtitle_file)
            .context("Failed to parse subtitle file")?;
        info!(
            "Loaded {} cues spanning {:.1}s from {}",
            sheet.cues.len(),
            sheet.total_span(),
            subtitle_file.display()
        );

        // Build the engine and strategy
        let engine = self.build_engine()?;
        let strategy = sync::create_strategy(
            &self.config.sync.strategy,
            Arc::clone(&engine),
            &self.config.sync,
            self.config.sample_rate,
        )
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown strategy '{}', available: {}",
                self.config.sync.strategy,
                sync::list_strategies().join(", ")
            )
        })?;

        info!(
            "🎙️ dubwai: {} engine - {} strategy",
            engine.name(),
            strategy.name()
        );

        // Check the engine in the background; synthesis will surface the
        // same failure per cue if the backend really is down
        {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                if let Err(e) = engine.check_ready().await {
                    warn!("Engine readiness check failed: {}", e);
                }
            });
        }

        // Synthesize all cues
        let (segments, synthesis_elapsed) = self
            .synthesize_with_progress(&sheet, &voice_reference, strategy.clone(), multi_progress)
            .await?;

        // Merge onto the timeline
        let mode = self.composition_mode(strategy.as_ref());
        let options = CompositionOptions {
            mode,
            allow_overlap: self.config.sync.allow_overlap,
            sample_rate: self.config.sample_rate,
        };
        let waveform = compositor::merge(&segments, &options)?;
        info!(
            "Composed {:.1}s of audio from {} segments",
            waveform.len() as f64 / self.config.sample_rate as f64,
            segments.len()
        );

        // Export
        wav::write_wav(&output_path, &waveform, self.config.sample_rate)?;
        info!("Success: {}", output_path.display());

        // Calculate and display the elapsed time
        let elapsed = start_time.elapsed();
        let composition_time = elapsed.checked_sub(synthesis_elapsed).unwrap_or_default();
        info!(
            "Dubbing complete. Synthesis: {} - Composition: {}",
            Self::format_duration(synthesis_elapsed),
            Self::format_duration(composition_time)
        );

        Ok(())
    }

    /// Internal method to synthesize all cues with a progress bar from the
    /// provided MultiProgress
    async fn synthesize_with_progress(
        &self,
        sheet: &CueSheet,
        voice_reference: &Path,
        strategy: Arc<dyn SyncStrategy>,
        multi_progress: &MultiProgress,
    ) -> Result<(Vec<AudioSegment>, std::time::Duration)> {
        let synthesis_start_time = std::time::Instant::now();

        // Create a progress bar for synthesis tracking
        let total_cues = sheet.cues.len() as u64;
        let progress_bar = multi_progress.add(ProgressBar::new(total_cues));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} cues ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));

        info!("Synthesizing, please wait…");
        progress_bar.set_message("Synthesizing");

        // Clone the progress_bar for use in the callback
        let pb = progress_bar.clone();

        let runner = BatchRunner::new(strategy, self.config.sync.max_concurrent_requests);
        let segments = runner
            .run(&sheet.cues, voice_reference, move |completed, _total| {
                pb.set_position(completed as u64);
            })
            .await?;

        progress_bar.finish_and_clear();

        let silent_count = segments
            .iter()
            .filter(|s| s.samples.iter().all(|&x| x == 0.0))
            .count();
        if silent_count > 0 {
            warn!(
                "{} of {} cues degraded to silence",
                silent_count,
                segments.len()
            );
        } else {
            info!("Successfully synthesized all {} cues", segments.len());
        }

        Ok((segments, synthesis_start_time.elapsed()))
    }

    /// Merge mode: config override wins, otherwise the strategy's preference
    fn composition_mode(&self, strategy: &dyn SyncStrategy) -> CompositionMode {
        match self.config.sync.composition_mode {
            Some(CompositionModeSetting::NaturalConcatenation) => {
                CompositionMode::NaturalConcatenation
            }
            Some(CompositionModeSetting::TimeSynchronized) => CompositionMode::TimeSynchronized,
            None => strategy.preferred_composition(),
        }
    }

    fn build_engine(&self) -> Result<Arc<dyn TtsEngine>> {
        match self.config.engine.provider {
            EngineProvider::Http => {
                let engine = HttpTtsEngine::from_config(&self.config.engine)
                    .context("Failed to build the HTTP synthesis engine")?;
                Ok(Arc::new(engine))
            }
            // Offline runs: a fixed two-second answer per cue, with duration
            // targeting enabled so every strategy stays usable
            EngineProvider::Mock => {
                Ok(Arc::new(MockTtsEngine::fixed(2.0).with_duration_targeting()))
            }
        }
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
