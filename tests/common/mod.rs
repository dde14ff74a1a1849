/*!
 * Common test utilities for the dubwai test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use dubwai::audio::wav;
use dubwai::subtitle_processor::SubtitleCue;

/// Initializes log capture for tests; enable with RUST_LOG=debug
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a sample subtitle file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    let content = r#"1
00:00:01,000 --> 00:00:03,000
This is a test subtitle.

2
00:00:04,000 --> 00:00:06,500
It contains multiple cues.

3
00:00:07,000 --> 00:00:09,000
For testing purposes.
"#;
    create_test_file(dir, filename, content)
}

/// Creates a short mono voice reference WAV in the given directory
pub fn create_test_voice(dir: &Path, filename: &str) -> Result<PathBuf> {
    let path = dir.join(filename);
    let samples: Vec<f32> = (0..22050)
        .map(|i| (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 22050.0).sin() * 0.4)
        .collect();
    wav::write_wav(&path, &samples, 22050)?;
    Ok(path)
}

/// Builds a cue covering `[start, start + duration)` seconds
pub fn cue(index: usize, start: f64, duration: f64) -> SubtitleCue {
    SubtitleCue::new(
        index,
        start,
        start + duration,
        format!("Test cue number {}", index),
    )
}
