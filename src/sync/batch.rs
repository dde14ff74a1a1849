/*!
 * Concurrent batch processing of cues.
 *
 * This module contains the bounded-concurrency variant of the per-cue loop,
 * with support for progress tracking and the same per-cue error handling as
 * the sequential path: degrade to silence, except for capability errors
 * which abort the whole batch.
 */

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use log::warn;
use tokio::sync::Semaphore;

use crate::audio::AudioSegment;
use crate::errors::DubError;
use crate::subtitle_processor::SubtitleCue;
use crate::sync::SyncStrategy;

/// Batch runner for processing cues concurrently
pub struct BatchRunner {
    /// The strategy to run per cue
    strategy: Arc<dyn SyncStrategy>,

    /// Maximum number of in-flight synthesis calls
    max_concurrent_requests: usize,
}

impl BatchRunner {
    /// Create a new batch runner
    pub fn new(strategy: Arc<dyn SyncStrategy>, max_concurrent_requests: usize) -> Self {
        Self {
            strategy,
            max_concurrent_requests: max_concurrent_requests.max(1),
        }
    }

    /// Process all cues, at most `max_concurrent_requests` at a time.
    ///
    /// Results are returned in cue order regardless of completion order.
    pub async fn run(
        &self,
        cues: &[SubtitleCue],
        voice_reference: &Path,
        progress_callback: impl Fn(usize, usize) + Clone + Send + 'static,
    ) -> Result<Vec<AudioSegment>, DubError> {
        // Create a semaphore to limit concurrent requests
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_requests));

        let total = cues.len();
        let processed = Arc::new(AtomicUsize::new(0));

        // Process cues concurrently
        let results = stream::iter(cues.iter().cloned().enumerate())
            .map(|(slot, cue)| {
                let strategy = Arc::clone(&self.strategy);
                let semaphore = semaphore.clone();
                let processed = processed.clone();
                let progress_callback = progress_callback.clone();
                let voice_reference = voice_reference.to_path_buf();

                async move {
                    // Acquire a permit from the semaphore
                    let _permit = semaphore.acquire().await.unwrap();

                    let result = strategy.process_cue(&cue, &voice_reference).await;

                    // Update progress
                    let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress_callback(current, total);

                    (slot, cue, result)
                }
            })
            .buffer_unordered(self.max_concurrent_requests)
            .collect::<Vec<_>>()
            .await;

        // Sort results by slot to restore cue order
        let mut sorted_results = results;
        sorted_results.sort_by_key(|(slot, _, _)| *slot);

        let mut segments = Vec::with_capacity(total);
        for (_, cue, result) in sorted_results {
            match result {
                Ok(segment) => segments.push(segment),
                Err(e) if e.is_capability() => return Err(e),
                Err(e) => {
                    warn!(
                        "Cue {} failed ({}), inserting {:.2}s of silence",
                        cue.index,
                        e,
                        cue.target_duration()
                    );
                    segments.push(AudioSegment::silence(
                        cue.index,
                        cue.start_time,
                        cue.target_duration(),
                        self.strategy.sample_rate(),
                    ));
                }
            }
        }

        Ok(segments)
    }
}
