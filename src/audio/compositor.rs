/*!
 * Timeline compositor.
 *
 * Assembles per-cue segments into one output waveform, either back-to-back
 * (natural concatenation) or placed at their subtitle timestamps
 * (time-synchronized).
 */

use log::{debug, warn};

use crate::audio::AudioSegment;
use crate::errors::DubError;

/// Trailing headroom in samples appended past the last placed segment
const HEADROOM_SAMPLES: usize = 1024;

/// How segments are laid out on the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionMode {
    /// Back-to-back in cue order, timestamps ignored
    NaturalConcatenation,
    /// Placed at subtitle start times
    TimeSynchronized,
}

/// Options for a merge call
#[derive(Debug, Clone, Copy)]
pub struct CompositionOptions {
    pub mode: CompositionMode,
    /// Time-synchronized only: mix overlapping segments additively instead
    /// of shifting them forward
    pub allow_overlap: bool,
    pub sample_rate: u32,
}

/// Growable zero-initialized output buffer
struct CompositionBuffer {
    data: Vec<f32>,
}

impl CompositionBuffer {
    fn with_capacity(len: usize) -> Self {
        CompositionBuffer {
            data: vec![0.0; len],
        }
    }

    /// Grow to at least `len` samples, zero-padding the extension.
    /// Never shrinks.
    fn ensure_capacity(&mut self, len: usize) {
        if len > self.data.len() {
            self.data.resize(len, 0.0);
        }
    }

    fn into_inner(self) -> Vec<f32> {
        self.data
    }
}

/// Merge segments into one waveform
pub fn merge(segments: &[AudioSegment], options: &CompositionOptions) -> Result<Vec<f32>, DubError> {
    if segments.is_empty() {
        return Ok(Vec::new());
    }

    // One sample rate per batch; strategies resample on the way in, so a
    // mismatch here is a programming error upstream
    if let Some(bad) = segments
        .iter()
        .find(|s| s.sample_rate != options.sample_rate)
    {
        return Err(DubError::Composition(format!(
            "Segment {} has sample rate {} but the batch rate is {}",
            bad.index, bad.sample_rate, options.sample_rate
        )));
    }

    match options.mode {
        CompositionMode::NaturalConcatenation => Ok(natural_concatenation(segments)),
        CompositionMode::TimeSynchronized => Ok(time_synchronized(segments, options)),
    }
}

/// Back-to-back concatenation in cue order
fn natural_concatenation(segments: &[AudioSegment]) -> Vec<f32> {
    let mut ordered: Vec<&AudioSegment> = segments.iter().collect();
    ordered.sort_by_key(|s| s.index);

    let total: usize = ordered.iter().map(|s| s.samples.len()).sum();
    let mut out = Vec::with_capacity(total);

    for segment in ordered {
        if segment.is_empty() {
            warn!("Skipping empty segment for cue {}", segment.index);
            continue;
        }
        out.extend_from_slice(&segment.samples);
    }

    out
}

/// Placement at subtitle timestamps
fn time_synchronized(segments: &[AudioSegment], options: &CompositionOptions) -> Vec<f32> {
    let sample_rate = options.sample_rate as f64;

    let mut ordered: Vec<&AudioSegment> = segments.iter().collect();
    ordered.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    let span = ordered
        .iter()
        .map(|s| s.start_time + s.duration())
        .fold(0.0, f64::max);
    let initial_len = (span * sample_rate).round() as usize + HEADROOM_SAMPLES;
    let mut buffer = CompositionBuffer::with_capacity(initial_len);

    let mut mixed = false;
    let mut prev_end = 0usize;

    for segment in ordered {
        if segment.is_empty() {
            warn!("Skipping empty segment for cue {}", segment.index);
            continue;
        }

        let mut offset = (segment.start_time * sample_rate).round() as usize;

        // Shift forward to abut the previous segment, never backward and
        // never truncating
        if !options.allow_overlap && offset < prev_end {
            debug!(
                "Cue {} overlaps the previous segment, shifting forward by {} samples",
                segment.index,
                prev_end - offset
            );
            offset = prev_end;
        }

        let end = offset + segment.samples.len();
        buffer.ensure_capacity(end);

        if options.allow_overlap {
            for (i, &sample) in segment.samples.iter().enumerate() {
                let slot = &mut buffer.data[offset + i];
                if *slot != 0.0 {
                    mixed = true;
                }
                *slot += sample;
            }
        } else {
            buffer.data[offset..end].copy_from_slice(&segment.samples);
        }

        prev_end = prev_end.max(end);
    }

    let mut out = buffer.into_inner();

    // Additive mixing can push the sum past full scale; rescale only then
    if mixed {
        crate::audio::limit_peak(&mut out);
    }

    out
}
