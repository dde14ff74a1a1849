/*!
 * Audio primitives and processing for the dubbing pipeline.
 *
 * This module contains the sample-level building blocks:
 *
 * - `stretch`: Overlap-add time stretching with exact output lengths
 * - `vocoder`: Phase-vocoder time stretching (frequency domain)
 * - `resample`: Sample-rate conversion between engine and batch rates
 * - `compositor`: Timeline assembly of per-cue segments
 * - `wav`: WAV file reading and writing
 */

pub mod compositor;
pub mod resample;
pub mod stretch;
pub mod vocoder;
pub mod wav;

/// One cue's synthesized audio, pinned to its place on the timeline
#[derive(Debug, Clone)]
pub struct AudioSegment {
    /// Ordinal position of the originating cue
    pub index: usize,

    /// Timeline placement in seconds, taken from the cue's start time
    pub start_time: f64,

    /// Mono samples in [-1, 1]
    pub samples: Vec<f32>,

    /// Sample rate of `samples`
    pub sample_rate: u32,
}

impl AudioSegment {
    pub fn new(index: usize, start_time: f64, samples: Vec<f32>, sample_rate: u32) -> Self {
        AudioSegment {
            index,
            start_time,
            samples,
            sample_rate,
        }
    }

    /// A segment of silence covering `duration` seconds
    pub fn silence(index: usize, start_time: f64, duration: f64, sample_rate: u32) -> Self {
        let sample_count = (duration.max(0.0) * sample_rate as f64).round() as usize;
        AudioSegment {
            index,
            start_time,
            samples: vec![0.0; sample_count],
            sample_rate,
        }
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Rescale samples by the peak if it exceeds 1.0, leaving quieter audio alone
pub fn limit_peak(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak > 1.0 {
        let scale = 1.0 / peak;
        for s in samples.iter_mut() {
            *s *= scale;
        }
    }
}
