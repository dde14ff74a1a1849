/*!
 * Time-domain overlap-add time stretching.
 *
 * The kernel changes the duration of a mono signal without changing its
 * pitch. Output length is exact: `round(input.len() / rate)` samples, so a
 * caller that computes a rate from a target duration gets that duration back
 * to the sample.
 */

use crate::errors::DubError;

/// Synthesis frame length in samples
const FRAME_LEN: usize = 1024;

/// Synthesis hop (75% overlap)
const SYNTH_HOP: usize = FRAME_LEN / 4;

/// Search radius for waveform-similarity alignment
const MAX_SHIFT: usize = 256;

/// Clamp a rate into a speed band, reporting whether clamping occurred
pub fn clamp_rate(rate: f64, min_speed: f64, max_speed: f64) -> (f64, bool) {
    if rate < min_speed {
        (min_speed, true)
    } else if rate > max_speed {
        (max_speed, true)
    } else {
        (rate, false)
    }
}

/// Pad with trailing silence up to `target_len` samples. Longer input is
/// returned unchanged, speech is never truncated.
pub fn pad_to_target(mut samples: Vec<f32>, target_len: usize) -> Vec<f32> {
    if samples.len() < target_len {
        samples.resize(target_len, 0.0);
    }
    samples
}

/// Stretch `input` by `rate` (rate > 1 shortens, rate < 1 lengthens).
///
/// Overlap-add with Hann windows and a waveform-similarity search for frame
/// alignment, which keeps transients intact at moderate rates.
pub fn stretch(input: &[f32], rate: f64) -> Result<Vec<f32>, DubError> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(DubError::Stretch(format!("Invalid stretch rate: {}", rate)));
    }
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let out_len = (input.len() as f64 / rate).round() as usize;
    if out_len == 0 {
        return Ok(Vec::new());
    }

    // Identity rate still goes through so the output length is exact
    if (rate - 1.0).abs() < 1e-9 {
        let mut out = input.to_vec();
        out.resize(out_len, 0.0);
        return Ok(out);
    }

    // Short inputs cannot carry a full analysis frame; fall back to linear
    // resampling of the envelope, which is inaudible at these lengths
    if input.len() < FRAME_LEN + MAX_SHIFT {
        return Ok(stretch_linear(input, out_len));
    }

    let window = hann_window(FRAME_LEN);
    let mut out = vec![0.0f32; out_len];
    let mut norm = vec![0.0f32; out_len];

    let mut out_pos = 0usize;
    let mut prev_in_start: Option<usize> = None;

    while out_pos < out_len {
        let nominal = (out_pos as f64 * rate).round() as usize;
        let in_start = match prev_in_start {
            // Align against the natural continuation of the previous frame
            Some(prev) => best_aligned_start(input, nominal, prev + SYNTH_HOP),
            None => nominal.min(input.len().saturating_sub(1)),
        };

        for i in 0..FRAME_LEN {
            let oi = out_pos + i;
            if oi >= out_len {
                break;
            }
            let ii = in_start + i;
            let sample = if ii < input.len() { input[ii] } else { 0.0 };
            out[oi] += sample * window[i];
            norm[oi] += window[i];
        }

        prev_in_start = Some(in_start);
        out_pos += SYNTH_HOP;
    }

    for (o, n) in out.iter_mut().zip(norm.iter()) {
        if *n > 1e-6 {
            *o /= n;
        }
    }

    Ok(out)
}

/// Pick the analysis start near `nominal` that best continues `natural`,
/// judged by cross-correlation over the overlap region
fn best_aligned_start(input: &[f32], nominal: usize, natural: usize) -> usize {
    let max_start = input.len().saturating_sub(1);
    let natural = natural.min(max_start);
    let lo = nominal.saturating_sub(MAX_SHIFT);
    let hi = (nominal + MAX_SHIFT).min(max_start);

    let overlap = FRAME_LEN - SYNTH_HOP;
    let mut best = nominal.min(max_start);
    let mut best_score = f32::MIN;

    for candidate in lo..=hi {
        let mut score = 0.0f32;
        for i in 0..overlap {
            let a = natural + i;
            let b = candidate + i;
            if a >= input.len() || b >= input.len() {
                break;
            }
            score += input[a] * input[b];
        }
        if score > best_score {
            best_score = score;
            best = candidate;
        }
    }

    best
}

/// Linear interpolation resize for inputs too short for overlap-add
fn stretch_linear(input: &[f32], out_len: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(out_len);
    let scale = (input.len() - 1) as f64 / (out_len.max(2) - 1) as f64;
    for i in 0..out_len {
        let pos = i as f64 * scale;
        let base = pos.floor() as usize;
        let frac = (pos - base as f64) as f32;
        let a = input[base.min(input.len() - 1)];
        let b = input[(base + 1).min(input.len() - 1)];
        out.push(a + (b - a) * frac);
    }
    out
}

fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / len as f32;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}
