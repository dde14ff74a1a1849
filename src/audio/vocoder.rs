/*!
 * Phase-vocoder time stretching.
 *
 * Frequency-domain counterpart to the overlap-add kernel: STFT analysis,
 * per-bin phase accumulation, inverse STFT with overlap-add synthesis.
 * Smoother on tonal material, softer on transients, which is why the
 * high-quality strategy blends it with the time-domain kernel instead of
 * using it alone.
 */

use std::sync::Arc;

use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

use crate::errors::DubError;

/// FFT frame length
const N_FFT: usize = 2048;

/// Synthesis hop (75% overlap)
const SYNTH_HOP: usize = N_FFT / 4;

/// Stretch `input` by `rate`, output trimmed or padded to
/// `round(input.len() / rate)` samples
pub fn stretch(input: &[f32], rate: f64) -> Result<Vec<f32>, DubError> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(DubError::Stretch(format!(
            "Invalid vocoder stretch rate: {}",
            rate
        )));
    }
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let out_len = (input.len() as f64 / rate).round() as usize;
    if out_len == 0 {
        return Ok(Vec::new());
    }

    // Zero-pad so at least two analysis frames exist
    let analysis_hop = (SYNTH_HOP as f64 * rate).max(1.0);
    let min_len = N_FFT + analysis_hop.ceil() as usize;
    let mut padded;
    let signal: &[f32] = if input.len() < min_len {
        padded = input.to_vec();
        padded.resize(min_len, 0.0);
        &padded
    } else {
        input
    };

    let mut planner = FftPlanner::<f32>::new();
    let forward = planner.plan_fft_forward(N_FFT);
    let inverse = planner.plan_fft_inverse(N_FFT);

    let window = hann_window(N_FFT);

    let frame_count = ((signal.len() - N_FFT) as f64 / analysis_hop).floor() as usize + 1;

    let mut out = vec![0.0f32; out_len + N_FFT];
    let mut norm = vec![0.0f32; out_len + N_FFT];

    let mut prev_phase = vec![0.0f32; N_FFT];
    let mut phase_acc = vec![0.0f32; N_FFT];

    for frame in 0..frame_count {
        let in_start = (frame as f64 * analysis_hop).round() as usize;
        let out_start = frame * SYNTH_HOP;
        if out_start >= out_len {
            break;
        }

        let spectrum = analyze(signal, in_start, &window, &forward);

        // Phase propagation: accumulate the per-bin instantaneous frequency
        // scaled to the synthesis hop
        let mut synth = vec![Complex32::new(0.0, 0.0); N_FFT];
        for (bin, value) in spectrum.iter().enumerate() {
            let magnitude = value.norm();
            let phase = value.arg();

            let bin_freq = 2.0 * std::f32::consts::PI * bin as f32 / N_FFT as f32;
            if frame == 0 {
                phase_acc[bin] = phase;
            } else {
                let expected = bin_freq * analysis_hop as f32;
                let delta = wrap_phase(phase - prev_phase[bin] - expected);
                let true_freq = bin_freq + delta / analysis_hop as f32;
                phase_acc[bin] = wrap_phase(phase_acc[bin] + true_freq * SYNTH_HOP as f32);
            }
            prev_phase[bin] = phase;

            synth[bin] = Complex32::from_polar(magnitude, phase_acc[bin]);
        }

        inverse.process(&mut synth);

        // Overlap-add the windowed inverse transform
        for i in 0..N_FFT {
            let oi = out_start + i;
            if oi >= out.len() {
                break;
            }
            let sample = synth[i].re / N_FFT as f32;
            out[oi] += sample * window[i];
            norm[oi] += window[i] * window[i];
        }
    }

    for (o, n) in out.iter_mut().zip(norm.iter()) {
        if *n > 1e-6 {
            *o /= n;
        }
    }

    out.resize(out_len, 0.0);
    Ok(out)
}

fn analyze(signal: &[f32], start: usize, window: &[f32], fft: &Arc<dyn Fft<f32>>) -> Vec<Complex32> {
    let mut buf: Vec<Complex32> = (0..N_FFT)
        .map(|i| {
            let idx = start + i;
            let sample = if idx < signal.len() { signal[idx] } else { 0.0 };
            Complex32::new(sample * window[i], 0.0)
        })
        .collect();
    fft.process(&mut buf);
    buf
}

fn wrap_phase(phase: f32) -> f32 {
    use std::f32::consts::PI;
    let mut p = phase;
    while p > PI {
        p -= 2.0 * PI;
    }
    while p < -PI {
        p += 2.0 * PI;
    }
    p
}

fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / len as f32;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}
