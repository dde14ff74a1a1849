/*!
 * Sample-rate conversion.
 *
 * Engines are free to answer at whatever rate their backend produces; every
 * segment in a batch is carried at the configured rate, so engine output
 * passes through here before a strategy looks at its duration.
 */

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::errors::DubError;

/// Input chunk length fed to the resampler
const CHUNK_LEN: usize = 1024;

/// Convert `input` from `source_rate` to `target_rate`. No-op when the
/// rates already match.
pub fn resample(input: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>, DubError> {
    if source_rate == target_rate {
        return Ok(input.to_vec());
    }
    if input.is_empty() {
        return Ok(Vec::new());
    }
    if source_rate == 0 || target_rate == 0 {
        return Err(DubError::Stretch(format!(
            "Invalid sample rates for resampling: {} -> {}",
            source_rate, target_rate
        )));
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, CHUNK_LEN, 1)
        .map_err(|e| DubError::Stretch(format!("Failed to construct resampler: {}", e)))?;

    let expected_len = (input.len() as f64 * ratio).round() as usize;
    // Sinc filter group delay, expressed at the output rate
    let delay = (128.0 * ratio).round() as usize;

    let mut out: Vec<f32> = Vec::with_capacity(expected_len + CHUNK_LEN);
    let mut chunk = vec![0.0f32; CHUNK_LEN];
    let mut pos = 0usize;

    while pos < input.len() {
        let n = (input.len() - pos).min(CHUNK_LEN);
        chunk[..n].copy_from_slice(&input[pos..pos + n]);
        chunk[n..].fill(0.0);

        let processed = resampler
            .process(&[chunk.clone()], None)
            .map_err(|e| DubError::Stretch(format!("Resampling failed: {}", e)))?;
        out.extend_from_slice(&processed[0]);
        pos += n;
    }

    // One silent chunk flushes the tail still inside the filter
    let flushed = resampler
        .process(&[vec![0.0f32; CHUNK_LEN]], None)
        .map_err(|e| DubError::Stretch(format!("Resampling failed: {}", e)))?;
    out.extend_from_slice(&flushed[0]);

    let trimmed: Vec<f32> = out.into_iter().skip(delay).take(expected_len).collect();
    let mut result = trimmed;
    result.resize(expected_len, 0.0);
    Ok(result)
}
