/*!
 * WAV reading and writing via hound.
 *
 * Output files are mono 16-bit PCM. Reading accepts 16-bit integer and
 * 32-bit float sources, downmixing multi-channel input to mono.
 */

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::errors::EngineError;

/// Write mono samples to a 16-bit PCM WAV file
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path.as_ref(), spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.as_ref().display()))?;

    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * i16::MAX as f32) as i16)?;
    }

    writer.finalize().context("Failed to finalize WAV file")?;
    Ok(())
}

/// Read a WAV file into mono f32 samples and its sample rate
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32)> {
    let reader = WavReader::open(path.as_ref())
        .with_context(|| format!("Failed to open WAV file: {}", path.as_ref().display()))?;
    decode_reader(reader).map_err(|e| anyhow::anyhow!("{}", e))
}

/// Decode WAV bytes (an engine response body) into mono f32 samples
pub fn decode_wav_bytes(bytes: &[u8]) -> Result<(Vec<f32>, u32), EngineError> {
    let reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| EngineError::InvalidResponse(format!("Not a WAV payload: {}", e)))?;
    decode_reader(reader)
}

fn decode_reader<R: std::io::Read>(
    mut reader: WavReader<R>,
) -> Result<(Vec<f32>, u32), EngineError> {
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| EngineError::InvalidResponse(format!("WAV decode failed: {}", e)))?,
        SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .map_err(|e| EngineError::InvalidResponse(format!("WAV decode failed: {}", e)))?
        }
    };

    // Downmix to mono by averaging channels
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok((samples, spec.sample_rate))
}
