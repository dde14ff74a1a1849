/*!
 * Tests for the audio building blocks: stretching, resampling and WAV I/O
 */

use dubwai::audio::{limit_peak, resample, stretch, vocoder, wav, AudioSegment};

use crate::common;

fn sine(len: usize, freq: f32, sample_rate: f32) -> Vec<f32> {
    (0..len)
        .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin() * 0.5)
        .collect()
}

#[test]
fn test_audioSegment_silence_shouldCoverRequestedWindow() {
    let segment = AudioSegment::silence(4, 1.5, 2.0, 22050);
    assert_eq!(segment.index, 4);
    assert_eq!(segment.samples.len(), 44100);
    assert!(segment.samples.iter().all(|&s| s == 0.0));
    assert!((segment.duration() - 2.0).abs() < 1e-6);
}

#[test]
fn test_limitPeak_withSignalPastFullScale_shouldRescale() {
    let mut samples = vec![0.5, -1.8, 0.9];
    limit_peak(&mut samples);
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    assert!((peak - 1.0).abs() < 1e-6);
}

#[test]
fn test_limitPeak_withinFullScale_shouldLeaveSignalAlone() {
    let mut samples = vec![0.5, -0.8, 0.9];
    let before = samples.clone();
    limit_peak(&mut samples);
    assert_eq!(samples, before);
}

#[test]
fn test_stretch_shouldProduceExactTargetLength() {
    let input = sine(33075, 440.0, 22050.0); // 1.5s
    for rate in [0.75, 1.0, 1.4] {
        let out = stretch::stretch(&input, rate).unwrap();
        assert_eq!(out.len(), (33075.0f64 / rate).round() as usize);
    }
}

#[test]
fn test_stretch_withShortInput_shouldStillResize() {
    // Shorter than one analysis frame, handled by the linear fallback
    let input = sine(500, 440.0, 22050.0);
    let out = stretch::stretch(&input, 0.5).unwrap();
    assert_eq!(out.len(), 1000);
}

#[test]
fn test_vocoderStretch_shouldLandNearTargetLength() {
    let input = sine(44100, 330.0, 22050.0); // 2.0s
    let out = vocoder::stretch(&input, 1.25).unwrap();
    assert_eq!(out.len(), (44100.0f64 / 1.25).round() as usize);
}

#[test]
fn test_vocoderStretch_withInvalidRate_shouldError() {
    assert!(vocoder::stretch(&[0.1, 0.2], 0.0).is_err());
}

#[test]
fn test_resample_betweenRates_shouldScaleLength() {
    let input = sine(22050, 440.0, 22050.0); // 1.0s
    let out = resample::resample(&input, 22050, 44100).unwrap();
    assert_eq!(out.len(), 44100);
}

#[test]
fn test_resample_withEqualRates_shouldPassThrough() {
    let input = sine(1000, 440.0, 22050.0);
    let out = resample::resample(&input, 22050, 22050).unwrap();
    assert_eq!(out, input);
}

#[test]
fn test_wavRoundTrip_shouldPreserveSignal() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("roundtrip.wav");
    let samples = sine(4410, 440.0, 22050.0);

    wav::write_wav(&path, &samples, 22050).unwrap();
    let (read_back, rate) = wav::read_wav(&path).unwrap();

    assert_eq!(rate, 22050);
    assert_eq!(read_back.len(), samples.len());
    for (a, b) in read_back.iter().zip(samples.iter()) {
        assert!((a - b).abs() < 1e-3);
    }
}
