//! Deterministic signal fixtures
//!
//! Synthetic test signals and a hound-backed WAV fixture writer,
//! shared by the test suite and the CLI `gen-fixture` subcommand.
//! Everything here is reproducible: noise is seeded, and the WAV
//! writer applies the crate's round-and-clamp encode convention.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::wav::pcm_f32_to_i16;

/// Generate a pure sine wave
pub fn sine(sample_rate: u32, frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let total = (sample_rate as f32 * duration_secs).round() as usize;
    (0..total)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
pub fn silence(sample_rate: u32, duration_secs: f32) -> Vec<f32> {
    vec![0.0; (sample_rate as f32 * duration_secs).round() as usize]
}

/// Generate seeded white noise
pub fn white_noise(sample_rate: u32, duration_secs: f32, amplitude: f32, seed: u64) -> Vec<f32> {
    let total = (sample_rate as f32 * duration_secs).round() as usize;
    let mut rng = StdRng::seed_from_u64(seed);
    (0..total)
        .map(|_| rng.gen_range(-amplitude..=amplitude))
        .collect()
}

/// Generate a linear chirp sweeping from `start_freq` to `end_freq`
pub fn chirp(
    sample_rate: u32,
    start_freq: f32,
    end_freq: f32,
    duration_secs: f32,
    amplitude: f32,
) -> Vec<f32> {
    let total = (sample_rate as f32 * duration_secs).round() as usize;
    let rate = (end_freq - start_freq) / duration_secs;
    (0..total)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            // Instantaneous phase of a linear sweep
            let phase = 2.0 * std::f32::consts::PI * (start_freq * t + 0.5 * rate * t * t);
            amplitude * phase.sin()
        })
        .collect()
}

/// Write samples as a mono 16-bit PCM WAV fixture
pub fn write_wav_fixture<P: AsRef<Path>>(
    path: P,
    samples: &[f32],
    sample_rate: u32,
) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(pcm_f32_to_i16(sample))?;
    }
    writer.finalize()
}
