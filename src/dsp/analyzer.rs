// SpectralAnalyzer - windowed FFT magnitude analysis per column
//
// This module turns one time-domain window into one visualization-ready
// column of band magnitudes.
//
// Algorithm:
// 1. Multiply the window by the configured window function
// 2. Compute the forward FFT, keep the fft_size/2 + 1 positive bins
// 3. Magnitude per bin: sqrt(re^2 + im^2)
// 4. Aggregate bins into bands (mel filter bank, or equal-width
//    contiguous ranges below a max frequency)
// 5. Track the column peak in a bounded rolling history
// 6. Derive adaptive normalization bounds from that history and map
//    each band into [0, 1] with gamma correction
//
// A window that cannot be analyzed (wrong length, non-finite spectrum)
// yields an all-zero column instead of an error: one bad window must
// not halt a live stream. Such recoveries are counted and logged.

use rustfft::{num_complex::Complex, FftPlanner};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::config::{BandAggregationConfig, SpectrogramConfig};
use crate::dsp::mel::MelFilterBank;
use crate::error::ConfigError;

/// Fraction of the rolling-history minimum used as the dynamic floor
const DYNAMIC_FLOOR_SCALE: f32 = 0.05;

/// Fraction of the rolling-history maximum used as the dynamic ceiling
const DYNAMIC_CEILING_SCALE: f32 = 0.85;

/// Band aggregation strategy, resolved once at construction
///
/// `Mel` applies a triangular filter bank as a weighted sum per band;
/// `Uniform` averages magnitude over equal-width contiguous bin ranges
/// restricted to bins below the configured max frequency.
pub enum BandAggregation {
    Mel(MelFilterBank),
    Uniform { ranges: Vec<(usize, usize)> },
}

impl BandAggregation {
    /// Resolve the configured aggregation mode into its concrete form
    pub fn from_config(config: &SpectrogramConfig) -> Result<Self, ConfigError> {
        match config.aggregation {
            BandAggregationConfig::Mel { min_freq, max_freq } => Ok(BandAggregation::Mel(
                MelFilterBank::build(
                    config.sample_rate,
                    config.fft_size,
                    config.band_count,
                    min_freq,
                    max_freq,
                )?,
            )),
            BandAggregationConfig::Uniform { max_freq } => {
                let nyquist = config.sample_rate as f32 / 2.0;
                if max_freq <= 0.0 || max_freq > nyquist {
                    return Err(ConfigError::FrequencyRangeInvalid {
                        min_freq: 0.0,
                        max_freq,
                    });
                }
                let freq_resolution = config.sample_rate as f32 / config.fft_size as f32;
                let usable_bins =
                    ((max_freq / freq_resolution).floor() as usize).min(config.bin_count() - 1) + 1;
                let ranges = (0..config.band_count)
                    .map(|band| {
                        let start = band * usable_bins / config.band_count;
                        let end = (band + 1) * usable_bins / config.band_count;
                        (start, end)
                    })
                    .collect();
                Ok(BandAggregation::Uniform { ranges })
            }
        }
    }

    fn aggregate(&self, magnitudes: &[f32]) -> Vec<f32> {
        match self {
            BandAggregation::Mel(bank) => bank.apply(magnitudes),
            BandAggregation::Uniform { ranges } => ranges
                .iter()
                .map(|&(start, end)| {
                    if end > start {
                        magnitudes[start..end].iter().sum::<f32>() / (end - start) as f32
                    } else {
                        0.0
                    }
                })
                .collect(),
        }
    }
}

/// Per-session spectral analyzer
///
/// Stateless given its inputs except for the bounded rolling history of
/// recent column peaks, which drives adaptive dynamic-range
/// normalization. One instance per session; never shared across
/// concurrent analysis calls.
pub struct SpectralAnalyzer {
    fft_planner: Arc<Mutex<FftPlanner<f32>>>,
    window: Arc<[f32]>,
    aggregation: BandAggregation,
    fft_size: usize,
    band_count: usize,
    gamma: f32,
    magnitude_history: VecDeque<f32>,
    magnitude_history_len: usize,
    global_max_magnitude: f32,
    degraded_columns: u64,
}

impl SpectralAnalyzer {
    /// Create an analyzer for a validated configuration
    pub fn new(config: &SpectrogramConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let aggregation = BandAggregation::from_config(config)?;

        Ok(Self {
            fft_planner: Arc::new(Mutex::new(FftPlanner::new())),
            window: config.window.coefficients(config.fft_size),
            aggregation,
            fft_size: config.fft_size,
            band_count: config.band_count,
            gamma: config.gamma,
            magnitude_history: VecDeque::with_capacity(config.magnitude_history_len),
            magnitude_history_len: config.magnitude_history_len,
            global_max_magnitude: 0.0,
            degraded_columns: 0,
        })
    }

    /// Analyze one time-domain window into a normalized band column
    ///
    /// # Arguments
    /// * `window` - Exactly `fft_size` samples in [-1.0, 1.0]
    ///
    /// # Returns
    /// `band_count` values in [0.0, 1.0]. A window of the wrong length
    /// or a non-finite spectrum degrades to an all-zero column.
    pub fn analyze(&mut self, window: &[f32]) -> Vec<f32> {
        if window.len() != self.fft_size {
            tracing::warn!(
                "[SpectralAnalyzer] Window length {} != fft size {}, emitting zero column",
                window.len(),
                self.fft_size
            );
            return self.degraded_column();
        }

        let mut buffer: Vec<Complex<f32>> = window
            .iter()
            .zip(self.window.iter())
            .map(|(sample, coeff)| Complex::new(sample * coeff, 0.0))
            .collect();

        let fft = self
            .fft_planner
            .lock()
            .unwrap()
            .plan_fft_forward(self.fft_size);
        fft.process(&mut buffer);

        let magnitudes: Vec<f32> = buffer[..self.fft_size / 2 + 1]
            .iter()
            .map(|c| c.norm())
            .collect();

        if magnitudes.iter().any(|m| !m.is_finite()) {
            tracing::warn!(
                "[SpectralAnalyzer] Non-finite magnitude in spectrum, emitting zero column"
            );
            return self.degraded_column();
        }

        let bands = self.aggregation.aggregate(&magnitudes);
        self.normalize(bands)
    }

    /// Map raw band magnitudes into [0, 1] against the rolling history
    fn normalize(&mut self, bands: Vec<f32>) -> Vec<f32> {
        let peak = bands.iter().copied().fold(0.0_f32, f32::max);

        self.magnitude_history.push_back(peak);
        if self.magnitude_history.len() > self.magnitude_history_len {
            self.magnitude_history.pop_front();
        }
        // Monotonic, informational only
        self.global_max_magnitude = self.global_max_magnitude.max(peak);

        let history_min = self
            .magnitude_history
            .iter()
            .copied()
            .fold(f32::INFINITY, f32::min);
        let history_max = self
            .magnitude_history
            .iter()
            .copied()
            .fold(0.0_f32, f32::max);

        let dynamic_min = history_min * DYNAMIC_FLOOR_SCALE;
        let mut dynamic_max = history_max * DYNAMIC_CEILING_SCALE;
        // Minimum spread keeps the ceiling strictly above the floor
        if dynamic_max <= dynamic_min {
            dynamic_max = dynamic_min + f32::EPSILON;
        }
        let range = dynamic_max - dynamic_min;

        bands
            .into_iter()
            .map(|m| {
                if m <= dynamic_min {
                    0.0
                } else {
                    ((m - dynamic_min) / range).clamp(0.0, 1.0).powf(self.gamma)
                }
            })
            .collect()
    }

    fn degraded_column(&mut self) -> Vec<f32> {
        self.degraded_columns += 1;
        vec![0.0; self.band_count]
    }

    /// Clear the rolling history for a fresh session
    pub fn reset(&mut self) {
        self.magnitude_history.clear();
        self.global_max_magnitude = 0.0;
        self.degraded_columns = 0;
    }

    /// Number of windows that degraded to a zero column
    pub fn degraded_columns(&self) -> u64 {
        self.degraded_columns
    }

    /// Running maximum raw band magnitude observed this session
    pub fn global_max_magnitude(&self) -> f32 {
        self.global_max_magnitude
    }

    pub fn band_count(&self) -> usize {
        self.band_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(aggregation: BandAggregationConfig) -> SpectrogramConfig {
        SpectrogramConfig {
            aggregation,
            ..SpectrogramConfig::default()
        }
    }

    /// Generate pure sine wave for testing
    fn generate_sine_wave(sample_rate: u32, frequency: f32, duration_samples: usize) -> Vec<f32> {
        (0..duration_samples)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (2.0 * std::f32::consts::PI * frequency * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_column_length_and_range() {
        let config = test_config(BandAggregationConfig::Uniform { max_freq: 8_000.0 });
        let mut analyzer = SpectralAnalyzer::new(&config).unwrap();

        let signal = generate_sine_wave(44_100, 440.0, 2048);
        let column = analyzer.analyze(&signal);

        assert_eq!(column.len(), 128, "column length must equal band count");
        for (band, &v) in column.iter().enumerate() {
            assert!(
                (0.0..=1.0).contains(&v),
                "band {} value {} outside [0, 1]",
                band,
                v
            );
        }
    }

    #[test]
    fn test_uniform_peak_band_tracks_sine_frequency() {
        let config = test_config(BandAggregationConfig::Uniform { max_freq: 8_000.0 });
        let mut analyzer = SpectralAnalyzer::new(&config).unwrap();

        let signal = generate_sine_wave(44_100, 440.0, 2048);
        let column = analyzer.analyze(&signal);

        let peak_band = column
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, _)| i)
            .unwrap();

        // 440 Hz with 128 bands over 8 kHz lands around band 7
        let expected = (440.0_f64 / (8_000.0 / 128.0)).round() as usize;
        assert!(
            peak_band.abs_diff(expected) <= 1,
            "peak band {} expected near {}",
            peak_band,
            expected
        );
    }

    #[test]
    fn test_mel_peak_band_tracks_sine_frequency() {
        let config = test_config(BandAggregationConfig::Mel {
            min_freq: 20.0,
            max_freq: 8_000.0,
        });
        let mut analyzer = SpectralAnalyzer::new(&config).unwrap();
        let bank = MelFilterBank::build(44_100, 2048, 128, 20.0, 8_000.0).unwrap();

        let signal = generate_sine_wave(44_100, 440.0, 2048);
        let column = analyzer.analyze(&signal);

        let peak_band = column
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, _)| i)
            .unwrap();

        let center = bank.band_center(peak_band);
        assert!(
            (center - 440.0).abs() < 150.0,
            "peak band center {} Hz too far from 440 Hz",
            center
        );
    }

    #[test]
    fn test_silence_produces_zero_column() {
        let config = test_config(BandAggregationConfig::Uniform { max_freq: 8_000.0 });
        let mut analyzer = SpectralAnalyzer::new(&config).unwrap();

        for _ in 0..20 {
            let column = analyzer.analyze(&vec![0.0; 2048]);
            assert!(
                column.iter().all(|&v| v == 0.0),
                "silence must normalize to all-zero columns"
            );
        }
        assert_eq!(analyzer.degraded_columns(), 0);
    }

    #[test]
    fn test_wrong_window_length_degrades_to_zero_column() {
        let config = test_config(BandAggregationConfig::Uniform { max_freq: 8_000.0 });
        let mut analyzer = SpectralAnalyzer::new(&config).unwrap();

        let column = analyzer.analyze(&[0.5; 100]);
        assert_eq!(column.len(), 128);
        assert!(column.iter().all(|&v| v == 0.0));
        assert_eq!(analyzer.degraded_columns(), 1);
    }

    #[test]
    fn test_non_finite_input_degrades_to_zero_column() {
        let config = test_config(BandAggregationConfig::Uniform { max_freq: 8_000.0 });
        let mut analyzer = SpectralAnalyzer::new(&config).unwrap();

        let mut signal = generate_sine_wave(44_100, 440.0, 2048);
        signal[100] = f32::NAN;
        let column = analyzer.analyze(&signal);

        assert!(column.iter().all(|&v| v == 0.0));
        assert_eq!(analyzer.degraded_columns(), 1);
    }

    #[test]
    fn test_reset_clears_history() {
        let config = test_config(BandAggregationConfig::Uniform { max_freq: 8_000.0 });
        let mut analyzer = SpectralAnalyzer::new(&config).unwrap();

        let signal = generate_sine_wave(44_100, 440.0, 2048);
        analyzer.analyze(&signal);
        assert!(analyzer.global_max_magnitude() > 0.0);

        analyzer.reset();
        assert_eq!(analyzer.global_max_magnitude(), 0.0);
        assert!(analyzer.magnitude_history.is_empty());
    }

    #[test]
    fn test_global_max_is_monotonic() {
        let config = test_config(BandAggregationConfig::Uniform { max_freq: 8_000.0 });
        let mut analyzer = SpectralAnalyzer::new(&config).unwrap();

        let loud = generate_sine_wave(44_100, 440.0, 2048);
        let quiet: Vec<f32> = loud.iter().map(|s| s * 0.01).collect();

        analyzer.analyze(&loud);
        let after_loud = analyzer.global_max_magnitude();
        analyzer.analyze(&quiet);
        assert_eq!(
            analyzer.global_max_magnitude(),
            after_loud,
            "global max must never decrease"
        );
    }
}
