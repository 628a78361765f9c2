// Mel filter bank builder
//
// Maps linear FFT bins onto perceptually spaced frequency bands.
// Band edges are laid out uniformly on the mel scale, then converted
// back to Hz; each band is a triangular filter rising linearly from
// zero at its left edge to one at its center and falling back to zero
// at its right edge. Filter areas are NOT normalized - wider high
// bands collect proportionally more energy.

use crate::error::ConfigError;

/// Convert frequency in Hz to the mel scale
///
/// `mel = 2595 * log10(1 + hz / 700)`
#[inline]
pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Convert a mel value back to Hz
///
/// `hz = 700 * (10^(mel / 2595) - 1)`
#[inline]
pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}

/// Immutable triangular filter matrix, band_count x (fft_size/2 + 1)
///
/// Built once per configuration and reused for every window in a
/// session.
#[derive(Debug, Clone)]
pub struct MelFilterBank {
    weights: Vec<Vec<f32>>,
    edges_hz: Vec<f32>,
    band_count: usize,
    bin_count: usize,
}

impl MelFilterBank {
    /// Build the filter bank for a given analysis configuration
    ///
    /// # Arguments
    /// * `sample_rate` - Input sample rate in Hz
    /// * `fft_size` - FFT window size; the matrix has fft_size/2 + 1 columns
    /// * `band_count` - Number of triangular filters (matrix rows)
    /// * `min_freq` / `max_freq` - Frequency range covered by the bank
    ///
    /// # Returns
    /// The filter bank, or a `ConfigError` for invalid input
    /// (zero band count, empty or negative frequency range).
    pub fn build(
        sample_rate: u32,
        fft_size: usize,
        band_count: usize,
        min_freq: f32,
        max_freq: f32,
    ) -> Result<Self, ConfigError> {
        if band_count == 0 {
            return Err(ConfigError::BandCountInvalid { band_count });
        }
        if min_freq < 0.0 || max_freq <= min_freq {
            return Err(ConfigError::FrequencyRangeInvalid { min_freq, max_freq });
        }
        if sample_rate == 0 {
            return Err(ConfigError::SampleRateInvalid { sample_rate });
        }
        if fft_size < 2 {
            return Err(ConfigError::FftSizeInvalid { fft_size });
        }

        let bin_count = fft_size / 2 + 1;
        let mel_min = hz_to_mel(min_freq);
        let mel_max = hz_to_mel(max_freq);

        // band_count + 2 equally spaced mel points give every band a
        // left edge, a center, and a right edge
        let edges_hz: Vec<f32> = (0..band_count + 2)
            .map(|i| {
                let mel = mel_min + (mel_max - mel_min) * i as f32 / (band_count + 1) as f32;
                mel_to_hz(mel)
            })
            .collect();

        let freq_resolution = sample_rate as f32 / fft_size as f32;
        let mut weights = vec![vec![0.0_f32; bin_count]; band_count];

        for (band, row) in weights.iter_mut().enumerate() {
            let left = edges_hz[band];
            let center = edges_hz[band + 1];
            let right = edges_hz[band + 2];

            for (bin, weight) in row.iter_mut().enumerate() {
                let freq = bin as f32 * freq_resolution;
                if freq >= left && freq <= center {
                    *weight = (freq - left) / (center - left);
                } else if freq > center && freq <= right {
                    *weight = (right - freq) / (right - center);
                }
            }
        }

        Ok(Self {
            weights,
            edges_hz,
            band_count,
            bin_count,
        })
    }

    /// Aggregate a magnitude spectrum into band energies
    ///
    /// # Arguments
    /// * `magnitudes` - FFT magnitude spectrum, length fft_size/2 + 1
    ///
    /// # Returns
    /// One weighted sum per band
    pub fn apply(&self, magnitudes: &[f32]) -> Vec<f32> {
        self.weights
            .iter()
            .map(|row| {
                row.iter()
                    .zip(magnitudes.iter())
                    .map(|(w, m)| w * m)
                    .sum()
            })
            .collect()
    }

    pub fn band_count(&self) -> usize {
        self.band_count
    }

    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    /// (left, center, right) edge frequencies of a band in Hz
    pub fn band_edges(&self, band: usize) -> (f32, f32, f32) {
        (
            self.edges_hz[band],
            self.edges_hz[band + 1],
            self.edges_hz[band + 2],
        )
    }

    /// Center frequency of a band in Hz
    pub fn band_center(&self, band: usize) -> f32 {
        self.edges_hz[band + 1]
    }
}
