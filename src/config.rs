//! Configuration management for spectrogram sessions
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling fast iteration without recompilation. Key parameters for
//! windowing, band aggregation, normalization, and timing compensation
//! can be adjusted via the config file for rapid experimentation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::dsp::WindowKind;
use crate::error::ConfigError;

/// Complete spectrogram pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectrogramConfig {
    /// Input sample rate in Hz
    pub sample_rate: u32,
    /// FFT window size in samples
    pub fft_size: usize,
    /// Hop size between consecutive analysis windows (must be < fft_size)
    pub hop_size: usize,
    /// Number of output frequency bands per column
    pub band_count: usize,
    /// Window function applied before the FFT
    pub window: WindowKind,
    /// How FFT bins are aggregated into output bands
    pub aggregation: BandAggregationConfig,
    /// Gamma exponent applied after dynamic-range normalization
    pub gamma: f32,
    /// Rolling window of per-column peak magnitudes used for
    /// adaptive normalization bounds
    pub magnitude_history_len: usize,
    /// Maximum number of columns retained in the session history
    pub history_capacity: usize,
    pub timing: TimingConfig,
}

/// Band aggregation strategy, resolved once at session construction
///
/// `Mel` builds a triangular mel-scale filter bank for full-quality
/// post-processing; `Uniform` averages equal-width contiguous bin
/// ranges below `max_freq` for low-latency live preview.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BandAggregationConfig {
    Mel { min_freq: f32, max_freq: f32 },
    Uniform { max_freq: f32 },
}

/// Processing-delay compensation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Rolling window length for observed per-window processing durations
    pub processing_window_len: usize,
    /// Safety factor applied to the average observed latency
    pub delay_safety_factor: f32,
    /// Upper clamp for the delay estimate in milliseconds
    pub max_delay_ms: u64,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            fft_size: 2048,
            hop_size: 256,
            band_count: 128,
            window: WindowKind::Hamming,
            aggregation: BandAggregationConfig::default(),
            // 0.6 lifts quiet detail without crushing peaks
            gamma: 0.6,
            magnitude_history_len: 300,
            history_capacity: 10_000,
            timing: TimingConfig::default(),
        }
    }
}

impl Default for BandAggregationConfig {
    fn default() -> Self {
        BandAggregationConfig::Mel {
            min_freq: 20.0,
            max_freq: 8_000.0,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            processing_window_len: 50,
            delay_safety_factor: 1.2,
            max_delay_ms: 200,
        }
    }
}

impl SpectrogramConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or the defaults if the file is missing
    /// or fails to parse (a warning is logged in either case).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Validate all configuration invariants
    ///
    /// Called by every session/driver constructor. Fails fast with a
    /// descriptive `ConfigError`; no partially constructed pipeline is
    /// ever returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::SampleRateInvalid {
                sample_rate: self.sample_rate,
            });
        }
        if self.fft_size < 2 || self.fft_size % 2 != 0 {
            return Err(ConfigError::FftSizeInvalid {
                fft_size: self.fft_size,
            });
        }
        // hop_size < fft_size guarantees overlap and forward progress
        // in the streaming buffer
        if self.hop_size == 0 || self.hop_size >= self.fft_size {
            return Err(ConfigError::HopSizeInvalid {
                hop_size: self.hop_size,
                fft_size: self.fft_size,
            });
        }
        if self.band_count == 0 {
            return Err(ConfigError::BandCountInvalid {
                band_count: self.band_count,
            });
        }
        if !self.gamma.is_finite() || self.gamma <= 0.0 {
            return Err(ConfigError::GammaInvalid { gamma: self.gamma });
        }
        if self.magnitude_history_len == 0
            || self.history_capacity == 0
            || self.timing.processing_window_len == 0
        {
            return Err(ConfigError::HistoryCapacityInvalid);
        }

        let nyquist = self.sample_rate as f32 / 2.0;
        match self.aggregation {
            BandAggregationConfig::Mel { min_freq, max_freq } => {
                if min_freq < 0.0 || max_freq <= min_freq || max_freq > nyquist {
                    return Err(ConfigError::FrequencyRangeInvalid { min_freq, max_freq });
                }
            }
            BandAggregationConfig::Uniform { max_freq } => {
                if max_freq <= 0.0 || max_freq > nyquist {
                    return Err(ConfigError::FrequencyRangeInvalid {
                        min_freq: 0.0,
                        max_freq,
                    });
                }
            }
        }

        Ok(())
    }

    /// Seconds of signal time advanced per output column
    pub fn hop_period_secs(&self) -> f64 {
        self.hop_size as f64 / self.sample_rate as f64
    }

    /// Number of FFT output bins retained (positive frequencies)
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2 + 1
    }
}
