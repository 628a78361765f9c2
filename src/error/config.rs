// Configuration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Configuration error code constants
///
/// These constants provide a single source of truth for the error
/// codes surfaced by session and driver constructors.
///
/// Error code range: 1001-1007
pub struct ConfigErrorCodes {}

impl ConfigErrorCodes {
    /// Sample rate is zero
    pub const SAMPLE_RATE_INVALID: i32 = 1001;

    /// FFT size is below 2 or odd
    pub const FFT_SIZE_INVALID: i32 = 1002;

    /// Hop size is zero or not strictly less than the FFT size
    pub const HOP_SIZE_INVALID: i32 = 1003;

    /// Band count is zero
    pub const BAND_COUNT_INVALID: i32 = 1004;

    /// Frequency range is empty, negative, or beyond Nyquist
    pub const FREQUENCY_RANGE_INVALID: i32 = 1005;

    /// Gamma exponent is non-positive or non-finite
    pub const GAMMA_INVALID: i32 = 1006;

    /// A bounded history capacity is zero
    pub const HISTORY_CAPACITY_INVALID: i32 = 1007;
}

/// Log a configuration error with structured context
///
/// Logs with the numeric error code, the rejecting component, and the
/// human-readable message. Non-blocking, never panics.
pub fn log_config_error(err: &ConfigError, context: &str) {
    error!(
        "Config error in {}: code={}, component=SpectrogramConfig, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Configuration validation errors
///
/// These errors cover fail-fast input validation performed before any
/// session or batch driver is constructed. Streaming never starts from
/// an invalid configuration.
///
/// Error code range: 1001-1007
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Sample rate must be greater than 0
    SampleRateInvalid { sample_rate: u32 },

    /// FFT size must be an even value of at least 2
    FftSizeInvalid { fft_size: usize },

    /// Hop size must be non-zero and strictly less than the FFT size
    HopSizeInvalid { hop_size: usize, fft_size: usize },

    /// Band count must be greater than 0
    BandCountInvalid { band_count: usize },

    /// max_freq must exceed min_freq and stay at or below Nyquist
    FrequencyRangeInvalid { min_freq: f32, max_freq: f32 },

    /// Gamma must be a finite positive value
    GammaInvalid { gamma: f32 },

    /// History capacities must be greater than 0
    HistoryCapacityInvalid,
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::SampleRateInvalid { .. } => ConfigErrorCodes::SAMPLE_RATE_INVALID,
            ConfigError::FftSizeInvalid { .. } => ConfigErrorCodes::FFT_SIZE_INVALID,
            ConfigError::HopSizeInvalid { .. } => ConfigErrorCodes::HOP_SIZE_INVALID,
            ConfigError::BandCountInvalid { .. } => ConfigErrorCodes::BAND_COUNT_INVALID,
            ConfigError::FrequencyRangeInvalid { .. } => {
                ConfigErrorCodes::FREQUENCY_RANGE_INVALID
            }
            ConfigError::GammaInvalid { .. } => ConfigErrorCodes::GAMMA_INVALID,
            ConfigError::HistoryCapacityInvalid => ConfigErrorCodes::HISTORY_CAPACITY_INVALID,
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigError::SampleRateInvalid { sample_rate } => {
                format!("Sample rate must be greater than 0 (got {})", sample_rate)
            }
            ConfigError::FftSizeInvalid { fft_size } => {
                format!("FFT size must be an even value >= 2 (got {})", fft_size)
            }
            ConfigError::HopSizeInvalid { hop_size, fft_size } => {
                format!(
                    "Hop size must be non-zero and less than the FFT size (hop {}, fft {})",
                    hop_size, fft_size
                )
            }
            ConfigError::BandCountInvalid { band_count } => {
                format!("Band count must be greater than 0 (got {})", band_count)
            }
            ConfigError::FrequencyRangeInvalid { min_freq, max_freq } => {
                format!(
                    "Frequency range invalid: min {} Hz, max {} Hz (max must exceed min and stay below Nyquist)",
                    min_freq, max_freq
                )
            }
            ConfigError::GammaInvalid { gamma } => {
                format!("Gamma must be a finite positive value (got {})", gamma)
            }
            ConfigError::HistoryCapacityInvalid => {
                "History capacities must be greater than 0".to_string()
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_codes() {
        assert_eq!(
            ConfigError::SampleRateInvalid { sample_rate: 0 }.code(),
            ConfigErrorCodes::SAMPLE_RATE_INVALID
        );
        assert_eq!(
            ConfigError::FftSizeInvalid { fft_size: 3 }.code(),
            ConfigErrorCodes::FFT_SIZE_INVALID
        );
        assert_eq!(
            ConfigError::HopSizeInvalid {
                hop_size: 2048,
                fft_size: 2048
            }
            .code(),
            ConfigErrorCodes::HOP_SIZE_INVALID
        );
        assert_eq!(
            ConfigError::BandCountInvalid { band_count: 0 }.code(),
            ConfigErrorCodes::BAND_COUNT_INVALID
        );
        assert_eq!(
            ConfigError::FrequencyRangeInvalid {
                min_freq: 100.0,
                max_freq: 50.0
            }
            .code(),
            ConfigErrorCodes::FREQUENCY_RANGE_INVALID
        );
        assert_eq!(
            ConfigError::GammaInvalid { gamma: 0.0 }.code(),
            ConfigErrorCodes::GAMMA_INVALID
        );
        assert_eq!(
            ConfigError::HistoryCapacityInvalid.code(),
            ConfigErrorCodes::HISTORY_CAPACITY_INVALID
        );
    }

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::HopSizeInvalid {
            hop_size: 4096,
            fft_size: 2048,
        };
        assert!(err.message().contains("4096"));
        assert!(err.message().contains("2048"));

        let err = ConfigError::BandCountInvalid { band_count: 0 };
        assert_eq!(err.message(), "Band count must be greater than 0 (got 0)");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::GammaInvalid { gamma: -1.0 };
        let display = format!("{}", err);
        assert!(display.contains("GammaInvalid"));
        assert!(display.contains(&err.code().to_string()));
    }
}
