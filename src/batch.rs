// BatchDriver - one-shot spectrogram computation over a fixed sample array
//
// Runs the same windowed analysis as the streaming path synchronously
// to exhaustion. Windows are sliced from the input in place, so memory
// stays at one copy of the decoded samples plus the output columns.
// There is no timing compensation: duration comes directly from the
// sample count and sample rate.

use std::io::{self, Write};
use std::time::Duration;

use crate::config::SpectrogramConfig;
use crate::dsp::SpectralAnalyzer;
use crate::error::{log_config_error, ConfigError};

/// Progress callback cadence in completed windows
const PROGRESS_INTERVAL: usize = 100;

/// Periodic progress report for long batch runs
#[derive(Debug, Clone, Copy)]
pub struct BatchProgress {
    /// Fraction of the input consumed, 0.0 to 100.0
    pub percent: f32,
    /// Columns produced so far
    pub columns: usize,
}

/// Result of a completed batch run
pub struct BatchResult {
    /// Every produced column, oldest first
    pub columns: Vec<Vec<f32>>,
    /// Total signal duration: sample count / sample rate
    pub duration: Duration,
    /// Windows that degraded to an all-zero column
    pub degraded_columns: u64,
    hop_period_secs: f64,
}

impl BatchResult {
    /// Diagnostic CSV export, one row per column
    ///
    /// Shares the streaming export format (uncompensated time,
    /// compensated time, band fields); with no real-time delay to
    /// compensate, both time fields carry the nominal hop grid.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for (index, column) in self.columns.iter().enumerate() {
            let time = index as f64 * self.hop_period_secs;
            write!(writer, "{:.6},{:.6}", time, time)?;
            for value in column {
                write!(writer, ",{:.6}", value)?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}

pub struct BatchDriver {
    config: SpectrogramConfig,
}

impl BatchDriver {
    /// Create a driver for a validated configuration
    pub fn new(config: SpectrogramConfig) -> Result<Self, ConfigError> {
        if let Err(err) = config.validate() {
            log_config_error(&err, "BatchDriver::new");
            return Err(err);
        }
        Ok(Self { config })
    }

    /// Process a complete sample array without progress reporting
    pub fn process(&self, samples: &[f32]) -> Result<BatchResult, ConfigError> {
        self.process_with_progress(samples, |_| {})
    }

    /// Process a complete sample array, reporting progress periodically
    ///
    /// The callback runs synchronously on the driving thread every
    /// `PROGRESS_INTERVAL` windows and once at completion; it cannot
    /// alter the result.
    pub fn process_with_progress<F>(
        &self,
        samples: &[f32],
        mut progress: F,
    ) -> Result<BatchResult, ConfigError>
    where
        F: FnMut(BatchProgress),
    {
        // Fresh analyzer per run keeps batch output deterministic
        let mut analyzer = SpectralAnalyzer::new(&self.config)?;

        let fft_size = self.config.fft_size;
        let hop_size = self.config.hop_size;
        let expected = if samples.len() >= fft_size {
            (samples.len() - fft_size) / hop_size + 1
        } else {
            0
        };

        let mut columns = Vec::with_capacity(expected);
        let mut pos = 0;
        while pos + fft_size <= samples.len() {
            columns.push(analyzer.analyze(&samples[pos..pos + fft_size]));
            pos += hop_size;

            if columns.len() % PROGRESS_INTERVAL == 0 {
                progress(BatchProgress {
                    percent: pos as f32 / samples.len() as f32 * 100.0,
                    columns: columns.len(),
                });
            }
        }

        progress(BatchProgress {
            percent: 100.0,
            columns: columns.len(),
        });
        log::info!(
            "[Batch] Processed {} samples into {} columns ({} degraded)",
            samples.len(),
            columns.len(),
            analyzer.degraded_columns()
        );

        let duration =
            Duration::from_secs_f64(samples.len() as f64 / self.config.sample_rate as f64);

        Ok(BatchResult {
            columns,
            duration,
            degraded_columns: analyzer.degraded_columns(),
            hop_period_secs: self.config.hop_period_secs(),
        })
    }

    pub fn config(&self) -> &SpectrogramConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BandAggregationConfig;

    fn sine(frequency: f32, samples: usize) -> Vec<f32> {
        (0..samples)
            .map(|i| {
                let t = i as f32 / 44_100.0;
                (2.0 * std::f32::consts::PI * frequency * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_window_count_formula() {
        let driver = BatchDriver::new(SpectrogramConfig::default()).unwrap();
        let result = driver.process(&sine(440.0, 44_100)).unwrap();

        // floor((44100 - 2048) / 256) + 1 = 165
        assert_eq!(result.columns.len(), 165);
    }

    #[test]
    fn test_duration_from_sample_count() {
        let driver = BatchDriver::new(SpectrogramConfig::default()).unwrap();
        let result = driver.process(&sine(440.0, 44_100)).unwrap();
        assert!((result.duration.as_secs_f64() - 1.0).abs() < 0.001);

        let result = driver.process(&sine(440.0, 22_050)).unwrap();
        assert!((result.duration.as_secs_f64() - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_input_shorter_than_window() {
        let driver = BatchDriver::new(SpectrogramConfig::default()).unwrap();
        let result = driver.process(&sine(440.0, 1_000)).unwrap();
        assert!(result.columns.is_empty());
        assert!((result.duration.as_secs_f64() - 1_000.0 / 44_100.0).abs() < 1e-6);
    }

    #[test]
    fn test_progress_callback_cadence() {
        let driver = BatchDriver::new(SpectrogramConfig::default()).unwrap();
        // 3 seconds -> floor((132300 - 2048)/256)+1 = 509 columns
        let samples = sine(440.0, 3 * 44_100);

        let mut reports = Vec::new();
        let result = driver
            .process_with_progress(&samples, |p| reports.push(p))
            .unwrap();

        assert_eq!(result.columns.len(), 509);
        // 100, 200, 300, 400, 500, plus the completion report
        assert_eq!(reports.len(), 6);
        assert_eq!(reports[0].columns, 100);
        assert_eq!(reports.last().unwrap().columns, 509);
        assert!((reports.last().unwrap().percent - 100.0).abs() < f32::EPSILON);
        for pair in reports.windows(2) {
            assert!(pair[1].percent >= pair[0].percent, "progress must ascend");
        }
    }

    #[test]
    fn test_deterministic_across_runs() {
        let driver = BatchDriver::new(SpectrogramConfig::default()).unwrap();
        let samples = sine(440.0, 44_100);

        let first = driver.process(&samples).unwrap();
        let second = driver.process(&samples).unwrap();
        assert_eq!(first.columns, second.columns);
    }

    #[test]
    fn test_uniform_band_config() {
        let config = SpectrogramConfig {
            aggregation: BandAggregationConfig::Uniform { max_freq: 8_000.0 },
            ..SpectrogramConfig::default()
        };
        let driver = BatchDriver::new(config).unwrap();
        let result = driver.process(&sine(440.0, 44_100)).unwrap();
        assert_eq!(result.columns.len(), 165);
        for column in &result.columns {
            assert_eq!(column.len(), 128);
        }
    }

    #[test]
    fn test_csv_rows_match_columns() {
        let driver = BatchDriver::new(SpectrogramConfig::default()).unwrap();
        let result = driver.process(&sine(440.0, 22_050)).unwrap();

        let mut out = Vec::new();
        result.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), result.columns.len());
    }
}
