// StreamSession - sliding-window buffer, windower, and column history
//
// Accumulates incoming sample chunks of arbitrary size; whenever the
// buffer holds at least one full FFT window, analyzes it, timestamps
// the resulting column, and advances by the hop size (retaining the
// overlap tail). The column history and its parallel timestamp record
// are bounded; the oldest entries are evicted together.
//
// Ingest calls must arrive in order on a single logical consumer - the
// hop-based trimming is order-dependent. Sessions never share state,
// so independent sessions may run concurrently.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::time::Instant;

use crate::config::SpectrogramConfig;
use crate::dsp::SpectralAnalyzer;
use crate::error::{log_config_error, ConfigError};
use crate::stream::timing::TimingCompensator;
use crate::wav::pcm_i16_to_f32;

pub struct StreamSession {
    config: SpectrogramConfig,
    /// Accumulated samples; drained by hop_size as windows complete
    buffer: Vec<f32>,
    analyzer: SpectralAnalyzer,
    timing: TimingCompensator,
    /// Bounded FIFO of produced columns, parallel to the timestamp record
    columns: VecDeque<Vec<f32>>,
    /// Total columns produced this session, including evicted ones
    columns_produced: u64,
}

impl StreamSession {
    /// Create a session for a validated configuration
    pub fn new(config: SpectrogramConfig) -> Result<Self, ConfigError> {
        if let Err(err) = config.validate() {
            log_config_error(&err, "StreamSession::new");
            return Err(err);
        }
        let analyzer = SpectralAnalyzer::new(&config)?;
        let timing = TimingCompensator::new(&config);

        Ok(Self {
            buffer: Vec::with_capacity(config.fft_size * 2),
            analyzer,
            timing,
            columns: VecDeque::new(),
            columns_produced: 0,
            config,
        })
    }

    /// Ingest a chunk of normalized samples, producing completed columns
    ///
    /// An arbitrary chunk may complete zero, one, or many windows; the
    /// columns completed by this call are returned in production order
    /// and also appended to the bounded history.
    pub fn ingest(&mut self, samples: &[f32]) -> Vec<Vec<f32>> {
        self.buffer.extend_from_slice(samples);

        let fft_size = self.config.fft_size;
        let hop_size = self.config.hop_size;
        let mut produced = Vec::new();

        while self.buffer.len() >= fft_size {
            let started = Instant::now();
            let column = self.analyzer.analyze(&self.buffer[..fft_size]);
            self.timing.record_processing_time(started.elapsed());
            self.timing.record_column(Instant::now());

            self.columns.push_back(column.clone());
            if self.columns.len() > self.config.history_capacity {
                self.columns.pop_front();
            }
            self.columns_produced += 1;
            produced.push(column);

            // Retain the overlap tail for the next window
            self.buffer.drain(..hop_size);
        }

        produced
    }

    /// Ingest raw 16-bit signed PCM, normalizing by 32768.0
    pub fn ingest_i16(&mut self, samples: &[i16]) -> Vec<Vec<f32>> {
        let normalized: Vec<f32> = samples.iter().map(|&s| pcm_i16_to_f32(s)).collect();
        self.ingest(&normalized)
    }

    /// Clear buffer, histories, and analyzer state for a fresh session
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.columns.clear();
        self.columns_produced = 0;
        self.analyzer.reset();
        self.timing.reset();
        tracing::debug!("[StreamSession] Session reset");
    }

    /// Snapshot of the retained column history, oldest first
    pub fn columns(&self) -> &VecDeque<Vec<f32>> {
        &self.columns
    }

    /// A single retained column by history index
    pub fn column(&self, index: usize) -> Option<&[f32]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    /// Number of retained columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Total columns produced this session, including evicted ones
    pub fn columns_produced(&self) -> u64 {
        self.columns_produced
    }

    /// Windows that degraded to an all-zero column
    pub fn degraded_columns(&self) -> u64 {
        self.analyzer.degraded_columns()
    }

    pub fn timing(&self) -> &TimingCompensator {
        &self.timing
    }

    pub fn config(&self) -> &SpectrogramConfig {
        &self.config
    }

    /// Diagnostic CSV export of the retained history
    ///
    /// One row per column: uncompensated time, compensated time, then
    /// one field per band. Times are in seconds; the uncompensated
    /// column uses the nominal hop grid of the column's absolute index.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let first_index = self.columns_produced - self.columns.len() as u64;
        for (offset, column) in self.columns.iter().enumerate() {
            let nominal =
                (first_index + offset as u64) as f64 * self.config.hop_period_secs();
            let compensated = self.timing.compensated_time(offset).as_secs_f64();
            write!(writer, "{:.6},{:.6}", nominal, compensated)?;
            for value in column {
                write!(writer, ",{:.6}", value)?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}
