//! TimingCompensator - processing-delay corrected column timestamps
//!
//! Real-time analysis introduces variable per-window compute latency;
//! without compensation, a spectrogram cursor used for seeking during
//! synchronized playback would visually lag or lead the true audio
//! position. This module keeps a wall-clock timestamp per column, a
//! rolling window of observed processing durations, and maps between
//! column indices and compensated stream times.
//!
//! The timestamp record is a parallel array to the session's column
//! history: both are appended and evicted in lock-step, so a history
//! index is always a valid timestamp index.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::SpectrogramConfig;

pub struct TimingCompensator {
    /// Reference instant for the session; column times are relative to it
    stream_start: Instant,
    /// Wall-clock generation instant per retained column
    timestamps: VecDeque<Instant>,
    /// Matches the session's column history capacity
    capacity: usize,
    /// Observed per-window processing durations
    processing_times: VecDeque<Duration>,
    processing_window_len: usize,
    delay_safety_factor: f32,
    max_delay: Duration,
    /// Derived estimate: clamp(average * safety_factor, 0, max_delay)
    delay_estimate: Duration,
    hop_period_secs: f64,
}

impl TimingCompensator {
    pub fn new(config: &SpectrogramConfig) -> Self {
        Self {
            stream_start: Instant::now(),
            timestamps: VecDeque::with_capacity(config.history_capacity.min(4096)),
            capacity: config.history_capacity,
            processing_times: VecDeque::with_capacity(config.timing.processing_window_len),
            processing_window_len: config.timing.processing_window_len,
            delay_safety_factor: config.timing.delay_safety_factor,
            max_delay: Duration::from_millis(config.timing.max_delay_ms),
            delay_estimate: Duration::ZERO,
            hop_period_secs: config.hop_period_secs(),
        }
    }

    /// Record one observed per-window processing duration
    ///
    /// Recomputes the delay estimate as the rolling average scaled by
    /// the safety factor and clamped to the configured maximum. A
    /// runaway duration therefore degrades the estimate to the maximum
    /// instead of failing.
    pub fn record_processing_time(&mut self, duration: Duration) {
        self.processing_times.push_back(duration);
        if self.processing_times.len() > self.processing_window_len {
            self.processing_times.pop_front();
        }

        let total: Duration = self.processing_times.iter().sum();
        let average = total / self.processing_times.len() as u32;
        self.delay_estimate = average
            .mul_f32(self.delay_safety_factor)
            .min(self.max_delay);
    }

    /// Record the wall-clock instant a column was generated
    ///
    /// Must be called exactly once per column appended to the session
    /// history, in the same order; evicts in lock-step with it.
    pub fn record_column(&mut self, generated_at: Instant) {
        self.timestamps.push_back(generated_at);
        if self.timestamps.len() > self.capacity {
            self.timestamps.pop_front();
        }
    }

    /// Compensated stream time for a history index
    ///
    /// With a recorded timestamp: `max(0, (generated - stream_start) -
    /// delay_estimate)`. Without one, falls back to the nominal hop
    /// grid `index * hop_size / sample_rate`.
    pub fn compensated_time(&self, index: usize) -> Duration {
        match self.timestamps.get(index) {
            Some(generated_at) => generated_at
                .duration_since(self.stream_start)
                .saturating_sub(self.delay_estimate),
            None => Duration::from_secs_f64(index as f64 * self.hop_period_secs),
        }
    }

    /// Uncompensated generation time for a history index, if recorded
    pub fn raw_time(&self, index: usize) -> Option<Duration> {
        self.timestamps
            .get(index)
            .map(|generated_at| generated_at.duration_since(self.stream_start))
    }

    /// History index whose compensated time is closest to `target`
    ///
    /// Linear scan; compensation can be locally non-monotonic, so no
    /// ordering assumption is made. Acceptable at history sizes of a
    /// few thousand entries. Falls back to the nominal hop grid when no
    /// timestamps exist yet.
    pub fn nearest_column_index(&self, target: Duration) -> usize {
        if self.timestamps.is_empty() {
            return (target.as_secs_f64() / self.hop_period_secs).round() as usize;
        }

        let target_secs = target.as_secs_f64();
        let mut best_index = 0;
        let mut best_error = f64::INFINITY;
        for index in 0..self.timestamps.len() {
            let error = (self.compensated_time(index).as_secs_f64() - target_secs).abs();
            if error < best_error {
                best_error = error;
                best_index = index;
            }
        }
        best_index
    }

    /// Current processing-delay estimate
    pub fn delay_estimate(&self) -> Duration {
        self.delay_estimate
    }

    /// Whether any processing durations have been observed yet
    pub fn has_timing_data(&self) -> bool {
        !self.processing_times.is_empty()
    }

    /// Number of retained column timestamps
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn stream_start(&self) -> Instant {
        self.stream_start
    }

    /// Restart the reference clock and drop all recorded state
    pub fn reset(&mut self) {
        self.stream_start = Instant::now();
        self.timestamps.clear();
        self.processing_times.clear();
        self.delay_estimate = Duration::ZERO;
    }
}
