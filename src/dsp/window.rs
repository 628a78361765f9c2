// Window functions for spectral analysis
//
// Pre-multiplying each analysis window reduces spectral leakage before
// the FFT. Only a handful of distinct lengths occur per process (the
// FFT size, occasionally a preview size), so coefficient vectors are
// computed once and shared from a small cache.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Window function selected at session configuration time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    Hamming,
    Hann,
}

static COEFFICIENT_CACHE: Lazy<Mutex<HashMap<(WindowKind, usize), Arc<[f32]>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

impl WindowKind {
    /// Get the multiplicative weights for a window of `len` samples
    ///
    /// Hamming: `0.54 - 0.46 * cos(2π * i / (N - 1))`
    /// Hann:    `0.5 * (1 - cos(2π * i / (N - 1)))`
    ///
    /// Results are cached per (kind, len) and shared via `Arc`.
    pub fn coefficients(self, len: usize) -> Arc<[f32]> {
        let mut cache = COEFFICIENT_CACHE.lock().unwrap();
        cache
            .entry((self, len))
            .or_insert_with(|| self.compute(len).into())
            .clone()
    }

    fn compute(self, len: usize) -> Vec<f32> {
        if len <= 1 {
            return vec![1.0; len];
        }
        let denom = (len - 1) as f32;
        (0..len)
            .map(|i| {
                let phase = (2.0 * std::f32::consts::PI * i as f32) / denom;
                match self {
                    WindowKind::Hamming => 0.54 - 0.46 * phase.cos(),
                    WindowKind::Hann => 0.5 * (1.0 - phase.cos()),
                }
            })
            .collect()
    }
}
