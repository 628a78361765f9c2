// DSP module - spectral analysis pipeline
//
// This module holds the pure signal-processing stages of the
// spectrogram pipeline:
// - window: Hamming/Hann coefficient generation (cached per length)
// - mel: triangular mel-scale filter bank construction
// - analyzer: windowed FFT -> band aggregation -> adaptive
//   dynamic-range normalization
//
// Everything here is deterministic given its inputs; the only mutable
// state is the analyzer's bounded magnitude history, owned per session.

pub mod analyzer;
pub mod mel;
pub mod window;

pub use analyzer::{BandAggregation, SpectralAnalyzer};
pub use mel::{hz_to_mel, mel_to_hz, MelFilterBank};
pub use window::WindowKind;
