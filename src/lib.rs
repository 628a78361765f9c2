// Spectrostream - real-time spectrogram pipeline
// Sliding-window FFT analysis with lock-free streaming ingest

// Module declarations
pub mod batch;
pub mod config;
pub mod dsp;
pub mod error;
pub mod fixtures;
pub mod stream;
pub mod wav;

// Re-exports for convenience
pub use batch::{BatchDriver, BatchProgress, BatchResult};
pub use config::{BandAggregationConfig, SpectrogramConfig};
pub use dsp::{BandAggregation, MelFilterBank, SpectralAnalyzer, WindowKind};
pub use error::{ConfigError, WavError};
pub use stream::{StreamColumn, StreamSession, TimingCompensator};
pub use wav::{decode_wav, read_wav_file, WavAudio};
