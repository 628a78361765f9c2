// Stream module - real-time spectrogram ingest
//
// This module orchestrates the live half of the pipeline, turning an
// ordered stream of sample chunks into a bounded history of timestamped
// spectrogram columns.
//
// Architecture:
// - ChunkQueue: lock-free SPSC transfer from the capture thread
// - StreamWorker: dedicated thread draining the queue into a session
// - StreamSession: sliding-window buffer + analyzer + bounded history
// - TimingCompensator: processing-delay corrected column timestamps

pub mod chunk_queue;
pub mod session;
pub mod timing;
pub mod worker;

pub use chunk_queue::{ChunkQueue, ChunkQueueChannels, SampleChunk};
pub use session::StreamSession;
pub use timing::TimingCompensator;
pub use worker::{column_stream, spawn_stream_worker, StreamColumn};
