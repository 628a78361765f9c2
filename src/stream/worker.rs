// StreamWorker - dedicated ingest thread for real-time sessions
//
// Consumes sample chunks from the lock-free data queue in arrival
// order, drives a StreamSession, and publishes every finished column
// on a tokio broadcast channel for rendering/export consumers. The
// capture side may run concurrently with analysis of the previous
// chunk; analysis itself is strictly sequential per session.
//
// Shutdown: clear the `running` flag; the worker drains the data queue
// and exits once it is empty, returning the session (with its full
// retained history) through the join handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rtrb::{Consumer, PopError, Producer};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::stream::chunk_queue::SampleChunk;
use crate::stream::session::StreamSession;

/// One finished spectrogram column as published to live consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamColumn {
    /// Absolute column index since session start (survives eviction)
    pub index: u64,
    /// Uncompensated generation time in milliseconds since stream start
    pub timestamp_ms: u64,
    /// Processing-delay compensated time in milliseconds
    pub compensated_ms: u64,
    /// Normalized band magnitudes in [0.0, 1.0]
    pub bands: Vec<f32>,
}

/// Build the broadcast payloads for the columns just produced
///
/// `produced` must be the return value of the session's most recent
/// `ingest` call: the payloads are matched to the tail of the history
/// and its timestamp record.
pub fn stream_columns(
    session: &StreamSession,
    produced: Vec<Vec<f32>>,
) -> Vec<StreamColumn> {
    let produced_len = produced.len() as u64;
    let base_index = session.columns_produced() - produced_len;
    // History index of the first produced column; saturates when a
    // single ingest overflowed the bounded history
    let base_history = session.len().saturating_sub(produced.len());

    produced
        .into_iter()
        .enumerate()
        .map(|(offset, bands)| {
            let history_index = base_history + offset;
            let timestamp_ms = session
                .timing()
                .raw_time(history_index)
                .unwrap_or(Duration::ZERO)
                .as_millis() as u64;
            let compensated_ms = session
                .timing()
                .compensated_time(history_index)
                .as_millis() as u64;
            StreamColumn {
                index: base_index + offset as u64,
                timestamp_ms,
                compensated_ms,
                bands,
            }
        })
        .collect()
}

struct StreamWorker {
    data_consumer: Consumer<SampleChunk>,
    pool_producer: Producer<SampleChunk>,
    session: StreamSession,
    column_tx: broadcast::Sender<StreamColumn>,
    running: Arc<AtomicBool>,
}

impl StreamWorker {
    fn run(mut self) -> StreamSession {
        tracing::info!("[StreamWorker] Starting ingest loop");

        loop {
            let chunk = match self.data_consumer.pop() {
                Ok(chunk) => chunk,
                Err(PopError::Empty) => {
                    // Check the running flag only when the queue is
                    // drained so no ordered chunk is left behind
                    if !self.running.load(Ordering::SeqCst) {
                        tracing::info!(
                            "[StreamWorker] Running flag cleared and queue empty, exiting"
                        );
                        break;
                    }
                    thread::sleep(Duration::from_millis(1));
                    continue;
                }
            };

            let produced = self.session.ingest(&chunk);

            // Return the chunk to the pool immediately
            if self.pool_producer.push(chunk).is_err() {
                tracing::warn!("[StreamWorker] Pool queue full, dropping chunk");
            }

            for column in stream_columns(&self.session, produced) {
                // Send failures just mean no live subscribers
                let _ = self.column_tx.send(column);
            }
        }

        tracing::info!(
            "[StreamWorker] Exiting after {} columns ({} degraded)",
            self.session.columns_produced(),
            self.session.degraded_columns()
        );
        self.session
    }
}

/// Spawn the ingest thread for a session
///
/// # Arguments
/// * `session` - Fresh session; returned through the join handle on exit
/// * `data_consumer` / `pool_producer` - Worker side of a `ChunkQueue`
/// * `column_tx` - Broadcast sender for finished columns
/// * `running` - Set to `false` to stop once the data queue is drained
pub fn spawn_stream_worker(
    session: StreamSession,
    data_consumer: Consumer<SampleChunk>,
    pool_producer: Producer<SampleChunk>,
    column_tx: broadcast::Sender<StreamColumn>,
    running: Arc<AtomicBool>,
) -> JoinHandle<StreamSession> {
    thread::spawn(move || {
        let worker = StreamWorker {
            data_consumer,
            pool_producer,
            session,
            column_tx,
            running,
        };
        worker.run()
    })
}

/// Wrap a broadcast receiver as an async stream of columns
pub fn column_stream(
    receiver: broadcast::Receiver<StreamColumn>,
) -> BroadcastStream<StreamColumn> {
    BroadcastStream::new(receiver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BandAggregationConfig, SpectrogramConfig};
    use crate::stream::chunk_queue::ChunkQueue;

    fn small_config() -> SpectrogramConfig {
        SpectrogramConfig {
            fft_size: 512,
            hop_size: 128,
            band_count: 32,
            aggregation: BandAggregationConfig::Uniform { max_freq: 8_000.0 },
            ..SpectrogramConfig::default()
        }
    }

    #[test]
    fn test_worker_processes_chunks_in_order() {
        let config = small_config();
        let session = StreamSession::new(config).unwrap();
        let mut channels = ChunkQueue::new(8, 512);
        let (column_tx, mut column_rx) = broadcast::channel(256);
        let running = Arc::new(AtomicBool::new(true));

        let handle = spawn_stream_worker(
            session,
            channels.data_consumer,
            channels.pool_producer,
            column_tx,
            Arc::clone(&running),
        );

        // Feed four chunks of a 440 Hz tone from the "capture" side
        for i in 0..4 {
            let mut chunk = loop {
                match channels.pool_consumer.pop() {
                    Ok(chunk) => break chunk,
                    Err(_) => thread::sleep(Duration::from_millis(1)),
                }
            };
            for (j, sample) in chunk.iter_mut().enumerate() {
                let t = (i * 512 + j) as f32 / 44_100.0;
                *sample = (2.0 * std::f32::consts::PI * 440.0 * t).sin();
            }
            channels.data_producer.push(chunk).expect("push chunk");
        }

        running.store(false, Ordering::SeqCst);
        let session = handle.join().expect("worker thread panicked");

        // 2048 samples, fft 512, hop 128: floor((2048-512)/128)+1 = 13
        assert_eq!(session.columns_produced(), 13);

        let mut received = Vec::new();
        while let Ok(column) = column_rx.try_recv() {
            received.push(column);
        }
        assert_eq!(received.len(), 13, "every column must be broadcast");
        for (i, column) in received.iter().enumerate() {
            assert_eq!(column.index, i as u64, "columns must arrive in order");
            assert_eq!(column.bands.len(), 32);
        }
    }

    #[test]
    fn test_column_stream_wraps_receiver() {
        let (column_tx, column_rx) = broadcast::channel(16);
        let stream = column_stream(column_rx);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("failed to build test runtime");

        column_tx
            .send(StreamColumn {
                index: 0,
                timestamp_ms: 0,
                compensated_ms: 0,
                bands: vec![0.0; 4],
            })
            .unwrap();

        runtime.block_on(async move {
            use tokio_stream::StreamExt;
            let mut stream = stream;
            let column = stream.next().await.expect("stream item").expect("lagged");
            assert_eq!(column.index, 0);
        });
    }
}
