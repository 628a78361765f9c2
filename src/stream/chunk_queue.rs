// ChunkQueue - lock-free chunk transfer with dual SPSC queues
//
// Implements an object pool pattern using two lock-free SPSC (Single
// Producer Single Consumer) ring buffers between the capture thread
// and the stream worker. This design avoids heap allocations on the
// capture side and preserves strict arrival order, which the sliding
// buffer depends on.
//
// Chunk flow:
// 1. Capture thread pops an empty chunk from POOL_QUEUE
// 2. Capture thread fills it with samples
// 3. Capture thread pushes the filled chunk to DATA_QUEUE
// 4. Stream worker pops the filled chunk from DATA_QUEUE
// 5. Stream worker ingests the samples
// 6. Stream worker pushes the empty chunk back to POOL_QUEUE

use rtrb::{Consumer, Producer};

/// Configuration constants for the chunk queue
pub const DEFAULT_CHUNK_COUNT: usize = 16;
pub const DEFAULT_CHUNK_SIZE: usize = 2048;

/// Sample chunk type - pre-allocated vector of f32 samples
pub type SampleChunk = Vec<f32>;

/// Split chunk queue channels for producer/consumer separation
///
/// Returned by `ChunkQueue::new()`; provides ownership-based access to
/// the dual-queue system. The data producer and pool consumer move to
/// the capture side, their counterparts to the worker.
pub struct ChunkQueueChannels {
    /// Producer for sending filled chunks to the stream worker
    pub data_producer: Producer<SampleChunk>,
    /// Consumer for receiving filled chunks in the stream worker
    pub data_consumer: Consumer<SampleChunk>,
    /// Producer for returning empty chunks from the stream worker
    pub pool_producer: Producer<SampleChunk>,
    /// Consumer for retrieving empty chunks on the capture side
    pub pool_consumer: Consumer<SampleChunk>,
}

/// Lock-free chunk pool using dual SPSC ring buffers
///
/// Pre-allocates a fixed number of sample chunks and circulates them
/// through two lock-free queues. All heap allocation happens during
/// initialization, keeping the capture side allocation-free.
///
/// # Thread Safety
/// - Lock-free: no mutex in queue operations
/// - Wait-free: push/pop have bounded execution time
pub struct ChunkQueue;

impl ChunkQueue {
    /// Create a new ChunkQueue with the given chunk count and size
    ///
    /// # Arguments
    /// * `chunk_count` - Number of chunks to pre-allocate (typical: 8-32)
    /// * `chunk_size` - Size of each chunk in f32 samples
    ///
    /// # Panics
    /// Panics if chunk_count or chunk_size is 0
    #[allow(clippy::new_ret_no_self)]
    pub fn new(chunk_count: usize, chunk_size: usize) -> ChunkQueueChannels {
        assert!(chunk_count > 0, "chunk_count must be greater than 0");
        assert!(chunk_size > 0, "chunk_size must be greater than 0");

        let (mut pool_producer, pool_consumer) = rtrb::RingBuffer::new(chunk_count);
        let (data_producer, data_consumer) = rtrb::RingBuffer::new(chunk_count);

        // Pre-allocate all chunks into the pool queue; the only place
        // where heap allocation occurs
        for _ in 0..chunk_count {
            let chunk = vec![0.0_f32; chunk_size];
            pool_producer
                .push(chunk)
                .expect("Failed to push chunk to pool queue during initialization");
        }

        ChunkQueueChannels {
            data_producer,
            data_consumer,
            pool_producer,
            pool_consumer,
        }
    }
}
