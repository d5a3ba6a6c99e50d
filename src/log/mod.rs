//! Streaming side of the log format:
//!
//! - Byte-stream source abstraction over storage reads
//! - The batch consumer protocol with its skip/stop controls
//! - The resumable streaming decoder
//! - The segment appender that writes batches back out

mod batch_consumer;
mod batch_decoder;
mod byte_stream;
mod segment_appender;

// Re-exports
pub use batch_consumer::{BatchCollector, BatchConsumer, Skip, StopIteration};
pub use batch_decoder::BatchDecoder;
pub use byte_stream::{ByteStream, FileByteStream, ReaderByteStream, DEFAULT_CHUNK_SIZE};
pub use segment_appender::SegmentAppender;
