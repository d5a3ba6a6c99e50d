mod error;
mod log;
mod message;

pub use error::{AppError, AppResult};
pub use log::{
    BatchCollector, BatchConsumer, BatchDecoder, ByteStream, FileByteStream, ReaderByteStream,
    SegmentAppender, Skip, StopIteration, DEFAULT_CHUNK_SIZE,
};
pub use message::{
    BatchHeader, BatchRecords, Compression, Record, RecordBatch, RecordBatchBuilder,
};
