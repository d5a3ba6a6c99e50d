//! The record-batch data model: wire constants, header, record, and the
//! batch itself with its two payload shapes.

pub(crate) mod constants;

mod batch_header;
mod compression;
mod record;
mod record_batch;

#[cfg(test)]
pub(crate) mod random_batch;

pub use batch_header::BatchHeader;
pub use compression::Compression;
pub use record::Record;
pub use record_batch::{BatchRecords, RecordBatch, RecordBatchBuilder};
