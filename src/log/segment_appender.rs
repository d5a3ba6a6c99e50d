use std::path::Path;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::trace;

use crate::message::RecordBatch;
use crate::{AppError, AppResult};

/// Appends batches to a log segment in the wire format the decoder reads
/// back. A batch is only ever written whole, so a reader synchronizing on
/// the flush boundary can never observe an interleaved or half-written
/// batch.
#[derive(Debug)]
pub struct SegmentAppender {
    writer: BufWriter<File>,
    file_name: String,
    size: u64,
}

impl SegmentAppender {
    pub async fn open<P: AsRef<Path>>(file_name: P) -> AppResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_name)
            .await
            .map_err(|e| {
                AppError::DetailedIoError(format!(
                    "open file: {} error: {} while open segment appender",
                    file_name.as_ref().to_string_lossy(),
                    e
                ))
            })?;

        let metadata = file.metadata().await.map_err(|e| {
            AppError::DetailedIoError(format!(
                "get file: {} metadata error: {} while open segment appender",
                file_name.as_ref().to_string_lossy(),
                e
            ))
        })?;

        Ok(SegmentAppender {
            writer: BufWriter::new(file),
            file_name: file_name.as_ref().to_string_lossy().into_owned(),
            size: metadata.len(),
        })
    }

    /// Serializes one complete batch and appends it. The batch is validated
    /// first so the header's record count and compression attribute always
    /// agree with the payload bytes actually written. The bytes become
    /// visible to readers only after [`SegmentAppender::flush`].
    pub async fn append_batch(&mut self, batch: &RecordBatch) -> AppResult<usize> {
        batch.validate()?;
        let encoded = batch.encode();
        self.writer.write_all(&encoded).await?;
        self.size += encoded.len() as u64;
        trace!(
            "{} appended batch, base offset {}, {} bytes",
            &self.file_name,
            batch.base_offset(),
            encoded.len()
        );
        Ok(encoded.len())
    }

    /// Drains the write buffer and syncs the file, the durability point a
    /// reader of the same bytes must wait for. Returns the segment size.
    pub async fn flush(&mut self) -> AppResult<u64> {
        self.writer.flush().await?;
        self.writer.get_ref().sync_all().await?;
        trace!("{} file flush finished", &self.file_name);
        Ok(self.size)
    }

    /// Bytes appended so far, flushed or not.
    pub fn size(&self) -> u64 {
        self.size
    }
}
