use std::io::SeekFrom;
use std::path::Path;

use bytes::Bytes;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt};

use crate::{AppError, AppResult};

pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Abstract supplier of raw bytes to the decoder. The decoder has no I/O
/// surface of its own; everything it reads comes through here, one chunk at
/// a time. `None` means the stream is definitively exhausted, not a
/// transient stall. Retrying transient conditions is the implementation's
/// business and stays invisible to the decoder.
pub trait ByteStream {
    async fn read_chunk(&mut self) -> AppResult<Option<Bytes>>;
}

/// Chunked adapter over any async reader. A file, an in-memory cursor in
/// tests, or a network stream all fit.
#[derive(Debug)]
pub struct ReaderByteStream<R> {
    reader: R,
    chunk_size: usize,
}

impl<R: AsyncRead + Unpin> ReaderByteStream<R> {
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be positive");
        ReaderByteStream { reader, chunk_size }
    }
}

impl<R: AsyncRead + Unpin> ByteStream for ReaderByteStream<R> {
    async fn read_chunk(&mut self) -> AppResult<Option<Bytes>> {
        let mut chunk = vec![0u8; self.chunk_size];
        let n = self.reader.read(&mut chunk).await?;
        if n == 0 {
            Ok(None)
        } else {
            chunk.truncate(n);
            Ok(Some(Bytes::from(chunk)))
        }
    }
}

/// Byte stream over a log segment file.
pub type FileByteStream = ReaderByteStream<File>;

impl FileByteStream {
    pub async fn open<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        Self::open_at(path, 0).await
    }

    /// Opens a segment for reading starting at `position`. Mapping a logical
    /// offset to a byte position is the segment layer's job; this only seeks.
    pub async fn open_at<P: AsRef<Path>>(path: P, position: u64) -> AppResult<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .open(&path)
            .await
            .map_err(|e| {
                AppError::DetailedIoError(format!(
                    "open file: {} error: {} while open byte stream",
                    path.as_ref().to_string_lossy(),
                    e
                ))
            })?;
        if position > 0 {
            file.seek(SeekFrom::Start(position)).await.map_err(|e| {
                AppError::DetailedIoError(format!(
                    "seek file: {} to {} error: {} while open byte stream",
                    path.as_ref().to_string_lossy(),
                    position,
                    e
                ))
            })?;
        }
        Ok(ReaderByteStream::new(file))
    }
}
