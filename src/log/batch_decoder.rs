//! Pull-style streaming decoder for the record-batch format.
//!
//! The decoder pulls chunks from a [`ByteStream`], parses batches
//! incrementally, and drives a [`BatchConsumer`] through each one. It is a
//! cooperative single-reader state machine: the only suspension points are
//! the stream reads, a partially read field stays buffered until enough
//! bytes arrive, and a call to [`BatchDecoder::consume`] after an earlier
//! call stopped mid-stream resumes at the exact next byte with nothing
//! re-read or dropped.

use bytes::{Buf, Bytes, BytesMut};
use integer_encoding::VarInt;
use tracing::{error, trace};

use crate::log::{BatchConsumer, ByteStream, Skip, StopIteration};
use crate::message::constants::*;
use crate::message::BatchHeader;
use crate::{AppError, AppResult};

/// Longest possible encoding of an i64 varint.
const MAX_VARINT_LEN: usize = 10;

/// Explicit continuation of the decode loop, carried across `consume()`
/// calls instead of an implicit call stack.
#[derive(Debug, Clone, Copy)]
enum DecodeState {
    /// At a batch boundary, about to read the next header.
    AwaitingBatchHeader,
    /// Seeking past a batch the consumer rejected; internals are not parsed.
    SkippingBatch { remaining: usize },
    /// Inside an uncompressed batch, `remaining` records still to deliver.
    AwaitingRecords {
        remaining: usize,
        payload_remaining: usize,
    },
    /// Inside a compressed batch, the blob not yet fully available.
    AwaitingCompressedBlob { size: usize },
    /// Payload done, terminal event and checksum verdict pending.
    BatchComplete { verify_crc: bool },
}

pub struct BatchDecoder<S, C> {
    stream: S,
    consumer: C,
    /// Bytes pulled from the stream but not yet consumed by parsing.
    buffer: BytesMut,
    /// The stream reported definitive end-of-stream.
    exhausted: bool,
    state: DecodeState,
    expected_crc: u32,
    running_crc: u32,
}

impl<S: ByteStream, C: BatchConsumer> BatchDecoder<S, C> {
    pub fn new(stream: S, consumer: C) -> Self {
        BatchDecoder {
            stream,
            consumer,
            buffer: BytesMut::new(),
            exhausted: false,
            state: DecodeState::AwaitingBatchHeader,
            expected_crc: 0,
            running_crc: 0,
        }
    }

    pub fn consumer(&self) -> &C {
        &self.consumer
    }

    pub fn consumer_mut(&mut self) -> &mut C {
        &mut self.consumer
    }

    pub fn into_consumer(self) -> C {
        self.consumer
    }

    /// True once end-of-stream has been observed and no buffered bytes
    /// remain, i.e. a further `consume()` cannot make progress.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted && self.buffer.is_empty()
    }

    /// Processes as many whole batches as the stream can supply, returning
    /// the number completed in this call. Returns early only when the
    /// consumer stops the iteration at a batch end, or at end-of-stream. A
    /// partial record is never delivered: if the stream ends inside a batch
    /// the session fails with a corruption error, while ending exactly at a
    /// batch boundary is normal termination.
    pub async fn consume(&mut self) -> AppResult<usize> {
        let mut batches = 0usize;
        loop {
            match self.state {
                DecodeState::AwaitingBatchHeader => {
                    if !self.fill(RECORD_BATCH_OVERHEAD).await? {
                        if self.buffer.is_empty() {
                            return Ok(batches);
                        }
                        return Err(self.corrupt(format!(
                            "stream ended with {} trailing bytes, too few for a batch header",
                            self.buffer.len()
                        )));
                    }
                    let header_bytes = self.buffer.split_to(RECORD_BATCH_OVERHEAD).freeze();
                    let header = BatchHeader::decode(&mut header_bytes.clone());
                    self.validate_header(&header)?;

                    let compression = header.compression()?;
                    let payload_size = header.payload_size();
                    let record_count = header.records_count as usize;
                    self.expected_crc = header.crc;
                    self.running_crc = crc32c::crc32c(&header_bytes[ATTRIBUTES_OFFSET..]);
                    trace!(
                        "batch header decoded, base offset {}, {} records, payload {} bytes",
                        header.base_offset,
                        record_count,
                        payload_size
                    );

                    self.state = match self.consumer.consume_batch_start(header, record_count) {
                        Skip::Yes => {
                            trace!("consumer skipped batch, seeking {} bytes", payload_size);
                            DecodeState::SkippingBatch {
                                remaining: payload_size,
                            }
                        }
                        Skip::No if compression.is_none() => DecodeState::AwaitingRecords {
                            remaining: record_count,
                            payload_remaining: payload_size,
                        },
                        Skip::No => DecodeState::AwaitingCompressedBlob { size: payload_size },
                    };
                }
                DecodeState::SkippingBatch { remaining } => {
                    self.discard(remaining).await?;
                    self.state = DecodeState::BatchComplete { verify_crc: false };
                }
                DecodeState::AwaitingRecords {
                    remaining: 0,
                    payload_remaining,
                } => {
                    if payload_remaining != 0 {
                        return Err(self.corrupt(format!(
                            "{} payload bytes left over after the declared record count",
                            payload_remaining
                        )));
                    }
                    self.state = DecodeState::BatchComplete { verify_crc: true };
                }
                DecodeState::AwaitingRecords {
                    remaining,
                    payload_remaining,
                } => {
                    let consumed = self.decode_record(payload_remaining).await?;
                    self.state = DecodeState::AwaitingRecords {
                        remaining: remaining - 1,
                        payload_remaining: payload_remaining - consumed,
                    };
                }
                DecodeState::AwaitingCompressedBlob { size } => {
                    if !self.fill(size).await? {
                        return Err(self.corrupt(format!(
                            "stream ended inside a compressed payload of {} bytes",
                            size
                        )));
                    }
                    let blob = self.buffer.split_to(size).freeze();
                    self.running_crc = crc32c::crc32c_append(self.running_crc, &blob);
                    self.consumer.consume_compressed_records(blob);
                    self.state = DecodeState::BatchComplete { verify_crc: true };
                }
                DecodeState::BatchComplete { verify_crc } => {
                    if verify_crc && self.running_crc != self.expected_crc {
                        return Err(self.corrupt(format!(
                            "crc mismatch: expected {}, computed {}",
                            self.expected_crc, self.running_crc
                        )));
                    }
                    self.state = DecodeState::AwaitingBatchHeader;
                    batches += 1;
                    if let StopIteration::Yes = self.consumer.consume_batch_end() {
                        trace!("consumer stopped iteration after {} batches", batches);
                        return Ok(batches);
                    }
                }
            }
        }
    }

    fn validate_header(&self, header: &BatchHeader) -> AppResult<()> {
        if header.magic != MAGIC {
            return Err(self.corrupt(format!(
                "unsupported magic {}, only {} is supported",
                header.magic, MAGIC
            )));
        }
        if header.length < 0
            || header.batch_size() < RECORD_BATCH_OVERHEAD
        {
            return Err(self.corrupt(format!(
                "declared batch length {} is smaller than the header overhead",
                header.length
            )));
        }
        if header.batch_size() > MAX_BATCH_SIZE {
            return Err(AppError::MessageTooLarge(format!(
                "declared batch size {} exceeds the maximum {}",
                header.batch_size(),
                MAX_BATCH_SIZE
            )));
        }
        if header.records_count < 0 {
            return Err(self.corrupt(format!(
                "record count should be non-negative, but found {}",
                header.records_count
            )));
        }
        header.compression()?;
        Ok(())
    }

    /// Parses one record, delivering its key and, unless the consumer skips,
    /// its value+headers region. The whole record is buffered before any
    /// delivery, so a consumer never observes a partial record. Returns the
    /// on-disk bytes the record occupied.
    async fn decode_record(&mut self, payload_remaining: usize) -> AppResult<usize> {
        let (record_len, len_size) = self.read_varint().await?;
        if record_len <= 0 {
            return Err(self.corrupt(format!("invalid record length {}", record_len)));
        }
        let record_len = record_len as usize;
        if len_size + record_len > payload_remaining {
            return Err(self.corrupt(format!(
                "record of {} bytes overruns the {} bytes left in its batch",
                record_len, payload_remaining
            )));
        }

        let len_bytes = self.buffer.split_to(len_size).freeze();
        self.running_crc = crc32c::crc32c_append(self.running_crc, &len_bytes);
        if !self.fill(record_len).await? {
            return Err(self.corrupt(format!(
                "stream ended inside a record of {} bytes",
                record_len
            )));
        }
        let mut body = self.buffer.split_to(record_len).freeze();
        self.running_crc = crc32c::crc32c_append(self.running_crc, &body);

        let _attributes = body.get_i8();
        let timestamp_delta = Self::body_varint(&mut body)?;
        let offset_delta = Self::body_varint(&mut body)? as i32;
        let key = Self::body_payload(&mut body)?;

        match self
            .consumer
            .consume_record_key(record_len, timestamp_delta, offset_delta, key)
        {
            Skip::Yes => {
                // The rest of the body is the unread value region; dropping
                // it advances the cursor without a value callback.
                trace!("consumer skipped record value, {} bytes", body.remaining());
            }
            Skip::No => {
                let value_and_headers = Self::body_payload(&mut body)?;
                if body.has_remaining() {
                    return Err(self.corrupt(format!(
                        "record body holds {} bytes beyond its fields",
                        body.remaining()
                    )));
                }
                self.consumer.consume_record_value(value_and_headers);
            }
        }
        Ok(len_size + record_len)
    }

    /// Reads a length-prefixed region out of a fully buffered record body.
    /// A negative length marks an absent payload.
    fn body_payload(body: &mut Bytes) -> AppResult<Bytes> {
        let len = Self::body_varint(body)?;
        if len <= 0 {
            return Ok(Bytes::new());
        }
        let len = len as usize;
        if len > body.remaining() {
            return Err(AppError::CorruptMessage(format!(
                "payload length {} overruns its record body",
                len
            )));
        }
        Ok(body.split_to(len))
    }

    fn body_varint(body: &mut Bytes) -> AppResult<i64> {
        match i64::decode_var(body.chunk()) {
            Some((value, read_size)) => {
                body.advance(read_size);
                Ok(value)
            }
            None => Err(AppError::CorruptMessage(
                "truncated varint in record body".to_string(),
            )),
        }
    }

    /// Decodes a varint at the head of the buffer without consuming it,
    /// pulling more chunks while the encoding is incomplete.
    async fn read_varint(&mut self) -> AppResult<(i64, usize)> {
        loop {
            if let Some((value, read_size)) = i64::decode_var(&self.buffer) {
                return Ok((value, read_size));
            }
            if self.buffer.len() >= MAX_VARINT_LEN {
                return Err(self.corrupt("malformed varint".to_string()));
            }
            if !self.fill(self.buffer.len() + 1).await? {
                return Err(self.corrupt("stream ended inside a record length".to_string()));
            }
        }
    }

    /// Buffers at least `wanted` bytes. Returns false if the stream is
    /// exhausted first; whatever arrived stays buffered.
    async fn fill(&mut self, wanted: usize) -> AppResult<bool> {
        while self.buffer.len() < wanted {
            if self.exhausted {
                return Ok(false);
            }
            match self.stream.read_chunk().await? {
                Some(chunk) => self.buffer.extend_from_slice(&chunk),
                None => self.exhausted = true,
            }
        }
        Ok(true)
    }

    /// Advances the cursor past `remaining` bytes without retaining them,
    /// used for batch-level skips. Chunk tails past the skip region belong
    /// to the next batch and are kept.
    async fn discard(&mut self, mut remaining: usize) -> AppResult<()> {
        let buffered = remaining.min(self.buffer.len());
        self.buffer.advance(buffered);
        remaining -= buffered;

        while remaining > 0 {
            match self.stream.read_chunk().await? {
                Some(chunk) if chunk.len() > remaining => {
                    self.buffer.extend_from_slice(&chunk[remaining..]);
                    remaining = 0;
                }
                Some(chunk) => remaining -= chunk.len(),
                None => {
                    self.exhausted = true;
                    return Err(self.corrupt(format!(
                        "stream ended {} bytes short of a skipped batch's end",
                        remaining
                    )));
                }
            }
        }
        Ok(())
    }

    fn corrupt(&self, msg: String) -> AppError {
        error!("corrupt batch stream: {}", msg);
        AppError::CorruptMessage(msg)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::{Path, PathBuf};

    use bytes::Bytes;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::log::{BatchCollector, FileByteStream, ReaderByteStream, SegmentAppender};
    use crate::message::random_batch::make_random_batches;
    use crate::message::{BatchRecords, Record, RecordBatch, RecordBatchBuilder};

    /// Consumer with configurable skip budgets and per-batch stop, the
    /// counterpart of the collector the storage tests have always used.
    struct TestConsumer {
        batch_skips: usize,
        record_skips: usize,
        stop_at_batch: bool,
        batches: Vec<RecordBatch>,
        header: Option<BatchHeader>,
        num_records: usize,
        skipped_batch: bool,
        records: BatchRecords,
        pending: Option<(usize, i64, i32, Bytes)>,
    }

    impl TestConsumer {
        fn new(batch_skips: usize, record_skips: usize, stop_at_batch: bool) -> Self {
            TestConsumer {
                batch_skips,
                record_skips,
                stop_at_batch,
                batches: Vec::new(),
                header: None,
                num_records: 0,
                skipped_batch: false,
                records: BatchRecords::Uncompressed(Vec::new()),
                pending: None,
            }
        }
    }

    impl BatchConsumer for TestConsumer {
        fn consume_batch_start(&mut self, header: BatchHeader, num_records: usize) -> Skip {
            self.num_records = num_records;
            self.skipped_batch = false;
            let uncompressed = header.compression().unwrap().is_none();
            self.header = Some(header);
            if uncompressed {
                // Reset the variant.
                self.records = BatchRecords::Uncompressed(Vec::new());
                Skip::No
            } else if self.batch_skips > 0 {
                self.batch_skips -= 1;
                self.skipped_batch = true;
                Skip::Yes
            } else {
                Skip::No
            }
        }

        fn consume_record_key(
            &mut self,
            size_bytes: usize,
            timestamp_delta: i64,
            offset_delta: i32,
            key: Bytes,
        ) -> Skip {
            if self.record_skips > 0 {
                self.record_skips -= 1;
                return Skip::Yes;
            }
            self.pending = Some((size_bytes, timestamp_delta, offset_delta, key));
            Skip::No
        }

        fn consume_record_value(&mut self, value_and_headers: Bytes) {
            let (size_bytes, timestamp_delta, offset_delta, key) = self.pending.take().unwrap();
            if let BatchRecords::Uncompressed(records) = &mut self.records {
                let record = Record::new(timestamp_delta, offset_delta, key, value_and_headers);
                assert_eq!(record.size_bytes as usize, size_bytes);
                records.push(record);
            }
        }

        fn consume_compressed_records(&mut self, records: Bytes) {
            self.records = BatchRecords::Compressed {
                record_count: self.num_records as i32,
                records,
            };
        }

        fn consume_batch_end(&mut self) -> StopIteration {
            let header = self.header.take().unwrap();
            if !self.skipped_batch {
                let records = std::mem::replace(
                    &mut self.records,
                    BatchRecords::Uncompressed(Vec::new()),
                );
                self.batches.push(RecordBatch::new(header, records));
            }
            if self.stop_at_batch {
                StopIteration::Yes
            } else {
                StopIteration::No
            }
        }
    }

    async fn write_segment(dir: &TempDir, batches: &[RecordBatch]) -> PathBuf {
        let path = dir.path().join("0.log");
        let mut appender = SegmentAppender::open(&path).await.unwrap();
        for batch in batches {
            appender.append_batch(batch).await.unwrap();
        }
        appender.flush().await.unwrap();
        path
    }

    async fn decode_segment(path: &Path, consumer: TestConsumer) -> TestConsumer {
        let stream = FileByteStream::open(path).await.unwrap();
        let mut decoder = BatchDecoder::new(stream, consumer);
        while !decoder.is_exhausted() {
            decoder.consume().await.unwrap();
        }
        decoder.into_consumer()
    }

    fn encode_all(batches: &[RecordBatch]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for batch in batches {
            bytes.extend_from_slice(&batch.encode());
        }
        bytes
    }

    /// The reference skip semantics: compressed batches are skipped whole,
    /// drawing from the batch budget; the record budget applies only to the
    /// surviving uncompressed batches, in batch then record order.
    fn apply_skips(
        batches: Vec<RecordBatch>,
        mut batch_skips: usize,
        mut record_skips: usize,
    ) -> Vec<RecordBatch> {
        let mut expected = Vec::new();
        for mut batch in batches {
            if batch.compressed_payload() {
                if batch_skips > 0 {
                    batch_skips -= 1;
                    continue;
                }
            } else if record_skips > 0 {
                if let BatchRecords::Uncompressed(records) = &mut batch.records {
                    let n = record_skips.min(records.len());
                    records.drain(..n);
                    record_skips -= n;
                }
            }
            expected.push(batch);
        }
        expected
    }

    #[tokio::test]
    async fn test_parse_single_batch_end_to_end() {
        let mut builder = RecordBatchBuilder::default();
        for i in 0..5i64 {
            builder.append_record_with_offset(
                1 + i,
                1000 + i,
                format!("key-{}", i),
                format!("value-{}", i),
            );
        }
        let batch = builder.build();

        let dir = tempfile::tempdir().unwrap();
        let path = write_segment(&dir, std::slice::from_ref(&batch)).await;

        let stream = FileByteStream::open(&path).await.unwrap();
        let mut decoder = BatchDecoder::new(stream, BatchCollector::new());
        assert_eq!(decoder.consume().await.unwrap(), 1);

        let decoded = decoder.into_consumer().into_batches();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].base_offset(), 1);
        assert_eq!(decoded[0].records_count(), 5);
        assert_eq!(decoded[0], batch);
    }

    #[tokio::test]
    async fn test_parse_multiple_batches() {
        let batches = make_random_batches(0, 10);
        let dir = tempfile::tempdir().unwrap();
        let path = write_segment(&dir, &batches).await;

        let stream = FileByteStream::open(&path).await.unwrap();
        let mut decoder = BatchDecoder::new(stream, TestConsumer::new(0, 0, false));
        assert_eq!(decoder.consume().await.unwrap(), 10);
        assert_eq!(decoder.into_consumer().batches, batches);
    }

    #[tokio::test]
    async fn test_parse_multiple_batches_one_at_a_time() {
        let batches = make_random_batches(0, 10);
        let dir = tempfile::tempdir().unwrap();
        let path = write_segment(&dir, &batches).await;

        let stream = FileByteStream::open(&path).await.unwrap();
        let mut decoder = BatchDecoder::new(stream, TestConsumer::new(0, 0, true));
        let mut calls_with_progress = 0;
        while !decoder.is_exhausted() {
            let n = decoder.consume().await.unwrap();
            assert!(n <= 1);
            calls_with_progress += n;
        }
        assert_eq!(calls_with_progress, 10);
        assert_eq!(decoder.into_consumer().batches, batches);
    }

    #[tokio::test]
    async fn test_skips() {
        let batch_skips = 3;
        let record_skips = 25;
        let batches = make_random_batches(0, 12);
        let dir = tempfile::tempdir().unwrap();
        let path = write_segment(&dir, &batches).await;

        let consumer =
            decode_segment(&path, TestConsumer::new(batch_skips, record_skips, true)).await;
        let expected = apply_skips(batches, batch_skips, record_skips);
        assert_eq!(consumer.batches, expected);
    }

    #[tokio::test]
    async fn test_record_skip_spans_batches() {
        let mut batches = Vec::new();
        let mut builder = RecordBatchBuilder::default();
        for i in 0..5i64 {
            builder.append_record_with_offset(i, 100 + i, format!("k{}", i), format!("v{}", i));
        }
        batches.push(builder.build());
        let mut builder = RecordBatchBuilder::default();
        for i in 5..10i64 {
            builder.append_record_with_offset(i, 100 + i, format!("k{}", i), format!("v{}", i));
        }
        batches.push(builder.build());

        let dir = tempfile::tempdir().unwrap();
        let path = write_segment(&dir, &batches).await;

        let consumer = decode_segment(&path, TestConsumer::new(0, 7, false)).await;
        assert_eq!(consumer.batches.len(), 2);
        match &consumer.batches[0].records {
            BatchRecords::Uncompressed(records) => assert!(records.is_empty()),
            _ => panic!("expected uncompressed payload"),
        }
        match (&consumer.batches[1].records, &batches[1].records) {
            (BatchRecords::Uncompressed(got), BatchRecords::Uncompressed(original)) => {
                assert_eq!(got.as_slice(), &original[2..]);
            }
            _ => panic!("expected uncompressed payloads"),
        }
        // headers are untouched by record skips
        assert_eq!(consumer.batches[0].header, batches[0].header);
        assert_eq!(consumer.batches[1].header, batches[1].header);
    }

    #[tokio::test]
    async fn test_compressed_state_does_not_leak_into_uncompressed_batch() {
        let compressed = RecordBatch::compressed(
            0,
            1000,
            1002,
            crate::message::Compression::Snappy,
            3,
            Bytes::from_static(b"blob-bytes"),
        )
        .unwrap();
        let mut builder = RecordBatchBuilder::default();
        builder.append_record_with_offset(3, 2000, "k", "v");
        let uncompressed = builder.build();

        let batches = vec![compressed, uncompressed];
        let dir = tempfile::tempdir().unwrap();
        let path = write_segment(&dir, &batches).await;

        // delivered both ways: with the compressed batch consumed, and with
        // it skipped
        let consumer = decode_segment(&path, TestConsumer::new(0, 0, false)).await;
        assert_eq!(consumer.batches, batches);

        let consumer = decode_segment(&path, TestConsumer::new(1, 0, false)).await;
        assert_eq!(consumer.batches, batches[1..]);
        match &consumer.batches[0].records {
            BatchRecords::Uncompressed(records) => assert_eq!(records.len(), 1),
            _ => panic!("compressed payload leaked into uncompressed batch"),
        }
    }

    #[rstest]
    #[case(1)]
    #[case(7)]
    #[case(64)]
    #[tokio::test]
    async fn test_decode_resumes_across_tiny_chunks(#[case] chunk_size: usize) {
        let batches = make_random_batches(100, 6);
        let bytes = encode_all(&batches);

        let stream = ReaderByteStream::with_chunk_size(Cursor::new(bytes), chunk_size);
        let mut decoder = BatchDecoder::new(stream, TestConsumer::new(0, 0, true));
        while !decoder.is_exhausted() {
            decoder.consume().await.unwrap();
        }
        assert_eq!(decoder.into_consumer().batches, batches);
    }

    #[tokio::test]
    async fn test_empty_stream_is_clean_termination() {
        let stream = ReaderByteStream::new(Cursor::new(Vec::new()));
        let mut decoder = BatchDecoder::new(stream, TestConsumer::new(0, 0, false));
        assert_eq!(decoder.consume().await.unwrap(), 0);
        assert!(decoder.is_exhausted());
    }

    #[tokio::test]
    async fn test_truncated_batch_is_corruption() {
        let batches = make_random_batches(0, 2);
        let mut bytes = encode_all(&batches);
        bytes.truncate(bytes.len() - 5);

        let stream = ReaderByteStream::new(Cursor::new(bytes));
        let mut decoder = BatchDecoder::new(stream, TestConsumer::new(0, 0, false));
        let err = decoder.consume().await.unwrap_err();
        assert!(matches!(err, AppError::CorruptMessage(_)));
        // the first batch was whole and stays delivered
        assert_eq!(decoder.consumer().batches.as_slice(), &batches[..1]);
    }

    #[tokio::test]
    async fn test_partial_trailing_header_is_corruption() {
        let batches = make_random_batches(0, 1);
        let mut bytes = encode_all(&batches);
        bytes.extend_from_slice(&[0u8; 10]);

        let stream = ReaderByteStream::new(Cursor::new(bytes));
        let mut decoder = BatchDecoder::new(stream, TestConsumer::new(0, 0, false));
        let err = decoder.consume().await.unwrap_err();
        assert!(matches!(err, AppError::CorruptMessage(_)));
        assert_eq!(decoder.consumer().batches.as_slice(), &batches[..]);
    }

    #[tokio::test]
    async fn test_flipped_payload_byte_fails_crc() {
        let batches = make_random_batches(0, 1);
        let mut bytes = encode_all(&batches);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;

        let stream = ReaderByteStream::new(Cursor::new(bytes));
        let mut decoder = BatchDecoder::new(stream, TestConsumer::new(0, 0, false));
        let err = decoder.consume().await.unwrap_err();
        match err {
            AppError::CorruptMessage(msg) => assert!(msg.contains("crc")),
            other => panic!("expected crc corruption, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bad_magic_is_corruption() {
        let batches = make_random_batches(0, 1);
        let mut bytes = encode_all(&batches);
        bytes[MAGIC_OFFSET] = 1;

        let stream = ReaderByteStream::new(Cursor::new(bytes));
        let mut decoder = BatchDecoder::new(stream, TestConsumer::new(0, 0, false));
        let err = decoder.consume().await.unwrap_err();
        match err {
            AppError::CorruptMessage(msg) => assert!(msg.contains("magic")),
            other => panic!("expected magic corruption, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_negative_record_count_is_corruption() {
        let batches = make_random_batches(0, 1);
        let mut bytes = encode_all(&batches);
        bytes[RECORDS_COUNT_OFFSET..RECORDS_COUNT_OFFSET + 4]
            .copy_from_slice(&(-1i32).to_be_bytes());

        let stream = ReaderByteStream::new(Cursor::new(bytes));
        let mut decoder = BatchDecoder::new(stream, TestConsumer::new(0, 0, false));
        let err = decoder.consume().await.unwrap_err();
        assert!(err.is_corruption());
        match err {
            AppError::CorruptMessage(msg) => assert!(msg.contains("record count")),
            other => panic!("expected record count corruption, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_oversized_declared_length_is_rejected() {
        let batches = make_random_batches(0, 1);
        let mut bytes = encode_all(&batches);
        let declared = (MAX_BATCH_SIZE - LOG_OVERHEAD + 1) as i32;
        bytes[LENGTH_OFFSET..LENGTH_OFFSET + 4].copy_from_slice(&declared.to_be_bytes());

        let stream = ReaderByteStream::new(Cursor::new(bytes));
        let mut decoder = BatchDecoder::new(stream, TestConsumer::new(0, 0, false));
        let err = decoder.consume().await.unwrap_err();
        assert!(err.is_corruption());
        assert!(matches!(err, AppError::MessageTooLarge(_)));
    }

    #[tokio::test]
    async fn test_undersized_declared_length_is_corruption() {
        let batches = make_random_batches(0, 1);
        let mut bytes = encode_all(&batches);
        // declared length smaller than the header overhead
        bytes[LENGTH_OFFSET..LENGTH_OFFSET + 4].copy_from_slice(&10i32.to_be_bytes());

        let stream = ReaderByteStream::new(Cursor::new(bytes));
        let mut decoder = BatchDecoder::new(stream, TestConsumer::new(0, 0, false));
        let err = decoder.consume().await.unwrap_err();
        assert!(matches!(err, AppError::CorruptMessage(_)));
    }

    #[tokio::test]
    async fn test_skipped_batch_with_damaged_payload_is_not_parsed() {
        // a skipped batch's internals are irrelevant: damage its compressed
        // payload and crc, skip it, and the next batch still decodes
        let compressed = RecordBatch::compressed(
            0,
            0,
            0,
            crate::message::Compression::Gzip,
            1,
            Bytes::from_static(b"ruined"),
        )
        .unwrap();
        let mut builder = RecordBatchBuilder::default();
        builder.append_record_with_offset(1, 50, "k", "v");
        let clean = builder.build();

        let mut bytes = encode_all(std::slice::from_ref(&compressed));
        let payload_start = RECORD_BATCH_OVERHEAD;
        bytes[payload_start] ^= 0xff;
        bytes.extend_from_slice(&clean.encode());

        let stream = ReaderByteStream::new(Cursor::new(bytes));
        let mut decoder = BatchDecoder::new(stream, TestConsumer::new(1, 0, false));
        assert_eq!(decoder.consume().await.unwrap(), 2);
        assert_eq!(decoder.into_consumer().batches, vec![clean]);
    }
}
