//! In-memory representation of a decoded record batch and the builder used
//! to assemble new batches for writing. A batch is a `BatchHeader` plus a
//! payload in exactly one of two shapes, selected by the header's
//! compression attribute: an ordered record sequence, or one opaque
//! compressed blob that a higher layer owns the codec for.

use bytes::{Bytes, BytesMut};

use crate::message::constants::*;
use crate::message::{BatchHeader, Compression, Record};
use crate::{AppError, AppResult};

/// Payload of a batch. Re-assigning the variant discards the other shape's
/// storage entirely, so a batch can never be half one shape, half the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchRecords {
    Uncompressed(Vec<Record>),
    Compressed { record_count: i32, records: Bytes },
}

impl BatchRecords {
    pub fn record_count(&self) -> i32 {
        match self {
            BatchRecords::Uncompressed(records) => records.len() as i32,
            BatchRecords::Compressed { record_count, .. } => *record_count,
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, BatchRecords::Compressed { .. })
    }

    pub fn encoded_len(&self) -> usize {
        match self {
            BatchRecords::Uncompressed(records) => {
                records.iter().map(|r| r.encoded_len()).sum()
            }
            BatchRecords::Compressed { records, .. } => records.len(),
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        match self {
            BatchRecords::Uncompressed(records) => {
                for record in records {
                    record.encode(buf);
                }
            }
            BatchRecords::Compressed { records, .. } => {
                buf.extend_from_slice(records);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordBatch {
    pub header: BatchHeader,
    pub records: BatchRecords,
}

impl RecordBatch {
    pub fn new(header: BatchHeader, records: BatchRecords) -> RecordBatch {
        RecordBatch { header, records }
    }

    /// Builds a batch around a codec-produced blob. The codec itself is out
    /// of scope here; callers hand over the already-compressed record data
    /// together with the record count it encodes.
    pub fn compressed(
        base_offset: i64,
        first_timestamp: i64,
        max_timestamp: i64,
        codec: Compression,
        record_count: i32,
        records: Bytes,
    ) -> AppResult<RecordBatch> {
        if codec.is_none() {
            return Err(AppError::InvalidValue(
                "compressed batch requires a non-none codec".to_string(),
            ));
        }
        let records = BatchRecords::Compressed {
            record_count,
            records,
        };
        let header = BatchHeader {
            base_offset,
            length: 0,
            partition_leader_epoch: NO_PARTITION_LEADER_EPOCH,
            magic: MAGIC,
            crc: 0,
            attributes: codec.attribute_bits(),
            last_offset_delta: record_count - 1,
            first_timestamp,
            max_timestamp,
            producer_id: NO_PRODUCER_ID,
            producer_epoch: NO_PRODUCER_EPOCH,
            first_sequence: NO_SEQUENCE,
            records_count: record_count,
        };
        Ok(Self::finalize(header, records))
    }

    /// Fills in the three header fields that are functions of the payload
    /// (length, records_count, crc), so a built batch compares equal to its
    /// own decoded round trip.
    fn finalize(mut header: BatchHeader, records: BatchRecords) -> RecordBatch {
        header.records_count = records.record_count();
        header.length = (RECORD_BATCH_OVERHEAD - LOG_OVERHEAD + records.encoded_len()) as i32;
        let mut batch = RecordBatch { header, records };
        let encoded = batch.encode();
        batch.header.crc =
            u32::from_be_bytes(encoded[CRC_OFFSET..ATTRIBUTES_OFFSET].try_into().unwrap());
        batch
    }

    /// Serializes the batch into the exact wire layout the decoder expects.
    /// Length and crc are recomputed from the payload actually present, so
    /// the bytes written are always self-consistent.
    pub fn encode(&self) -> BytesMut {
        let mut buf =
            BytesMut::with_capacity(RECORD_BATCH_OVERHEAD + self.records.encoded_len());
        self.header.encode(&mut buf);
        self.records.encode(&mut buf);

        let length = (buf.len() - LOG_OVERHEAD) as i32;
        buf[LENGTH_OFFSET..PARTITION_LEADER_EPOCH_OFFSET].copy_from_slice(&length.to_be_bytes());
        let crc = crc32c::crc32c(&buf[ATTRIBUTES_OFFSET..]);
        buf[CRC_OFFSET..ATTRIBUTES_OFFSET].copy_from_slice(&crc.to_be_bytes());
        buf
    }

    /// Checks that the header agrees with the payload shape, the contract a
    /// batch must satisfy before it may be appended to a segment.
    pub fn validate(&self) -> AppResult<()> {
        if self.header.magic != MAGIC {
            return Err(AppError::IllegalStateError(format!(
                "unsupported magic {}, only {} is supported",
                self.header.magic, MAGIC
            )));
        }
        if self.header.records_count != self.records.record_count() {
            return Err(AppError::IllegalStateError(format!(
                "header declares {} records but payload holds {}",
                self.header.records_count,
                self.records.record_count()
            )));
        }
        let codec = self.header.compression()?;
        if codec.is_none() == self.records.is_compressed() {
            return Err(AppError::IllegalStateError(format!(
                "compression attribute {:?} does not match payload shape",
                codec
            )));
        }
        Ok(())
    }

    pub fn base_offset(&self) -> i64 {
        self.header.base_offset
    }

    pub fn last_offset(&self) -> i64 {
        self.header.last_offset()
    }

    pub fn records_count(&self) -> i32 {
        self.header.records_count
    }

    pub fn max_timestamp(&self) -> i64 {
        self.header.max_timestamp
    }

    pub fn compressed_payload(&self) -> bool {
        self.records.is_compressed()
    }
}

/// A builder for creating new uncompressed batches. Offsets and timestamps
/// may be supplied per record or left to the builder, which then assigns
/// sequential offsets and the current wall clock.
#[derive(Debug, Default)]
pub struct RecordBatchBuilder {
    records: Vec<Record>,
    base_offset: Option<i64>,
    base_timestamp: Option<i64>,
    last_offset: i64,
    max_timestamp: i64,
}

impl RecordBatchBuilder {
    pub fn append_record_with_offset(
        &mut self,
        offset: i64,
        timestamp: i64,
        key: impl Into<Bytes>,
        value_and_headers: impl Into<Bytes>,
    ) {
        self.append_record(Some(offset), Some(timestamp), key, value_and_headers);
    }

    pub fn append_record(
        &mut self,
        offset: Option<i64>,
        timestamp: Option<i64>,
        key: impl Into<Bytes>,
        value_and_headers: impl Into<Bytes>,
    ) {
        let offset = offset.unwrap_or_else(|| self.next_sequence_offset());
        let base_offset = *self.base_offset.get_or_insert(offset);
        self.last_offset = offset;

        let timestamp = timestamp.unwrap_or_else(Self::current_millis);
        let base_timestamp = *self.base_timestamp.get_or_insert(timestamp);
        self.max_timestamp = self.max_timestamp.max(timestamp);

        self.records.push(Record::new(
            timestamp - base_timestamp,
            (offset - base_offset) as i32,
            key.into(),
            value_and_headers.into(),
        ));
    }

    pub fn build(self) -> RecordBatch {
        let header = BatchHeader {
            base_offset: self.base_offset.unwrap_or(0),
            length: 0,
            partition_leader_epoch: NO_PARTITION_LEADER_EPOCH,
            magic: MAGIC,
            crc: 0,
            attributes: Compression::None.attribute_bits(),
            last_offset_delta: (self.last_offset - self.base_offset.unwrap_or(0)) as i32,
            first_timestamp: self.base_timestamp.unwrap_or(-1),
            max_timestamp: self.max_timestamp,
            producer_id: NO_PRODUCER_ID,
            producer_epoch: NO_PRODUCER_EPOCH,
            first_sequence: NO_SEQUENCE,
            records_count: 0,
        };
        RecordBatch::finalize(header, BatchRecords::Uncompressed(self.records))
    }

    fn current_millis() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("Time went backwards")
            .as_millis() as i64
    }

    fn next_sequence_offset(&self) -> i64 {
        match self.base_offset {
            Some(_) => self.last_offset + 1,
            None => 0,
        }
    }
}
