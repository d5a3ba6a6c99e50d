use bytes::Bytes;

use crate::message::{BatchHeader, BatchRecords, Record, RecordBatch};

/// Verdict a consumer returns to steer the decoder away from work it does
/// not want: a whole batch at `consume_batch_start`, or one record's value
/// region at `consume_record_key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    Yes,
    No,
}

/// Whether the current `consume()` call should hand control back to the
/// caller once the present batch has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopIteration {
    Yes,
    No,
}

/// The capability a caller implements to receive decode events. The decoder
/// drives the operations in strict per-batch order:
///
/// 1. `consume_batch_start` with the decoded header. `Skip::Yes` makes the
///    decoder seek past the batch's remaining bytes without parsing any
///    record; `consume_batch_end` still fires afterwards.
/// 2. For an uncompressed batch, `consume_record_key` per record, in on-disk
///    order. `Skip::Yes` suppresses the value callback for that record only;
///    the decoder still advances past the unread value region.
/// 3. `consume_record_value` for each record whose key was accepted, paired
///    one-to-one with the most recent accepted key.
/// 4. For a compressed batch, a single `consume_compressed_records` instead
///    of the per-record calls, paired with the record count handed to
///    `consume_batch_start`.
/// 5. `consume_batch_end`, whose verdict can stop the decode call at this
///    batch boundary; a later `consume()` resumes at the next batch.
///
/// Payload buffers are moved in, never lent: the decoder retains nothing
/// after delivery.
pub trait BatchConsumer {
    fn consume_batch_start(&mut self, header: BatchHeader, record_count: usize) -> Skip;

    fn consume_record_key(
        &mut self,
        size_bytes: usize,
        timestamp_delta: i64,
        offset_delta: i32,
        key: Bytes,
    ) -> Skip;

    fn consume_record_value(&mut self, value_and_headers: Bytes);

    fn consume_compressed_records(&mut self, records: Bytes);

    fn consume_batch_end(&mut self) -> StopIteration;
}

#[derive(Debug)]
struct PendingRecord {
    timestamp_delta: i64,
    offset_delta: i32,
    key: Bytes,
}

/// Non-skipping consumer that rebuilds every delivered batch into the
/// in-memory model. The accumulator is reset whenever an uncompressed batch
/// starts, so no compressed payload state can leak across batches, and is
/// committed only when the batch's terminal event fires.
#[derive(Debug)]
pub struct BatchCollector {
    batches: Vec<RecordBatch>,
    stop_after_each_batch: bool,
    header: Option<BatchHeader>,
    record_count: usize,
    records: BatchRecords,
    pending: Option<PendingRecord>,
}

impl BatchCollector {
    pub fn new() -> Self {
        BatchCollector {
            batches: Vec::new(),
            stop_after_each_batch: false,
            header: None,
            record_count: 0,
            records: BatchRecords::Uncompressed(Vec::new()),
            pending: None,
        }
    }

    /// Collector that stops the decode call after every batch, for
    /// one-batch-at-a-time consumption.
    pub fn stopping_per_batch() -> Self {
        BatchCollector {
            stop_after_each_batch: true,
            ..Self::new()
        }
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn into_batches(self) -> Vec<RecordBatch> {
        self.batches
    }
}

impl Default for BatchCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchConsumer for BatchCollector {
    fn consume_batch_start(&mut self, header: BatchHeader, record_count: usize) -> Skip {
        if header.compression().map(|c| c.is_none()).unwrap_or(false) {
            // Reset the variant.
            self.records = BatchRecords::Uncompressed(Vec::with_capacity(record_count));
        }
        self.header = Some(header);
        self.record_count = record_count;
        Skip::No
    }

    fn consume_record_key(
        &mut self,
        _size_bytes: usize,
        timestamp_delta: i64,
        offset_delta: i32,
        key: Bytes,
    ) -> Skip {
        self.pending = Some(PendingRecord {
            timestamp_delta,
            offset_delta,
            key,
        });
        Skip::No
    }

    fn consume_record_value(&mut self, value_and_headers: Bytes) {
        if let (Some(pending), BatchRecords::Uncompressed(records)) =
            (self.pending.take(), &mut self.records)
        {
            records.push(Record::new(
                pending.timestamp_delta,
                pending.offset_delta,
                pending.key,
                value_and_headers,
            ));
        }
    }

    fn consume_compressed_records(&mut self, records: Bytes) {
        self.records = BatchRecords::Compressed {
            record_count: self.record_count as i32,
            records,
        };
    }

    fn consume_batch_end(&mut self) -> StopIteration {
        if let Some(header) = self.header.take() {
            let records = std::mem::replace(&mut self.records, BatchRecords::Uncompressed(Vec::new()));
            self.batches.push(RecordBatch::new(header, records));
        }
        if self.stop_after_each_batch {
            StopIteration::Yes
        } else {
            StopIteration::No
        }
    }
}
