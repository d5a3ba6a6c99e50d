//! Random batch generation for round-trip tests.

use bytes::Bytes;
use rand::Rng;

use crate::message::{Compression, RecordBatch, RecordBatchBuilder};

fn random_bytes(rng: &mut impl Rng, max_len: usize) -> Bytes {
    let len = rng.gen_range(1..=max_len);
    let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
    Bytes::from(data)
}

/// Builds one batch starting at `base_offset`, compressed or not, with a
/// random record count. The next batch in a well-formed stream starts at
/// `batch.last_offset() + 1`.
pub(crate) fn make_random_batch(
    rng: &mut impl Rng,
    base_offset: i64,
    compressed: bool,
) -> RecordBatch {
    let record_count = rng.gen_range(1..=20);
    let base_timestamp = rng.gen_range(0..1_600_000_000_000i64);

    if compressed {
        let codec = match rng.gen_range(1..=4) {
            1 => Compression::Gzip,
            2 => Compression::Snappy,
            3 => Compression::Lz4,
            _ => Compression::Zstd,
        };
        RecordBatch::compressed(
            base_offset,
            base_timestamp,
            base_timestamp + record_count as i64,
            codec,
            record_count,
            random_bytes(rng, 512),
        )
        .unwrap()
    } else {
        let mut builder = RecordBatchBuilder::default();
        for i in 0..record_count as i64 {
            let key = if rng.gen_bool(0.2) {
                Bytes::new()
            } else {
                random_bytes(rng, 64)
            };
            builder.append_record_with_offset(
                base_offset + i,
                base_timestamp + i,
                key,
                random_bytes(rng, 256),
            );
        }
        builder.build()
    }
}

/// A contiguous run of `count` batches with a mixed compression profile,
/// offsets strictly advancing across batch boundaries.
pub(crate) fn make_random_batches(base_offset: i64, count: usize) -> Vec<RecordBatch> {
    let mut rng = rand::thread_rng();
    let mut batches = Vec::with_capacity(count);
    let mut next_offset = base_offset;
    for _ in 0..count {
        let compressed = rng.gen_bool(0.4);
        let batch = make_random_batch(&mut rng, next_offset, compressed);
        next_offset = batch.last_offset() + 1;
        batches.push(batch);
    }
    batches
}
