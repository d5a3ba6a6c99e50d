//! Record Batch Format Constants
//!
//! Field offsets and lengths of the on-disk batch header, plus the special
//! values used throughout the format.
//!
//! # Batch Format
//!
//! The record batch format includes:
//! - Base offset (8 bytes)
//! - Length (4 bytes)
//! - Partition leader epoch (4 bytes)
//! - Magic byte (1 byte)
//! - CRC (4 bytes)
//! - Attributes (2 bytes)
//! - Last offset delta (4 bytes)
//! - First timestamp (8 bytes)
//! - Max timestamp (8 bytes)
//! - Producer ID (8 bytes)
//! - Producer epoch (2 bytes)
//! - Base sequence (4 bytes)
//! - Record count (4 bytes)
//! - Records, or one opaque compressed blob (variable length)
//!
//! `length` counts every byte after the length field itself, so the total
//! on-disk size of a batch is `length + LOG_OVERHEAD`.

// Record batch field offsets and lengths
pub const BASE_OFFSET_OFFSET: usize = 0;
pub const BASE_OFFSET_LENGTH: usize = 8;
pub const LENGTH_OFFSET: usize = BASE_OFFSET_OFFSET + BASE_OFFSET_LENGTH;
pub const LENGTH_LENGTH: usize = 4;
pub const PARTITION_LEADER_EPOCH_OFFSET: usize = LENGTH_OFFSET + LENGTH_LENGTH;
pub const PARTITION_LEADER_EPOCH_LENGTH: usize = 4;
pub const MAGIC_OFFSET: usize = PARTITION_LEADER_EPOCH_OFFSET + PARTITION_LEADER_EPOCH_LENGTH;
pub const MAGIC_LENGTH: usize = 1;
pub const CRC_OFFSET: usize = MAGIC_OFFSET + MAGIC_LENGTH;
pub const CRC_LENGTH: usize = 4;
pub const ATTRIBUTES_OFFSET: usize = CRC_OFFSET + CRC_LENGTH;
pub const ATTRIBUTE_LENGTH: usize = 2;
pub const LAST_OFFSET_DELTA_OFFSET: usize = ATTRIBUTES_OFFSET + ATTRIBUTE_LENGTH;
pub const LAST_OFFSET_DELTA_LENGTH: usize = 4;
pub const FIRST_TIMESTAMP_OFFSET: usize = LAST_OFFSET_DELTA_OFFSET + LAST_OFFSET_DELTA_LENGTH;
pub const FIRST_TIMESTAMP_LENGTH: usize = 8;
pub const MAX_TIMESTAMP_OFFSET: usize = FIRST_TIMESTAMP_OFFSET + FIRST_TIMESTAMP_LENGTH;
pub const MAX_TIMESTAMP_LENGTH: usize = 8;
pub const PRODUCER_ID_OFFSET: usize = MAX_TIMESTAMP_OFFSET + MAX_TIMESTAMP_LENGTH;
pub const PRODUCER_ID_LENGTH: usize = 8;
pub const PRODUCER_EPOCH_OFFSET: usize = PRODUCER_ID_OFFSET + PRODUCER_ID_LENGTH;
pub const PRODUCER_EPOCH_LENGTH: usize = 2;
pub const BASE_SEQUENCE_OFFSET: usize = PRODUCER_EPOCH_OFFSET + PRODUCER_EPOCH_LENGTH;
pub const BASE_SEQUENCE_LENGTH: usize = 4;
pub const RECORDS_COUNT_OFFSET: usize = BASE_SEQUENCE_OFFSET + BASE_SEQUENCE_LENGTH;
pub const RECORDS_COUNT_LENGTH: usize = 4;
pub const RECORDS_OFFSET: usize = RECORDS_COUNT_OFFSET + RECORDS_COUNT_LENGTH;
pub const RECORD_BATCH_OVERHEAD: usize = RECORDS_OFFSET;

/// Bytes of the base offset and length fields, which the `length` field
/// itself does not count.
pub const LOG_OVERHEAD: usize = BASE_OFFSET_LENGTH + LENGTH_LENGTH;

// Special values and defaults

/// Magic value for the current batch format version
pub const MAGIC: i8 = 2;
/// Low three bits of the attributes field select the compression codec
pub const COMPRESSION_CODEC_MASK: i16 = 0x07;
/// Special value indicating no producer ID
pub const NO_PRODUCER_ID: i64 = -1;
/// Special value indicating no producer epoch
pub const NO_PRODUCER_EPOCH: i16 = -1;
/// Special value indicating no sequence number
pub const NO_SEQUENCE: i32 = -1;
/// Special value indicating no partition leader epoch
pub const NO_PARTITION_LEADER_EPOCH: i32 = -1;

/// Upper bound on a batch's declared on-disk size. A header announcing more
/// than this is treated as damage rather than a genuine batch.
pub const MAX_BATCH_SIZE: usize = 100 * 1024 * 1024;
