use std::fmt::{Display, Formatter};

use bytes::{Buf, BufMut};
use chrono::{Local, TimeZone};

use crate::message::constants::{LOG_OVERHEAD, RECORD_BATCH_OVERHEAD};
use crate::message::Compression;
use crate::AppResult;

/// Fixed-size metadata at the front of every batch. The header alone is
/// enough to locate the end of the batch (`batch_size`) and to validate it
/// independently of its payload (`crc`, `records_count`).
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct BatchHeader {
    pub base_offset: i64,
    pub length: i32,
    pub partition_leader_epoch: i32,
    pub magic: i8,
    pub crc: u32,
    pub attributes: i16,
    pub last_offset_delta: i32,
    pub first_timestamp: i64,
    pub max_timestamp: i64,
    pub producer_id: i64,
    pub producer_epoch: i16,
    pub first_sequence: i32,
    pub records_count: i32,
}

impl BatchHeader {
    /// Reads a header from a buffer holding at least `RECORD_BATCH_OVERHEAD`
    /// bytes.
    pub fn decode(buf: &mut impl Buf) -> BatchHeader {
        BatchHeader {
            base_offset: buf.get_i64(),
            length: buf.get_i32(),
            partition_leader_epoch: buf.get_i32(),
            magic: buf.get_i8(),
            crc: buf.get_u32(),
            attributes: buf.get_i16(),
            last_offset_delta: buf.get_i32(),
            first_timestamp: buf.get_i64(),
            max_timestamp: buf.get_i64(),
            producer_id: buf.get_i64(),
            producer_epoch: buf.get_i16(),
            first_sequence: buf.get_i32(),
            records_count: buf.get_i32(),
        }
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_i64(self.base_offset);
        buf.put_i32(self.length);
        buf.put_i32(self.partition_leader_epoch);
        buf.put_i8(self.magic);
        buf.put_u32(self.crc);
        buf.put_i16(self.attributes);
        buf.put_i32(self.last_offset_delta);
        buf.put_i64(self.first_timestamp);
        buf.put_i64(self.max_timestamp);
        buf.put_i64(self.producer_id);
        buf.put_i16(self.producer_epoch);
        buf.put_i32(self.first_sequence);
        buf.put_i32(self.records_count);
    }

    pub fn compression(&self) -> AppResult<Compression> {
        Compression::from_attributes(self.attributes)
    }

    /// Total on-disk size of the batch, header included.
    pub fn batch_size(&self) -> usize {
        self.length as usize + LOG_OVERHEAD
    }

    /// Bytes following the header: the record sequence or the compressed
    /// blob.
    pub fn payload_size(&self) -> usize {
        self.batch_size() - RECORD_BATCH_OVERHEAD
    }

    pub fn last_offset(&self) -> i64 {
        self.base_offset + self.last_offset_delta as i64
    }
}

impl Display for BatchHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let chrono_first_timestamp = Local.timestamp_millis_opt(self.first_timestamp).unwrap();
        let chrono_max_timestamp = Local.timestamp_millis_opt(self.max_timestamp).unwrap();
        f.debug_struct("BatchHeader")
            .field("base_offset", &self.base_offset)
            .field("length", &self.length)
            .field("partition_leader_epoch", &self.partition_leader_epoch)
            .field("magic", &self.magic)
            .field("crc", &self.crc)
            .field("attributes", &self.attributes)
            .field("last_offset_delta", &self.last_offset_delta)
            .field("first_timestamp", &chrono_first_timestamp)
            .field("max_timestamp", &chrono_max_timestamp)
            .field("producer_id", &self.producer_id)
            .field("producer_epoch", &self.producer_epoch)
            .field("first_sequence", &self.first_sequence)
            .field("records_count", &self.records_count)
            .finish()
    }
}
