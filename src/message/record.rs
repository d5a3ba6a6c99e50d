use bytes::{BufMut, Bytes, BytesMut};
use integer_encoding::VarInt;

/// One logical entry of an uncompressed batch. Timestamp and offset are
/// stored as deltas against the batch header's first timestamp and base
/// offset. An empty `key` is written as absent (-1 length) on the wire;
/// value and record headers travel as one opaque region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Encoded size of the record body, excluding the leading length varint.
    pub size_bytes: i32,
    pub timestamp_delta: i64,
    pub offset_delta: i32,
    pub key: Bytes,
    pub value_and_headers: Bytes,
}

impl Record {
    pub fn new(
        timestamp_delta: i64,
        offset_delta: i32,
        key: Bytes,
        value_and_headers: Bytes,
    ) -> Record {
        let size_bytes = Self::body_size(timestamp_delta, offset_delta, &key, &value_and_headers);
        Record {
            size_bytes: size_bytes as i32,
            timestamp_delta,
            offset_delta,
            key,
            value_and_headers,
        }
    }

    /// Record body layout: attributes byte, timestamp delta varint, offset
    /// delta varint, length-prefixed key, length-prefixed value+headers.
    fn body_size(timestamp_delta: i64, offset_delta: i32, key: &[u8], value: &[u8]) -> usize {
        1 + timestamp_delta.required_space()
            + offset_delta.required_space()
            + Self::payload_size(key)
            + Self::payload_size(value)
    }

    fn payload_size(data: &[u8]) -> usize {
        if data.is_empty() {
            (-1i32).required_space()
        } else {
            (data.len() as i32).required_space() + data.len()
        }
    }

    /// On-disk size including the leading length varint.
    pub fn encoded_len(&self) -> usize {
        self.size_bytes.required_space() + self.size_bytes as usize
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_slice(self.size_bytes.encode_var_vec().as_ref());
        buf.put_i8(0); // attributes
        buf.put_slice(self.timestamp_delta.encode_var_vec().as_ref());
        buf.put_slice(self.offset_delta.encode_var_vec().as_ref());
        Self::append_data(buf, &self.key);
        Self::append_data(buf, &self.value_and_headers);
    }

    fn append_data(buf: &mut BytesMut, data: &[u8]) {
        if data.is_empty() {
            buf.put_slice((-1i32).encode_var_vec().as_ref());
        } else {
            buf.put_slice((data.len() as i32).encode_var_vec().as_ref());
            buf.put_slice(data);
        }
    }
}
