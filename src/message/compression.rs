use crate::message::constants::COMPRESSION_CODEC_MASK;
use crate::{AppError, AppResult};

/// Compression codec of a batch payload, carried in the low bits of the
/// header attributes. The codecs themselves live outside this crate; here
/// the only decision that matters is `None` versus everything else, which
/// selects between the per-record payload and the opaque blob payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Snappy,
    Lz4,
    Zstd,
}

impl Compression {
    pub fn from_attributes(attributes: i16) -> AppResult<Compression> {
        match attributes & COMPRESSION_CODEC_MASK {
            0 => Ok(Compression::None),
            1 => Ok(Compression::Gzip),
            2 => Ok(Compression::Snappy),
            3 => Ok(Compression::Lz4),
            4 => Ok(Compression::Zstd),
            other => Err(AppError::InvalidValue(format!(
                "unknown compression codec bits: {}",
                other
            ))),
        }
    }

    pub fn attribute_bits(&self) -> i16 {
        match self {
            Compression::None => 0,
            Compression::Gzip => 1,
            Compression::Snappy => 2,
            Compression::Lz4 => 3,
            Compression::Zstd => 4,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Compression::None)
    }
}
