//! Stream header.
//!
//! Layout (12 bytes):
//!
//! | Byte  | Content                                                       |
//! |-------|---------------------------------------------------------------|
//! | 0-1   | magic `0x70 0x20`                                             |
//! | 2     | `000` + resolution - 1 (5 bits)                               |
//! | 3     | `0` + block size selector (2 bits) + `1` + interval bits 11-8 |
//! | 4     | interval bits 7-0                                             |
//! | 5     | reserved, zero                                                |
//! | 6-11  | sample count, 48-bit big-endian                               |
//!
//! The 12-bit interval field holds the reference interval minus one, so the
//! default of 4096 blocks is written as all ones.

use crate::error::{CodecError, CodecResult};
use crate::params::{BlockSize, CodecParams};

/// Encoded header size in bytes.
pub const HEADER_LEN: usize = 12;

/// Leading magic bytes.
pub const MAGIC: [u8; 2] = [0x70, 0x20];

/// Largest sample count the header can carry.
pub const MAX_SAMPLE_COUNT: u64 = (1 << 48) - 1;

const FIXED_BIT: u8 = 0x10;

/// Parsed stream header.
///
/// Only built through [`Header::new`] or [`Header::from_bytes`], so the
/// sample count always fits the 48-bit field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    params: CodecParams,
    sample_count: u64,
}

impl Header {
    /// Create a header, checking that `sample_count` fits in 48 bits.
    pub fn new(params: CodecParams, sample_count: u64) -> CodecResult<Self> {
        if sample_count > MAX_SAMPLE_COUNT {
            return Err(CodecError::SampleCountOverflow(sample_count));
        }
        Ok(Self {
            params,
            sample_count,
        })
    }

    #[inline]
    pub fn params(&self) -> &CodecParams {
        &self.params
    }

    /// Number of samples in the stream, excluding block padding.
    #[inline]
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Serialize to the 12-byte wire form.
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let interval = self.params.reference_interval() - 1;
        let count = self.sample_count.to_be_bytes();

        let mut bytes = [0u8; HEADER_LEN];
        bytes[..2].copy_from_slice(&MAGIC);
        bytes[2] = (self.params.resolution() - 1) as u8;
        bytes[3] = (self.params.block_size_kind().selector() << 5)
            | FIXED_BIT
            | ((interval >> 8) & 0x0F) as u8;
        bytes[4] = (interval & 0xFF) as u8;
        bytes[6..].copy_from_slice(&count[2..]);
        bytes
    }

    /// Parse the first [`HEADER_LEN`] bytes of `data`.
    pub fn from_bytes(data: &[u8]) -> CodecResult<Self> {
        if data.len() < HEADER_LEN {
            return Err(CodecError::InvalidHeader(format!(
                "need {HEADER_LEN} bytes, got {}",
                data.len()
            )));
        }
        if data[..2] != MAGIC {
            return Err(CodecError::InvalidHeader(format!(
                "bad magic {:02x} {:02x}",
                data[0], data[1]
            )));
        }
        if data[2] & 0xE0 != 0 {
            return Err(CodecError::InvalidHeader(format!(
                "reserved bits set in resolution byte {:#04x}",
                data[2]
            )));
        }
        if data[3] & 0x80 != 0 || data[3] & FIXED_BIT == 0 {
            return Err(CodecError::InvalidHeader(format!(
                "reserved bits mismatch in block size byte {:#04x}",
                data[3]
            )));
        }
        if data[5] != 0 {
            return Err(CodecError::InvalidHeader(format!(
                "reserved byte is {:#04x}",
                data[5]
            )));
        }

        let resolution = u32::from(data[2]) + 1;
        let block_size = BlockSize::from_selector(data[3] >> 5);
        let interval = (u32::from(data[3] & 0x0F) << 8 | u32::from(data[4])) + 1;

        let mut count = [0u8; 8];
        count[2..].copy_from_slice(&data[6..HEADER_LEN]);

        let params = CodecParams::new(resolution, block_size.samples())?
            .with_reference_interval(interval)?;

        Ok(Self {
            params,
            sample_count: u64::from_be_bytes(count),
        })
    }
}
