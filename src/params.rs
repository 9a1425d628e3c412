//! Codec parameters and the constants derived from them.
//!
//! Everything the block coder needs to know about a stream is a function of
//! three values: the sample resolution, the block size and the reference
//! sample interval. This module validates them once and derives:
//!
//! | Resolution | Option id bits | Max k |
//! |------------|----------------|-------|
//! | 1-2        | 1              | 0     |
//! | 3-4        | 2              | 1     |
//! | 5-8        | 3              | 5     |
//! | 9-16       | 4              | min(n, 13) |
//! | 17-32      | 5              | min(n, 29) |

use crate::error::{CodecError, CodecResult};

/// Largest supported sample resolution in bits.
pub const MAX_RESOLUTION: u32 = 32;

/// Default reference sample interval, in blocks.
pub const DEFAULT_REFERENCE_INTERVAL: u32 = 4096;

/// Largest reference interval the 12-bit header field can carry.
pub const MAX_REFERENCE_INTERVAL: u32 = 4096;

/// Reject a sample resolution outside `1..=MAX_RESOLUTION`.
pub(crate) fn check_resolution(resolution: u32) -> CodecResult<()> {
    if resolution == 0 || resolution > MAX_RESOLUTION {
        return Err(CodecError::InvalidResolution(resolution));
    }
    Ok(())
}

/// Number of samples per block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockSize {
    B8,
    B16,
    B32,
    B64,
}

impl BlockSize {
    /// Look up the block size for a sample count.
    pub fn from_samples(samples: usize) -> CodecResult<Self> {
        match samples {
            8 => Ok(Self::B8),
            16 => Ok(Self::B16),
            32 => Ok(Self::B32),
            64 => Ok(Self::B64),
            other => Err(CodecError::InvalidBlockSize(other)),
        }
    }

    /// Samples per block.
    #[inline]
    pub fn samples(self) -> usize {
        match self {
            Self::B8 => 8,
            Self::B16 => 16,
            Self::B32 => 32,
            Self::B64 => 64,
        }
    }

    /// Two-bit selector stored in the header.
    pub fn selector(self) -> u8 {
        match self {
            Self::B8 => 0,
            Self::B16 => 1,
            Self::B32 => 2,
            Self::B64 => 3,
        }
    }

    /// Inverse of [`BlockSize::selector`]; only the low two bits are used.
    pub fn from_selector(selector: u8) -> Self {
        match selector & 0b11 {
            0 => Self::B8,
            1 => Self::B16,
            2 => Self::B32,
            _ => Self::B64,
        }
    }
}

/// Validated stream parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CodecParams {
    resolution: u32,
    block_size: BlockSize,
    reference_interval: u32,
}

impl CodecParams {
    /// Create parameters for `resolution`-bit samples in blocks of `block_size`.
    ///
    /// The reference interval defaults to [`DEFAULT_REFERENCE_INTERVAL`].
    pub fn new(resolution: u32, block_size: usize) -> CodecResult<Self> {
        check_resolution(resolution)?;
        let block_size = BlockSize::from_samples(block_size)?;

        Ok(Self {
            resolution,
            block_size,
            reference_interval: DEFAULT_REFERENCE_INTERVAL,
        })
    }

    /// Override the reference sample interval (in blocks).
    pub fn with_reference_interval(mut self, blocks: u32) -> CodecResult<Self> {
        if blocks == 0 || blocks > MAX_REFERENCE_INTERVAL {
            return Err(CodecError::InvalidReferenceInterval(blocks));
        }
        self.reference_interval = blocks;
        Ok(self)
    }

    /// Sample resolution in bits.
    #[inline]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Samples per block.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size.samples()
    }

    #[inline]
    pub fn block_size_kind(&self) -> BlockSize {
        self.block_size
    }

    /// Reference sample interval in blocks.
    #[inline]
    pub fn reference_interval(&self) -> u32 {
        self.reference_interval
    }

    /// Largest representable sample, `2^resolution - 1`.
    #[inline]
    pub fn max_value(&self) -> u32 {
        max_value(self.resolution)
    }

    /// Width of the option identifier in bits.
    pub fn prefix_size(&self) -> u32 {
        match self.resolution {
            0..=2 => 1,
            3..=4 => 2,
            5..=8 => 3,
            9..=16 => 4,
            _ => 5,
        }
    }

    /// Largest split-sample parameter for this resolution.
    pub fn max_k(&self) -> u32 {
        match self.resolution {
            0..=2 => 0,
            3..=4 => 1,
            5..=8 => 5,
            9..=16 => self.resolution.min(13),
            _ => self.resolution.min(29),
        }
    }

    /// Largest `k` that has its own option identifier, if any.
    ///
    /// Identifiers `1..=2^prefix_size - 2` carry split-sample options, so
    /// with a one-bit identifier there is no room for any.
    pub fn split_sample_limit(&self) -> Option<u32> {
        let ids = (1u32 << self.prefix_size()) - 2;
        if ids == 0 {
            None
        } else {
            Some(self.max_k().min(ids - 1))
        }
    }

    /// Identifier of the no-compression option (all ones).
    #[inline]
    pub fn no_compression_prefix(&self) -> u32 {
        (1u32 << self.prefix_size()) - 1
    }

    /// Whether block `block_index` starts with a raw reference sample.
    #[inline]
    pub fn is_reference_block(&self, block_index: u64) -> bool {
        block_index % u64::from(self.reference_interval) == 0
    }
}

/// `2^resolution - 1` without overflowing at 32 bits.
#[allow(clippy::cast_possible_truncation)]
#[inline]
pub(crate) fn max_value(resolution: u32) -> u32 {
    ((1u64 << resolution) - 1) as u32
}
