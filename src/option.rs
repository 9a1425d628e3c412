//! Coding options and their identifiers.
//!
//! Every coded block starts with a `prefix_size`-bit option identifier:
//!
//! | Identifier          | Option                                  |
//! |---------------------|-----------------------------------------|
//! | `0...0` `0`         | Zero-Block (run of all-zero blocks)     |
//! | `0...0` `1`         | Second-Extension                        |
//! | `1`                 | Fundamental-Sequence (split-sample k=0) |
//! | `k+1`               | Split-Sample(k)                         |
//! | `1...1`             | No-Compression                          |

use std::fmt;

use crate::bitbuffer::BitBuffer;
use crate::bitreader::BitReader;
use crate::error::{CodecError, CodecResult};
use crate::params::CodecParams;

/// Representation selected for one block (or run of blocks).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodingOption {
    ZeroBlock,
    SecondExtension,
    FundamentalSequence,
    SplitSample(u32),
    NoCompression,
}

impl CodingOption {
    /// Split-sample option for parameter `k` (`k = 0` is the fundamental sequence).
    pub fn split(k: u32) -> Self {
        if k == 0 {
            Self::FundamentalSequence
        } else {
            Self::SplitSample(k)
        }
    }

    /// Split parameter of a fundamental-sequence / split-sample option.
    pub fn split_k(self) -> Option<u32> {
        match self {
            Self::FundamentalSequence => Some(0),
            Self::SplitSample(k) => Some(k),
            _ => None,
        }
    }

    /// Number of identifier bits this option occupies.
    pub fn id_len(self, params: &CodecParams) -> u32 {
        match self {
            Self::ZeroBlock | Self::SecondExtension => params.prefix_size() + 1,
            _ => params.prefix_size(),
        }
    }

    /// Append the option identifier.
    pub fn write_id(self, output: &mut BitBuffer, params: &CodecParams) {
        let prefix_size = params.prefix_size();
        match self {
            Self::ZeroBlock => output.append_zeros(u64::from(prefix_size) + 1),
            Self::SecondExtension => {
                output.append_zeros(u64::from(prefix_size));
                output.append_bit(true);
            }
            Self::FundamentalSequence => output.append_value(1, prefix_size),
            Self::SplitSample(k) => output.append_value(u64::from(k) + 1, prefix_size),
            Self::NoCompression => {
                output.append_value(u64::from(params.no_compression_prefix()), prefix_size);
            }
        }
    }

    /// Read and resolve an option identifier.
    ///
    /// Fails with [`CodecError::UnsupportedOption`] for split-sample
    /// identifiers beyond what `params` defines.
    pub fn read_id(reader: &mut BitReader, params: &CodecParams) -> CodecResult<Self> {
        let prefix = reader.read_bits(params.prefix_size())?;

        if prefix == 0 {
            return Ok(if reader.read_bit()? {
                Self::SecondExtension
            } else {
                Self::ZeroBlock
            });
        }
        if prefix == params.no_compression_prefix() {
            return Ok(Self::NoCompression);
        }

        let k = prefix - 1;
        match params.split_sample_limit() {
            Some(limit) if k <= limit => Ok(Self::split(k)),
            _ => Err(CodecError::UnsupportedOption { prefix }),
        }
    }
}

impl fmt::Display for CodingOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroBlock => write!(f, "zero-block"),
            Self::SecondExtension => write!(f, "second-extension"),
            Self::FundamentalSequence => write!(f, "fundamental-sequence"),
            Self::SplitSample(k) => write!(f, "split-sample(k={k})"),
            Self::NoCompression => write!(f, "no-compression"),
        }
    }
}
