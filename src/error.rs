//! Error types for CCSDS 121.0 encoding/decoding.

use std::io;
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Sample resolution outside 1-32 bits
    #[error("invalid sample resolution: {0} (must be 1-32)")]
    InvalidResolution(u32),

    /// Block size other than 8, 16, 32 or 64 samples
    #[error("invalid block size: {0} (must be 8, 16, 32 or 64)")]
    InvalidBlockSize(usize),

    /// Block slice length differs from the configured block size
    #[error("block holds {actual} samples, expected {expected}")]
    InvalidBlockLength { expected: usize, actual: usize },

    /// Reference interval outside 1-4096 blocks
    #[error("invalid reference interval: {0} (must be 1-4096 blocks)")]
    InvalidReferenceInterval(u32),

    /// Header magic or reserved bits do not match
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Sample count does not fit the 48-bit header field
    #[error("sample count {0} does not fit in 48 bits")]
    SampleCountOverflow(u64),

    /// Option identifier not defined for this resolution (or rejected by configuration)
    #[error("unsupported coding option (identifier {prefix:#b})")]
    UnsupportedOption { prefix: u32 },

    /// Caller-provided output buffer is too small
    #[error("output buffer too small: need {required} bytes, got {available}")]
    BufferTooSmall { required: usize, available: usize },

    /// Input sample exceeds the configured dynamic range
    #[error("sample {value} exceeds {resolution}-bit range")]
    SampleOutOfRange { value: u32, resolution: u32 },

    /// Not enough bits remaining in the input
    #[error("unexpected end of stream")]
    UnexpectedEndOfStream,

    /// Decoded data is inconsistent with the header
    #[error("corrupt stream: {0}")]
    CorruptStream(String),

    /// Underlying reader or writer failed
    #[error(transparent)]
    Io(#[from] io::Error),
}
