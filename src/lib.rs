//! # CCSDS 121.0 Rust Implementation
//!
//! Rust implementation of the [CCSDS 121.0-B](https://ccsds.org/Pubs/121x0b3.pdf)
//! adaptive Rice lossless compression of fixed-resolution integer samples.
//!
//! ## Design
//!
//! - **Safe Rust** - `#![forbid(unsafe_code)]`
//! - **Explicit sessions** - prediction state lives in an [`Encoder`] or
//!   [`Decoder`], never in globals
//! - **Pluggable prediction** - [`Preprocessor`] / [`Postprocessor`] traits,
//!   with the unit-delay predictor as the default
//! - **Streaming input** - samples can be pushed in arbitrary slices
//!
//! ## API Overview
//!
//! ### High-Level Functions
//!
//! - [`compress()`] - Compress packed sample bytes into header plus payload
//! - [`decompress()`] - Decompress a stream back into packed sample bytes
//! - [`compress_samples()`] / [`decode_stream()`] - Same on `u32` samples
//! - [`read_stream()`] - Decode from any [`std::io::Read`]
//!
//! ### Sessions
//!
//! - [`Encoder`] / [`EncodedStream`] - Block buffering, reference cadence,
//!   zero-block runs
//! - [`Decoder`] / [`DecodedStream`] - Block-by-block reconstruction
//! - [`Header`] - 12-byte stream descriptor
//!
//! ### Coding Primitives
//!
//! - [`CodingOption`] - Option identifiers
//! - [`select_option`] - Per-block option selection
//! - [`split_sample_encode`] / [`split_sample_decode`] - Split-Sample(k)
//! - [`second_extension_encode`] / [`second_extension_decode`] - Pair coding
//! - [`zero_run_encode`] / [`zero_run_length`] - Zero-Block runs
//! - [`BitBuffer`] / [`BitReader`] - MSB-first bit I/O
//!
//! ## Usage
//!
//! ```rust
//! use ccsds121::{compress, decompress};
//!
//! // 16-bit samples, big-endian
//! let data: Vec<u8> = (0u16..512).flat_map(|v| (v / 3).to_be_bytes()).collect();
//!
//! let compressed = compress(
//!     &data,
//!     16,     // resolution in bits
//!     32,     // block size in samples
//! ).unwrap();
//!
//! let decompressed = decompress(&compressed).unwrap();
//!
//! assert_eq!(data, decompressed);
//! ```
//!
//! ## References
//!
//! - [CCSDS 121.0-B Lossless Data Compression](https://ccsds.org/Pubs/121x0b3.pdf)
//! - [CCSDS 120.0-G Informational Report](https://ccsds.org/Pubs/120x0g3.pdf)

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

mod bitbuffer;
mod bitreader;
mod compress;
mod decode;
mod decompress;
mod encode;
mod error;
mod header;
mod option;
mod params;
mod postprocess;
mod preprocess;
mod samples;

pub use bitbuffer::BitBuffer;
pub use bitreader::BitReader;
pub use compress::{compress, compress_samples, EncodedStream, Encoder};
pub use decode::{
    decode_block_values, no_compression_decode, second_extension_decode, split_pair,
    split_sample_decode, zero_run_length, DecoderOptions,
};
pub use decompress::{
    decode_stream, decode_stream_with, decompress, read_stream, DecodedStream, Decoder,
};
pub use encode::{
    encode_block, no_compression_encode, pair_value, second_extension_encode,
    second_extension_values, select_option, split_sample_cost, split_sample_encode,
    zero_run_encode, BlockCode, EncoderOptions, MAX_ZERO_RUN,
};
pub use error::{CodecError, CodecResult};
pub use header::{Header, HEADER_LEN, MAGIC, MAX_SAMPLE_COUNT};
pub use option::CodingOption;
pub use params::{
    BlockSize, CodecParams, DEFAULT_REFERENCE_INTERVAL, MAX_REFERENCE_INTERVAL, MAX_RESOLUTION,
};
pub use postprocess::{Postprocessor, UnitDelayReconstructor};
pub use preprocess::{Preprocessor, UnitDelayPredictor};
pub use samples::{pack_samples, packed_sample_count, unpack_samples};
