//! Decoder session.
//!
//! Parses the header, then walks the payload one codeword at a time:
//! option identifier, raw reference sample on reference blocks, payload.
//! The sample count from the header decides where decoding stops; padding
//! samples of the last block are decoded and dropped.

#![allow(clippy::cast_possible_truncation)]

use std::io::{self, Read};

use log::{debug, trace, warn};

use crate::bitreader::BitReader;
use crate::decode::{decode_block_values, DecoderOptions};
use crate::encode::MAX_ZERO_RUN;
use crate::error::{CodecError, CodecResult};
use crate::header::{Header, HEADER_LEN};
use crate::option::CodingOption;
use crate::params::CodecParams;
use crate::postprocess::{Postprocessor, UnitDelayReconstructor};
use crate::samples::pack_bits;

/// Upper bound on the up-front allocation for decoded samples.
const MAX_PREALLOCATED_SAMPLES: usize = 1 << 20;

/// Decoder for one encoded stream.
#[derive(Clone, Debug)]
pub struct Decoder<Q: Postprocessor = UnitDelayReconstructor> {
    params: CodecParams,
    options: DecoderOptions,
    reconstructor: Q,
}

impl Decoder {
    /// Create a decoder with the unit-delay reconstructor.
    pub fn new(params: CodecParams) -> CodecResult<Self> {
        let reconstructor = UnitDelayReconstructor::new(params.resolution())?;
        Ok(Self::with_postprocessor(params, reconstructor))
    }
}

impl<Q: Postprocessor> Decoder<Q> {
    /// Create a decoder with a custom postprocessor.
    pub fn with_postprocessor(params: CodecParams, reconstructor: Q) -> Self {
        Self {
            params,
            options: DecoderOptions::default(),
            reconstructor,
        }
    }

    /// Replace the decoder options.
    #[must_use]
    pub fn with_options(mut self, options: DecoderOptions) -> Self {
        self.options = options;
        self
    }

    #[inline]
    pub fn params(&self) -> &CodecParams {
        &self.params
    }

    /// Decode `sample_count` samples from a payload (no header).
    ///
    /// # Errors
    ///
    /// Returns `CodecError` if the payload ends early, uses an option this
    /// decoder does not accept, or decodes to values outside the dynamic
    /// range.
    pub fn decode_payload(&mut self, payload: &[u8], sample_count: u64) -> CodecResult<Vec<u32>> {
        let block_size = self.params.block_size();
        let mut reader = BitReader::from_bytes(payload);

        let capacity = usize::try_from(sample_count)
            .unwrap_or(usize::MAX)
            .min(MAX_PREALLOCATED_SAMPLES);
        let mut samples = Vec::with_capacity(capacity);
        let mut mapped = Vec::with_capacity(block_size * MAX_ZERO_RUN as usize);

        let mut block_index = 0u64;
        let mut remaining = sample_count;

        while remaining > 0 {
            let option = CodingOption::read_id(&mut reader, &self.params)?;
            if option == CodingOption::SecondExtension && !self.options.second_extension {
                return Err(CodecError::UnsupportedOption { prefix: 0 });
            }

            let reference = self.params.is_reference_block(block_index);
            let raw = if reference {
                let raw = reader.read_bits(self.params.resolution())?;
                self.reconstructor.set_reference(raw);
                Some(raw)
            } else {
                None
            };

            mapped.clear();
            let blocks =
                decode_block_values(&mut reader, option, reference, &self.params, &mut mapped)?;
            trace!("block {block_index}: {option} x{blocks}");

            if (1..u64::from(blocks)).any(|i| self.params.is_reference_block(block_index + i)) {
                return Err(CodecError::CorruptStream(format!(
                    "zero run of {blocks} blocks at block {block_index} crosses a reference block"
                )));
            }

            let produced = u64::from(blocks) * block_size as u64;
            if produced > remaining && produced - remaining >= block_size as u64 {
                return Err(CodecError::CorruptStream(format!(
                    "zero run of {blocks} blocks overshoots the remaining {remaining} samples"
                )));
            }

            let keep = produced.min(remaining) as usize;
            samples.extend(raw);
            let decoded = keep - usize::from(reference);
            for &value in &mapped[..decoded] {
                samples.push(self.reconstructor.reconstruct(value));
            }

            remaining -= keep as u64;
            block_index += u64::from(blocks);
        }

        let trailing = reader.remaining() / 8;
        if trailing > 0 {
            warn!("ignoring {trailing} trailing payload bytes");
        }

        debug!(
            "decoded {} samples ({}-bit, block size {}) from {} blocks",
            sample_count,
            self.params.resolution(),
            block_size,
            block_index
        );

        Ok(samples)
    }
}

/// Result of a decoding session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedStream {
    params: CodecParams,
    samples: Vec<u32>,
}

impl DecodedStream {
    #[inline]
    pub fn params(&self) -> &CodecParams {
        &self.params
    }

    #[inline]
    pub fn samples(&self) -> &[u32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<u32> {
        self.samples
    }

    #[inline]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Size of the packed samples in bits.
    #[inline]
    pub fn bit_len(&self) -> usize {
        self.samples.len() * self.params.resolution() as usize
    }

    /// Samples packed back to back, MSB-first, last byte zero-padded.
    pub fn to_bytes(&self) -> Vec<u8> {
        pack_bits(&self.samples, self.params.resolution())
    }

    /// Copy the packed samples into `out`, returning the number of bytes written.
    ///
    /// Nothing is written if `out` is too short.
    pub fn copy_to(&self, out: &mut [u8]) -> CodecResult<usize> {
        let required = (self.bit_len() + 7) / 8;
        if out.len() < required {
            return Err(CodecError::BufferTooSmall {
                required,
                available: out.len(),
            });
        }
        let bytes = self.to_bytes();
        out[..required].copy_from_slice(&bytes);
        Ok(required)
    }
}

/// Decode a complete stream (header plus payload) with explicit options.
pub fn decode_stream_with(data: &[u8], options: DecoderOptions) -> CodecResult<DecodedStream> {
    let header = Header::from_bytes(data)?;
    let mut decoder = Decoder::new(*header.params())?.with_options(options);
    let samples = decoder.decode_payload(&data[HEADER_LEN..], header.sample_count())?;

    Ok(DecodedStream {
        params: *header.params(),
        samples,
    })
}

/// Decode a complete stream (header plus payload).
pub fn decode_stream(data: &[u8]) -> CodecResult<DecodedStream> {
    decode_stream_with(data, DecoderOptions::default())
}

/// Decode a stream from a reader positioned at its first header byte.
pub fn read_stream<R: Read>(mut reader: R) -> CodecResult<DecodedStream> {
    let mut data = vec![0u8; HEADER_LEN];
    reader.read_exact(&mut data).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => CodecError::InvalidHeader("truncated header".into()),
        _ => CodecError::Io(e),
    })?;
    reader.read_to_end(&mut data)?;
    decode_stream(&data)
}

/// Decompress a stream back into packed sample bytes.
///
/// # Errors
///
/// Returns `CodecError` if the header is invalid or the payload is
/// truncated or corrupt.
pub fn decompress(data: &[u8]) -> CodecResult<Vec<u8>> {
    Ok(decode_stream(data)?.to_bytes())
}
