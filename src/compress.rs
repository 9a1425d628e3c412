//! Encoder session.
//!
//! Drives the block encoder across a sample stream:
//! - Buffers incoming samples into full blocks
//! - Marks every `reference_interval`-th block as reference-bearing
//! - Groups consecutive all-zero blocks into Zero-Block runs
//! - Pads the last block and produces the header and payload

#![allow(clippy::cast_possible_truncation)]

use std::io::Write;

use log::{debug, trace};

use crate::bitbuffer::BitBuffer;
use crate::encode::{encode_block, zero_run_encode, BlockCode, EncoderOptions, MAX_ZERO_RUN};
use crate::error::{CodecError, CodecResult};
use crate::header::{Header, HEADER_LEN};
use crate::params::CodecParams;
use crate::preprocess::{Preprocessor, UnitDelayPredictor};
use crate::samples::unpack_samples;

/// Streaming encoder for one sample stream.
#[derive(Clone, Debug)]
pub struct Encoder<P: Preprocessor = UnitDelayPredictor> {
    params: CodecParams,
    options: EncoderOptions,
    predictor: P,
    output: BitBuffer,
    /// Samples of the incomplete block.
    pending: Vec<u32>,
    block_index: u64,
    sample_count: u64,
    /// Zero blocks waiting to be emitted as one run.
    zero_run: u32,
    /// Reference sample of the first block of the pending run.
    zero_run_reference: Option<u32>,
}

impl Encoder {
    /// Create an encoder with the unit-delay predictor.
    pub fn new(params: CodecParams) -> CodecResult<Self> {
        let predictor = UnitDelayPredictor::new(params.resolution())?;
        Ok(Self::with_preprocessor(params, predictor))
    }
}

impl<P: Preprocessor> Encoder<P> {
    /// Create an encoder with a custom preprocessor.
    pub fn with_preprocessor(params: CodecParams, predictor: P) -> Self {
        Self {
            params,
            options: EncoderOptions::default(),
            predictor,
            output: BitBuffer::new(),
            pending: Vec::with_capacity(params.block_size()),
            block_index: 0,
            sample_count: 0,
            zero_run: 0,
            zero_run_reference: None,
        }
    }

    /// Replace the encoder options.
    #[must_use]
    pub fn with_options(mut self, options: EncoderOptions) -> Self {
        self.options = options;
        self
    }

    #[inline]
    pub fn params(&self) -> &CodecParams {
        &self.params
    }

    /// Samples pushed so far.
    #[inline]
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Append samples to the stream.
    ///
    /// Every sample is checked against the dynamic range before any of them
    /// is consumed, so a rejected call leaves the encoder unchanged.
    pub fn push_samples(&mut self, samples: &[u32]) -> CodecResult<()> {
        let max_value = self.params.max_value();
        if let Some(&value) = samples.iter().find(|&&s| s > max_value) {
            return Err(CodecError::SampleOutOfRange {
                value,
                resolution: self.params.resolution(),
            });
        }

        let block_size = self.params.block_size();
        let mut rest = samples;

        if !self.pending.is_empty() {
            let take = (block_size - self.pending.len()).min(rest.len());
            self.pending.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            if self.pending.len() == block_size {
                self.encode_pending()?;
            }
        }

        let mut blocks = rest.chunks_exact(block_size);
        for block in &mut blocks {
            self.encode_next_block(block)?;
        }
        self.pending.extend_from_slice(blocks.remainder());

        self.sample_count += samples.len() as u64;
        Ok(())
    }

    /// Flush the last block and return the encoded stream.
    pub fn finish(mut self) -> CodecResult<EncodedStream> {
        let header = Header::new(self.params, self.sample_count)?;

        if !self.pending.is_empty() {
            self.pending.resize(self.params.block_size(), 0);
            self.encode_pending()?;
        }
        self.flush_zero_run();

        let bit_len = self.output.len();
        debug!(
            "encoded {} samples ({}-bit, block size {}) in {} blocks: {} payload bits",
            header.sample_count(),
            self.params.resolution(),
            self.params.block_size(),
            self.block_index,
            bit_len
        );

        Ok(EncodedStream {
            header,
            payload: self.output.into_bytes(),
            bit_len,
        })
    }

    fn encode_pending(&mut self) -> CodecResult<()> {
        let block = std::mem::take(&mut self.pending);
        let result = self.encode_next_block(&block);
        self.pending = block;
        self.pending.clear();
        result
    }

    fn encode_next_block(&mut self, block: &[u32]) -> CodecResult<()> {
        let reference = self.params.is_reference_block(self.block_index);
        if reference {
            self.flush_zero_run();
        }

        match encode_block(
            &mut self.predictor,
            block,
            reference,
            &self.params,
            &self.options,
        )? {
            BlockCode::Zero { reference } => {
                if self.zero_run == 0 {
                    self.zero_run_reference = reference;
                }
                self.zero_run += 1;
                if self.zero_run == MAX_ZERO_RUN {
                    self.flush_zero_run();
                }
            }
            BlockCode::Coded { option, bits } => {
                self.flush_zero_run();
                trace!("block {}: {} ({} bits)", self.block_index, option, bits.len());
                self.output.append_buffer(&bits);
            }
        }

        self.block_index += 1;
        Ok(())
    }

    fn flush_zero_run(&mut self) {
        if self.zero_run == 0 {
            return;
        }
        trace!(
            "blocks {}..{}: zero-block run",
            self.block_index - u64::from(self.zero_run),
            self.block_index
        );
        zero_run_encode(
            &mut self.output,
            &self.params,
            self.zero_run,
            self.zero_run_reference.take(),
        );
        self.zero_run = 0;
    }
}

/// Result of an encoding session: parameters, sample count and payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedStream {
    header: Header,
    payload: Vec<u8>,
    bit_len: usize,
}

impl EncodedStream {
    #[inline]
    pub fn params(&self) -> &CodecParams {
        self.header.params()
    }

    /// Number of samples encoded (excluding padding).
    #[inline]
    pub fn sample_count(&self) -> u64 {
        self.header.sample_count()
    }

    /// Payload bytes; the final byte is zero-padded.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Exact payload length in bits.
    #[inline]
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Total encoded size (header plus payload) in bytes.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.payload.len()
    }

    /// Header followed by payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.encoded_len());
        bytes.extend_from_slice(&self.header().to_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Write header and payload to `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> CodecResult<()> {
        writer.write_all(&self.header().to_bytes())?;
        writer.write_all(&self.payload)?;
        Ok(())
    }

    /// Copy the payload into `out`, returning the number of bytes written.
    ///
    /// Nothing is written if `out` is shorter than the payload.
    pub fn copy_payload_to(&self, out: &mut [u8]) -> CodecResult<usize> {
        if out.len() < self.payload.len() {
            return Err(CodecError::BufferTooSmall {
                required: self.payload.len(),
                available: out.len(),
            });
        }
        out[..self.payload.len()].copy_from_slice(&self.payload);
        Ok(self.payload.len())
    }
}

/// Encode a slice of samples in one call.
pub fn compress_samples(samples: &[u32], params: CodecParams) -> CodecResult<EncodedStream> {
    let mut encoder = Encoder::new(params)?;
    encoder.push_samples(samples)?;
    encoder.finish()
}

/// Compress packed `resolution`-bit samples into header plus payload bytes.
///
/// # Arguments
///
/// * `data` - Back-to-back big-endian samples; a trailing partial sample is
///   zero-padded
/// * `resolution` - Sample width in bits (1-32)
/// * `block_size` - Samples per block (8, 16, 32 or 64)
///
/// # Errors
///
/// Returns `CodecError` if the parameters are invalid or the sample count
/// does not fit the header.
pub fn compress(data: &[u8], resolution: u32, block_size: usize) -> CodecResult<Vec<u8>> {
    let params = CodecParams::new(resolution, block_size)?;
    let samples = unpack_samples(data, resolution)?;
    Ok(compress_samples(&samples, params)?.to_bytes())
}
