//! Conversion between packed sample bytes and `u32` samples.
//!
//! Packed data holds back-to-back `resolution`-bit samples, MSB-first, with
//! no alignment between samples. A trailing group of bits shorter than one
//! sample is completed with zero low bits and counted as a sample.

use crate::bitbuffer::BitBuffer;
use crate::bitreader::BitReader;
use crate::error::CodecResult;
use crate::params::check_resolution;

/// Number of samples [`unpack_samples`] yields for `byte_len` bytes.
pub fn packed_sample_count(byte_len: usize, resolution: u32) -> CodecResult<usize> {
    check_resolution(resolution)?;
    let resolution = resolution as usize;
    Ok((byte_len * 8 + resolution - 1) / resolution)
}

/// Split packed bytes into `resolution`-bit samples.
pub fn unpack_samples(data: &[u8], resolution: u32) -> CodecResult<Vec<u32>> {
    let count = packed_sample_count(data.len(), resolution)?;
    let mut reader = BitReader::from_bytes(data);
    let mut samples = Vec::with_capacity(count);

    while reader.remaining() >= resolution as usize {
        samples.push(reader.read_bits(resolution)?);
    }

    let tail = reader.remaining();
    if tail > 0 {
        #[allow(clippy::cast_possible_truncation)]
        let tail = tail as u32;
        let high = reader.read_bits(tail)?;
        samples.push(high << (resolution - tail));
    }

    Ok(samples)
}

/// Pack samples into `ceil(len * resolution / 8)` bytes.
///
/// Only the low `resolution` bits of each sample are kept.
pub fn pack_samples(samples: &[u32], resolution: u32) -> CodecResult<Vec<u8>> {
    check_resolution(resolution)?;
    Ok(pack_bits(samples, resolution))
}

/// [`pack_samples`] for a resolution already validated by `CodecParams`.
pub(crate) fn pack_bits(samples: &[u32], resolution: u32) -> Vec<u8> {
    let mut buffer = BitBuffer::with_capacity_bits(samples.len() * resolution as usize);
    for &sample in samples {
        buffer.append_value(u64::from(sample), resolution);
    }
    buffer.into_bytes()
}
