//! Block decoding: inverse of the [`encode`](crate::encode) payloads.
//!
//! Functions here turn option payloads back into mapped values. They never
//! touch prediction state; reconstruction happens in the decoder session.
//! Every decoded value is checked against the stream's dynamic range so a
//! corrupt payload surfaces as an error instead of a wrapped sample.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use crate::bitreader::BitReader;
use crate::encode::MAX_ZERO_RUN;
use crate::error::{CodecError, CodecResult};
use crate::option::CodingOption;
use crate::params::CodecParams;

/// Decoder behavior switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Accept Second-Extension blocks. When disabled they are rejected
    /// with [`CodecError::UnsupportedOption`].
    pub second_extension: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            second_extension: true,
        }
    }
}

fn out_of_range(value: u64, max_value: u32) -> CodecError {
    CodecError::CorruptStream(format!(
        "mapped value {value} exceeds maximum {max_value}"
    ))
}

/// Decode `count` Split-Sample(k) values: all quotients, then all remainders.
pub fn split_sample_decode(
    reader: &mut BitReader,
    k: u32,
    count: usize,
    max_value: u32,
    out: &mut Vec<u32>,
) -> CodecResult<()> {
    let start = out.len();
    let max_quotient = u64::from(max_value >> k);

    for _ in 0..count {
        let quotient = reader.read_unary()?;
        if quotient > max_quotient {
            return Err(out_of_range(quotient << k, max_value));
        }
        out.push((quotient as u32) << k);
    }

    if k > 0 {
        for value in &mut out[start..] {
            *value |= reader.read_bits(k)?;
        }
    }

    Ok(())
}

/// Split a Second-Extension value back into its pair `(a, b)`.
pub fn split_pair(f: u64) -> (u64, u64) {
    let triangle = |s: u64| u128::from(s) * (u128::from(s) + 1) / 2;
    let target = u128::from(f);

    // Floating-point estimate of the triangular root, then exact correction.
    let mut sum = (((8.0 * f as f64 + 1.0).sqrt() - 1.0) / 2.0) as u64;
    while triangle(sum) > target {
        sum -= 1;
    }
    while triangle(sum + 1) <= target {
        sum += 1;
    }

    let b = (target - triangle(sum)) as u64;
    (sum - b, b)
}

/// Decode `pairs` Second-Extension codewords.
///
/// With `reference` set, the first pair's `a` stands in for the reference
/// slot: it must be zero and is not emitted.
pub fn second_extension_decode(
    reader: &mut BitReader,
    pairs: usize,
    reference: bool,
    max_value: u32,
    out: &mut Vec<u32>,
) -> CodecResult<()> {
    let max = u64::from(max_value);

    for i in 0..pairs {
        let (a, b) = split_pair(reader.read_unary()?);
        if a > max || b > max {
            return Err(out_of_range(a.max(b), max_value));
        }

        if reference && i == 0 {
            if a != 0 {
                return Err(CodecError::CorruptStream(
                    "second extension pair overlaps the reference sample".into(),
                ));
            }
        } else {
            out.push(a as u32);
        }
        out.push(b as u32);
    }

    Ok(())
}

/// Decode `count` raw `resolution`-bit values.
pub fn no_compression_decode(
    reader: &mut BitReader,
    resolution: u32,
    count: usize,
    out: &mut Vec<u32>,
) -> CodecResult<()> {
    for _ in 0..count {
        out.push(reader.read_bits(resolution)?);
    }
    Ok(())
}

/// Read the run length of a Zero-Block codeword, in blocks.
pub fn zero_run_length(reader: &mut BitReader) -> CodecResult<u32> {
    let count = reader.read_unary()?;
    if count > u64::from(MAX_ZERO_RUN) {
        return Err(CodecError::CorruptStream(format!(
            "zero run of {count} blocks exceeds {MAX_ZERO_RUN}"
        )));
    }

    let count = count as u32;
    Ok(if count >= 4 { count } else { count + 1 })
}

/// Decode the payload of one codeword into mapped values.
///
/// The option identifier and any reference sample must already have been
/// consumed. Appends the mapped values of every non-reference slot and
/// returns the number of blocks the codeword covers.
pub fn decode_block_values(
    reader: &mut BitReader,
    option: CodingOption,
    reference: bool,
    params: &CodecParams,
    out: &mut Vec<u32>,
) -> CodecResult<u32> {
    let block_size = params.block_size();
    let slots = block_size - usize::from(reference);
    let max_value = params.max_value();

    match option {
        CodingOption::ZeroBlock => {
            let blocks = zero_run_length(reader)?;
            out.resize(out.len() + blocks as usize * block_size - usize::from(reference), 0);
            Ok(blocks)
        }
        CodingOption::SecondExtension => {
            second_extension_decode(reader, block_size / 2, reference, max_value, out)?;
            Ok(1)
        }
        CodingOption::FundamentalSequence | CodingOption::SplitSample(_) => {
            let k = option.split_k().unwrap_or_default();
            split_sample_decode(reader, k, slots, max_value, out)?;
            Ok(1)
        }
        CodingOption::NoCompression => {
            no_compression_decode(reader, params.resolution(), slots, out)?;
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitbuffer::BitBuffer;
    use crate::encode::{
        no_compression_encode, pair_value, second_extension_encode, second_extension_values,
        split_sample_encode, zero_run_encode,
    };

    #[test]
    fn test_split_sample_decode() {
        // k = 2: "01" "1" then remainders 01, 10
        let data = vec![0b0110_1100];
        let mut reader = BitReader::new(&data, 7);
        let mut out = Vec::new();
        split_sample_decode(&mut reader, 2, 2, 255, &mut out).unwrap();
        assert_eq!(out, vec![5, 2]);
        assert!(!reader.has_bits());
    }

    #[test]
    fn test_split_sample_decode_rejects_out_of_range() {
        // Four-bit values: quotient 16 with k = 0 exceeds 15
        let mut bb = BitBuffer::new();
        bb.append_unary(16);
        let data = bb.to_bytes();
        let mut reader = BitReader::from_bytes(&data);
        let mut out = Vec::new();
        assert!(matches!(
            split_sample_decode(&mut reader, 0, 1, 15, &mut out),
            Err(CodecError::CorruptStream(_))
        ));
    }

    #[test]
    fn test_split_sample_inverts_encode() {
        let values = [0, 1, 17, 200, 255, 3, 64, 9];
        for k in 0..=5 {
            let mut bb = BitBuffer::new();
            split_sample_encode(&mut bb, &values, k);
            let data = bb.to_bytes();
            let mut reader = BitReader::new(&data, bb.len());
            let mut out = Vec::new();
            split_sample_decode(&mut reader, k, values.len(), 255, &mut out).unwrap();
            assert_eq!(out, values, "k = {k}");
            assert_eq!(reader.remaining(), 0);
        }
    }

    #[test]
    fn test_split_pair() {
        for a in 0..40u32 {
            for b in 0..40u32 {
                let f = pair_value(a, b).unwrap();
                assert_eq!(split_pair(f), (u64::from(a), u64::from(b)));
            }
        }
    }

    #[test]
    fn test_split_pair_large() {
        let a = 3_000_000_000u32;
        let b = 123_456u32;
        let f = pair_value(a, b).unwrap();
        assert_eq!(split_pair(f), (u64::from(a), u64::from(b)));
    }

    #[test]
    fn test_second_extension_roundtrip_with_reference() {
        let preprocessed = [99, 1, 0, 2, 1, 1, 0, 0];
        let pairs = second_extension_values(&preprocessed, true).unwrap();
        let mut bb = BitBuffer::new();
        second_extension_encode(&mut bb, &pairs);

        let data = bb.to_bytes();
        let mut reader = BitReader::new(&data, bb.len());
        let mut out = Vec::new();
        second_extension_decode(&mut reader, 4, true, 255, &mut out).unwrap();
        assert_eq!(out, preprocessed[1..].to_vec());
    }

    #[test]
    fn test_second_extension_reference_pair_must_be_zero() {
        // f = 1 decodes to (1, 0)
        let mut bb = BitBuffer::new();
        bb.append_unary(1);
        let data = bb.to_bytes();
        let mut reader = BitReader::from_bytes(&data);
        let mut out = Vec::new();
        assert!(matches!(
            second_extension_decode(&mut reader, 1, true, 255, &mut out),
            Err(CodecError::CorruptStream(_))
        ));
    }

    #[test]
    fn test_no_compression_decode() {
        let mut bb = BitBuffer::new();
        no_compression_encode(&mut bb, &[0x123, 0x7FF, 0], 11);
        let data = bb.to_bytes();
        let mut reader = BitReader::from_bytes(&data);
        let mut out = Vec::new();
        no_compression_decode(&mut reader, 11, 3, &mut out).unwrap();
        assert_eq!(out, vec![0x123, 0x7FF, 0]);
    }

    #[test]
    fn test_zero_run_length() {
        let params = CodecParams::new(8, 8).unwrap();
        for blocks in [1, 2, 3, 4, 5, 6, 40, 63] {
            let mut bb = BitBuffer::new();
            zero_run_encode(&mut bb, &params, blocks, None);
            let data = bb.to_bytes();
            let mut reader = BitReader::new(&data, bb.len());
            assert_eq!(
                CodingOption::read_id(&mut reader, &params).unwrap(),
                CodingOption::ZeroBlock
            );
            assert_eq!(zero_run_length(&mut reader).unwrap(), blocks);
        }
    }

    #[test]
    fn test_zero_run_too_long() {
        let mut bb = BitBuffer::new();
        bb.append_unary(64);
        let data = bb.to_bytes();
        let mut reader = BitReader::from_bytes(&data);
        assert!(matches!(
            zero_run_length(&mut reader),
            Err(CodecError::CorruptStream(_))
        ));
    }

    #[test]
    fn test_decode_block_values_zero_run_with_reference() {
        let params = CodecParams::new(8, 8).unwrap();
        // Run length code for 2 blocks is a single "01".
        let data = vec![0b0100_0000];
        let mut reader = BitReader::new(&data, 2);
        let mut out = Vec::new();
        let blocks =
            decode_block_values(&mut reader, CodingOption::ZeroBlock, true, &params, &mut out)
                .unwrap();
        assert_eq!(blocks, 2);
        assert_eq!(out, vec![0; 15]);
    }

    #[test]
    fn test_decode_block_values_split_skips_reference_slot() {
        let params = CodecParams::new(8, 8).unwrap();
        let values = [1, 2, 3, 4, 5, 6, 7];
        let mut bb = BitBuffer::new();
        split_sample_encode(&mut bb, &values, 1);
        let data = bb.to_bytes();
        let mut reader = BitReader::new(&data, bb.len());
        let mut out = Vec::new();
        let blocks = decode_block_values(
            &mut reader,
            CodingOption::SplitSample(1),
            true,
            &params,
            &mut out,
        )
        .unwrap();
        assert_eq!(blocks, 1);
        assert_eq!(out, values.to_vec());
    }
}
