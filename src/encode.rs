//! Block encoding: option cost estimation, selection and bit packing.
//!
//! Each block of preprocessed values is costed under every available
//! option and emitted with the cheapest one:
//! - Split-Sample(k): unary `v >> k` for every value, then the `k` low bits
//!   of every value (k = 0 is the Fundamental Sequence)
//! - Second-Extension: values paired as `(a, b)` and combined into
//!   `(a + b)(a + b + 1) / 2 + b`, each unary coded
//! - No-Compression: `resolution` raw bits per value
//!
//! Blocks whose values are all zero are not emitted here; the caller
//! groups them into Zero-Block runs with [`zero_run_encode`].

#![allow(clippy::cast_possible_truncation)]

use crate::bitbuffer::BitBuffer;
use crate::error::{CodecError, CodecResult};
use crate::option::CodingOption;
use crate::params::CodecParams;
use crate::preprocess::Preprocessor;

/// Maximum number of blocks one Zero-Block codeword covers.
pub const MAX_ZERO_RUN: u32 = 63;

/// Encoder behavior switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Consider the Second-Extension option when selecting.
    pub second_extension: bool,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            second_extension: true,
        }
    }
}

/// Outcome of encoding one block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockCode {
    /// Every emitted value is zero; the block joins a zero run.
    Zero {
        /// Raw reference sample if the block carries one.
        reference: Option<u32>,
    },
    /// The block was coded on its own.
    Coded {
        option: CodingOption,
        /// Identifier, reference sample and payload.
        bits: BitBuffer,
    },
}

/// Payload representation chosen for a block.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Plan {
    Split(u32),
    Pairs(Vec<u64>),
    Raw,
}

impl Plan {
    fn option(&self) -> CodingOption {
        match self {
            Self::Split(k) => CodingOption::split(*k),
            Self::Pairs(_) => CodingOption::SecondExtension,
            Self::Raw => CodingOption::NoCompression,
        }
    }
}

/// Payload bits of Split-Sample(k): `k + (v >> k) + 1` per value.
pub fn split_sample_cost(values: &[u32], k: u32) -> u64 {
    values
        .iter()
        .map(|&v| u64::from(v >> k) + 1 + u64::from(k))
        .sum()
}

/// Second-Extension combination `(a + b)(a + b + 1) / 2 + b`.
///
/// Returns `None` if the result does not fit in 64 bits.
pub fn pair_value(a: u32, b: u32) -> Option<u64> {
    let sum = u64::from(a) + u64::from(b);
    let triangle = sum.checked_mul(sum + 1)? / 2;
    triangle.checked_add(u64::from(b))
}

/// Combined Second-Extension values of a block.
///
/// `preprocessed` covers the whole block; when it carries a reference the
/// first pair uses `a = 0` in place of the reference slot.
pub fn second_extension_values(preprocessed: &[u32], reference: bool) -> Option<Vec<u64>> {
    preprocessed
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| {
            let a = if reference && i == 0 { 0 } else { pair[0] };
            pair_value(a, pair[1])
        })
        .collect()
}

/// Payload bits of a Second-Extension block, `Σ(f + 1)`.
fn pairs_cost(pairs: &[u64]) -> Option<u64> {
    pairs
        .iter()
        .try_fold(0u64, |acc, &f| acc.checked_add(f)?.checked_add(1))
}

/// Pick the cheapest payload for a block.
///
/// Candidates are scanned Split-Sample k ascending, then Second-Extension,
/// then No-Compression; a later candidate only wins if strictly cheaper.
/// The returned cost includes the option identifier but not the reference.
fn select_plan(
    preprocessed: &[u32],
    reference: bool,
    params: &CodecParams,
    options: &EncoderOptions,
) -> (Plan, u64) {
    let prefix = u64::from(params.prefix_size());
    let emitted = if reference {
        &preprocessed[1..]
    } else {
        preprocessed
    };

    let mut best: Option<(Plan, u64)> = None;
    let consider = |plan: Plan, cost: u64, best: &mut Option<(Plan, u64)>| {
        if best.as_ref().map_or(true, |(_, c)| cost < *c) {
            *best = Some((plan, cost));
        }
    };

    if let Some(limit) = params.split_sample_limit() {
        for k in 0..=limit {
            consider(
                Plan::Split(k),
                prefix + split_sample_cost(emitted, k),
                &mut best,
            );
        }
    }

    if options.second_extension {
        if let Some(pairs) = second_extension_values(preprocessed, reference) {
            if let Some(cost) = pairs_cost(&pairs).and_then(|c| c.checked_add(prefix + 1)) {
                consider(Plan::Pairs(pairs), cost, &mut best);
            }
        }
    }

    let raw = prefix + u64::from(params.resolution()) * emitted.len() as u64;
    consider(Plan::Raw, raw, &mut best);

    best.unwrap_or((Plan::Raw, raw))
}

/// Choose the coding option for a block of preprocessed values.
///
/// Returns the option and its size in bits (identifier plus payload,
/// excluding any reference sample).
pub fn select_option(
    preprocessed: &[u32],
    reference: bool,
    params: &CodecParams,
    options: &EncoderOptions,
) -> (CodingOption, u64) {
    let (plan, cost) = select_plan(preprocessed, reference, params, options);
    (plan.option(), cost)
}

/// Emit Split-Sample(k) payload: all unary quotients, then all remainders.
pub fn split_sample_encode(output: &mut BitBuffer, values: &[u32], k: u32) {
    for &v in values {
        output.append_unary(u64::from(v >> k));
    }
    if k > 0 {
        for &v in values {
            output.append_value(u64::from(v), k);
        }
    }
}

/// Emit Second-Extension payload from combined pair values.
pub fn second_extension_encode(output: &mut BitBuffer, pairs: &[u64]) {
    for &f in pairs {
        output.append_unary(f);
    }
}

/// Emit No-Compression payload: `resolution` raw bits per value.
pub fn no_compression_encode(output: &mut BitBuffer, values: &[u32], resolution: u32) {
    for &v in values {
        output.append_value(u64::from(v), resolution);
    }
}

/// Emit a Zero-Block codeword covering `blocks` consecutive zero blocks.
///
/// `reference` is the raw reference sample of the first block of the run.
pub fn zero_run_encode(
    output: &mut BitBuffer,
    params: &CodecParams,
    blocks: u32,
    reference: Option<u32>,
) {
    debug_assert!((1..=MAX_ZERO_RUN).contains(&blocks));

    CodingOption::ZeroBlock.write_id(output, params);
    if let Some(raw) = reference {
        output.append_value(u64::from(raw), params.resolution());
    }

    let count = if blocks < 5 { blocks - 1 } else { blocks };
    output.append_unary(u64::from(count));
}

/// Preprocess and encode one full block of raw samples.
///
/// When `reference` is set, `samples[0]` is stored raw after the option
/// identifier and its mapped value is excluded from the payload. A slice of
/// any length other than the block size is rejected before the predictor
/// sees it.
pub fn encode_block<P: Preprocessor>(
    predictor: &mut P,
    samples: &[u32],
    reference: bool,
    params: &CodecParams,
    options: &EncoderOptions,
) -> CodecResult<BlockCode> {
    if samples.len() != params.block_size() {
        return Err(CodecError::InvalidBlockLength {
            expected: params.block_size(),
            actual: samples.len(),
        });
    }

    let reference_value = reference.then(|| samples[0]);
    let preprocessed: Vec<u32> = samples.iter().map(|&s| predictor.preprocess(s)).collect();
    let emitted = if reference {
        &preprocessed[1..]
    } else {
        &preprocessed[..]
    };

    if emitted.iter().all(|&v| v == 0) {
        return Ok(BlockCode::Zero {
            reference: reference_value,
        });
    }

    let (plan, _) = select_plan(&preprocessed, reference, params, options);
    let option = plan.option();

    let mut bits = BitBuffer::with_capacity_bits(
        params.prefix_size() as usize + params.block_size() * params.resolution() as usize,
    );
    option.write_id(&mut bits, params);
    if let Some(raw) = reference_value {
        bits.append_value(u64::from(raw), params.resolution());
    }

    match plan {
        Plan::Split(k) => split_sample_encode(&mut bits, emitted, k),
        Plan::Pairs(pairs) => second_extension_encode(&mut bits, &pairs),
        Plan::Raw => no_compression_encode(&mut bits, emitted, params.resolution()),
    }

    Ok(BlockCode::Coded { option, bits })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::UnitDelayPredictor;

    fn params(resolution: u32, block_size: usize) -> CodecParams {
        CodecParams::new(resolution, block_size).unwrap()
    }

    #[test]
    fn test_split_sample_cost() {
        // k = 0: v + 1 each
        assert_eq!(split_sample_cost(&[0, 1, 2, 3], 0), 1 + 2 + 3 + 4);
        // k = 1: 1 + (v >> 1) + 1 each
        assert_eq!(split_sample_cost(&[0, 1, 2, 3], 1), 2 + 2 + 3 + 3);
    }

    #[test]
    fn test_pair_value() {
        assert_eq!(pair_value(0, 0), Some(0));
        assert_eq!(pair_value(1, 0), Some(1));
        assert_eq!(pair_value(0, 1), Some(2));
        assert_eq!(pair_value(2, 0), Some(3));
        assert_eq!(pair_value(1, 1), Some(4));
        assert_eq!(pair_value(0, 2), Some(5));
        assert_eq!(pair_value(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn test_second_extension_values_skip_reference_slot() {
        let values = [9, 1, 0, 2];
        assert_eq!(second_extension_values(&values, true), Some(vec![2, 5]));
        assert_eq!(second_extension_values(&values, false), Some(vec![56, 5]));
    }

    #[test]
    fn test_select_fundamental_sequence_for_small_values() {
        let p = params(8, 8);
        let values = [1, 0, 2, 1, 0, 3, 1, 1];
        let options = EncoderOptions {
            second_extension: false,
        };
        let (option, bits) = select_option(&values, false, &p, &options);
        assert_eq!(option, CodingOption::FundamentalSequence);
        assert_eq!(bits, 3 + split_sample_cost(&values, 0));
    }

    #[test]
    fn test_select_split_sample_for_mid_values() {
        let p = params(8, 8);
        let values = [40, 37, 45, 33, 50, 41, 38, 44];
        let (option, _) = select_option(&values, false, &p, &EncoderOptions::default());
        assert_eq!(option, CodingOption::SplitSample(5));
    }

    #[test]
    fn test_select_no_compression_for_large_values() {
        let p = params(8, 8);
        let values = [255, 250, 251, 249, 253, 248, 252, 254];
        let (option, bits) = select_option(&values, false, &p, &EncoderOptions::default());
        assert_eq!(option, CodingOption::NoCompression);
        assert_eq!(bits, 3 + 8 * 8);
    }

    #[test]
    fn test_select_second_extension_for_sparse_values() {
        let p = params(8, 16);
        let mut values = [0u32; 16];
        values[4] = 1;
        let (option, bits) = select_option(&values, false, &p, &EncoderOptions::default());
        assert_eq!(option, CodingOption::SecondExtension);
        // 8 pairs: (1, 0) combines to 1, the rest to 0
        assert_eq!(bits, 3 + 1 + 8 + 1);

        let options = EncoderOptions {
            second_extension: false,
        };
        let (option, _) = select_option(&values, false, &p, &options);
        assert_eq!(option, CodingOption::FundamentalSequence);
    }

    #[test]
    fn test_select_ties_favor_lowest_k() {
        // k = 0 costs 2 per value, k = 1 costs 2 per value as well.
        let p = params(8, 8);
        let values = [1u32; 8];
        let options = EncoderOptions {
            second_extension: false,
        };
        let (option, _) = select_option(&values, false, &p, &options);
        assert_eq!(option, CodingOption::FundamentalSequence);
    }

    #[test]
    fn test_select_low_resolution_has_no_split_options() {
        let p = params(2, 8);
        let values = [3, 2, 3, 3, 2, 3, 3, 2];
        let (option, _) = select_option(&values, false, &p, &EncoderOptions::default());
        assert_eq!(option, CodingOption::NoCompression);
    }

    #[test]
    fn test_split_sample_encode_layout() {
        let mut bb = BitBuffer::new();
        // k = 2: quotients 1, 0 -> "01" "1"; remainders 01, 10
        split_sample_encode(&mut bb, &[5, 2], 2);
        assert_eq!(bb.len(), 3 + 4);
        assert_eq!(bb.to_bytes(), vec![0b0110_1100]);
    }

    #[test]
    fn test_no_compression_encode() {
        let mut bb = BitBuffer::new();
        no_compression_encode(&mut bb, &[0xA, 0x5], 4);
        assert_eq!(bb.to_bytes(), vec![0xA5]);
    }

    #[test]
    fn test_zero_run_encode_counts() {
        let p = params(8, 8);
        // prefix 0000 then count
        let cases = [(1, 5), (2, 6), (4, 8), (5, 10), (63, 68)];
        for (blocks, len) in cases {
            let mut bb = BitBuffer::new();
            zero_run_encode(&mut bb, &p, blocks, None);
            assert_eq!(bb.len(), len, "{blocks} blocks");
        }
    }

    #[test]
    fn test_zero_run_encode_with_reference() {
        let p = params(8, 8);
        let mut bb = BitBuffer::new();
        zero_run_encode(&mut bb, &p, 1, Some(0xAB));
        // 0000 | 10101011 | 1
        assert_eq!(bb.len(), 13);
        assert_eq!(bb.to_bytes(), vec![0b0000_1010, 0b1011_1000]);
    }

    #[test]
    fn test_encode_block_zero() {
        let p = params(8, 8);
        let mut predictor = UnitDelayPredictor::new(8).unwrap();
        let code =
            encode_block(&mut predictor, &[0; 8], false, &p, &EncoderOptions::default()).unwrap();
        assert_eq!(code, BlockCode::Zero { reference: None });
    }

    #[test]
    fn test_encode_block_constant_reference_block_is_zero() {
        let p = params(8, 8);
        let mut predictor = UnitDelayPredictor::new(8).unwrap();
        let code =
            encode_block(&mut predictor, &[77; 8], true, &p, &EncoderOptions::default()).unwrap();
        assert_eq!(code, BlockCode::Zero { reference: Some(77) });
        assert_eq!(predictor.reference(), 77);
    }

    #[test]
    fn test_encode_block_fundamental_sequence() {
        let p = params(8, 8);
        let mut predictor = UnitDelayPredictor::new(8).unwrap();
        let options = EncoderOptions {
            second_extension: false,
        };
        // Reference 10, then +1 steps: mapped values 2 each. k = 0, 1, 2
        // all cost 3 bits per value, the lowest k wins.
        let samples = [10, 11, 12, 13, 14, 15, 16, 17];
        let BlockCode::Coded { option, bits } =
            encode_block(&mut predictor, &samples, true, &p, &options).unwrap()
        else {
            panic!("expected a coded block");
        };
        assert_eq!(option, CodingOption::FundamentalSequence);
        // 001 | 00001010 | seven "001" codewords
        assert_eq!(bits.len(), 3 + 8 + 21);
        assert_eq!(bits.to_bytes(), vec![0x21, 0x44, 0x92, 0x49]);
    }

    #[test]
    fn test_encode_block_rejects_wrong_length() {
        let p = params(8, 16);
        let mut predictor = UnitDelayPredictor::new(8).unwrap();
        let options = EncoderOptions::default();

        for (samples, reference) in [(&[][..], true), (&[5; 15][..], false), (&[5; 17][..], true)] {
            assert!(matches!(
                encode_block(&mut predictor, samples, reference, &p, &options),
                Err(CodecError::InvalidBlockLength { expected: 16, actual })
                    if actual == samples.len()
            ));
        }

        // Rejected calls leave the predictor untouched.
        assert_eq!(predictor.reference(), 0);
    }
}
