//! MSB-first bit cursor over an encoded payload.
//!
//! The counterpart of [`BitBuffer`](crate::BitBuffer): the first bit read
//! from a byte is its most significant one. A reader may be limited to fewer
//! bits than its slice holds, in which case the padding past the limit is
//! never returned.

#![allow(clippy::cast_possible_truncation)]

use crate::error::{CodecError, CodecResult};

/// Bit cursor over a borrowed byte slice.
#[derive(Clone, Debug)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    /// Readable bits; never more than `bytes.len() * 8`.
    limit: usize,
    cursor: usize,
}

impl<'a> BitReader<'a> {
    /// Reader over the first `num_bits` bits of `bytes`.
    ///
    /// A `num_bits` past the end of the slice is clamped.
    pub fn new(bytes: &'a [u8], num_bits: usize) -> Self {
        Self {
            bytes,
            limit: num_bits.min(bytes.len() * 8),
            cursor: 0,
        }
    }

    /// Reader over all of `bytes`.
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self::new(bytes, bytes.len() * 8)
    }

    /// Bits consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Bits left before the limit.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit - self.cursor
    }

    #[inline]
    pub fn has_bits(&self) -> bool {
        self.cursor < self.limit
    }

    #[inline]
    pub fn read_bit(&mut self) -> CodecResult<bool> {
        if !self.has_bits() {
            return Err(CodecError::UnexpectedEndOfStream);
        }
        let byte = self.bytes[self.cursor / 8];
        let bit = byte & (0x80 >> (self.cursor % 8)) != 0;
        self.cursor += 1;
        Ok(bit)
    }

    /// Read a `width`-bit unsigned field (`width` up to 32).
    ///
    /// Nothing is consumed when fewer than `width` bits remain.
    pub fn read_bits(&mut self, width: u32) -> CodecResult<u32> {
        debug_assert!(width <= 32);
        let mut need = width as usize;
        if need > self.remaining() {
            return Err(CodecError::UnexpectedEndOfStream);
        }

        let mut value = 0u64;
        while need > 0 {
            let offset = self.cursor % 8;
            let take = need.min(8 - offset);
            let byte = u64::from(self.bytes[self.cursor / 8]);
            let chunk = (byte >> (8 - offset - take)) & ((1u64 << take) - 1);

            value = (value << take) | chunk;
            self.cursor += take;
            need -= take;
        }
        Ok(value as u32)
    }

    /// Read a unary codeword and return its count of leading zeros.
    ///
    /// The closing one bit is consumed too.
    pub fn read_unary(&mut self) -> CodecResult<u64> {
        let mut zeros = 0u64;
        while self.has_bits() {
            let offset = self.cursor % 8;
            // Unread bits of this byte, shifted to the top.
            let window = self.bytes[self.cursor / 8] << offset;
            let span = (8 - offset).min(self.remaining());
            let run = (window.leading_zeros() as usize).min(span);

            if run < span {
                self.cursor += run + 1;
                return Ok(zeros + run as u64);
            }
            zeros += span as u64;
            self.cursor += span;
        }
        Err(CodecError::UnexpectedEndOfStream)
    }
}
