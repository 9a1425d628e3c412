//! Growable bit sink for the encoded payload.
//!
//! Codewords are packed back to back with no byte alignment. Within each
//! byte the first bit written lands in the most significant position, so a
//! stream reads left to right in a hex dump.
//!
//! ```text
//! append_value(0b101, 3); append_bit(true); append_value(0x3, 4)
//!   -> 1011_0011 = 0xB3
//! ```

#![allow(clippy::cast_possible_truncation)]

/// Widest value [`BitBuffer::append_value`] accepts in one call.
pub const MAX_APPEND_BITS: u32 = 56;

/// MSB-first bit writer.
///
/// Completed bytes go straight to `bytes`. The trailing partial byte sits in
/// a 64-bit staging word, which lets one append carry up to 56 bits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitBuffer {
    bytes: Vec<u8>,
    bit_len: usize,
    staged: u64,
    staged_len: u32,
}

impl BitBuffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty buffer with room for `bits` bits before reallocating.
    pub fn with_capacity_bits(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits / 8),
            ..Self::default()
        }
    }

    /// Number of bits written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.bit_len
    }

    /// Whether nothing has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bit_len == 0
    }

    /// Move whole bytes out of the staging word.
    fn drain_staged(&mut self) {
        while self.staged_len >= 8 {
            self.staged_len -= 8;
            self.bytes.push((self.staged >> self.staged_len) as u8);
        }
        self.staged &= (1u64 << self.staged_len) - 1;
    }

    /// Append one bit.
    #[inline]
    pub fn append_bit(&mut self, bit: bool) {
        self.staged = (self.staged << 1) | u64::from(bit);
        self.staged_len += 1;
        self.bit_len += 1;
        if self.staged_len == 8 {
            self.drain_staged();
        }
    }

    /// Append the low `width` bits of `value`, most significant first.
    ///
    /// Bits of `value` above `width` are ignored. `width` ranges from 0
    /// (nothing written) to [`MAX_APPEND_BITS`].
    pub fn append_value(&mut self, value: u64, width: u32) {
        debug_assert!(width <= MAX_APPEND_BITS);
        if width == 0 {
            return;
        }

        self.staged = (self.staged << width) | (value & ((1u64 << width) - 1));
        self.staged_len += width;
        self.bit_len += width as usize;
        self.drain_staged();
    }

    /// Append `count` zero bits.
    pub fn append_zeros(&mut self, count: u64) {
        let mut left = count;
        while left > 0 {
            let step = left.min(u64::from(MAX_APPEND_BITS) - 8);
            self.append_value(0, step as u32);
            left -= step;
        }
    }

    /// Append `n` as a unary codeword: `n` zeros closed by a one.
    pub fn append_unary(&mut self, n: u64) {
        self.append_zeros(n);
        self.append_bit(true);
    }

    /// Append all bits of `other`.
    pub fn append_buffer(&mut self, other: &BitBuffer) {
        if self.staged_len == 0 {
            self.bytes.extend_from_slice(&other.bytes);
            self.bit_len += other.bytes.len() * 8;
        } else {
            for &byte in &other.bytes {
                self.append_value(u64::from(byte), 8);
            }
        }
        self.append_value(other.staged, other.staged_len);
    }

    /// The trailing partial byte, left-aligned and zero-filled.
    fn tail_byte(&self) -> Option<u8> {
        (self.staged_len > 0).then(|| (self.staged << (8 - self.staged_len)) as u8)
    }

    /// Copy out the written bits as bytes, zero-padding the last one.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity((self.bit_len + 7) / 8);
        out.extend_from_slice(&self.bytes);
        out.extend(self.tail_byte());
        out
    }

    /// Like [`to_bytes`](Self::to_bytes), without the copy.
    pub fn into_bytes(mut self) -> Vec<u8> {
        if let Some(tail) = self.tail_byte() {
            self.bytes.push(tail);
        }
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer() {
        let buf = BitBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.to_bytes(), Vec::<u8>::new());
        assert_eq!(buf.into_bytes(), Vec::<u8>::new());
    }

    #[test]
    fn test_capacity_hint() {
        assert_eq!(BitBuffer::new().bytes.capacity(), 0);

        // One 64-sample block of 32-bit raw values plus its identifier.
        let mut buf = BitBuffer::with_capacity_bits(5 + 64 * 32);
        let reserved = buf.bytes.capacity();
        assert!(reserved >= 256);
        buf.append_value(0b11111, 5);
        for _ in 0..64 {
            buf.append_value(0xFFFF_FFFF, 32);
        }
        assert_eq!(buf.len(), 5 + 64 * 32);
        assert_eq!(buf.bytes.capacity(), reserved);
    }

    #[test]
    fn test_bits_fill_msb_first() {
        let mut buf = BitBuffer::new();
        // 0110 1001
        for bit in [false, true, true, false, true, false, false, true] {
            buf.append_bit(bit);
        }
        assert_eq!(buf.len(), 8);
        assert_eq!(buf.to_bytes(), [0x69]);
    }

    #[test]
    fn test_mixed_widths_share_a_byte() {
        let mut buf = BitBuffer::new();
        buf.append_value(0b101, 3);
        buf.append_bit(true);
        buf.append_value(0x3, 4);
        assert_eq!(buf.to_bytes(), [0xB3]);
    }

    #[test]
    fn test_value_is_truncated_to_width() {
        let mut buf = BitBuffer::new();
        buf.append_value(0x1234_5679, 3);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.to_bytes(), [0b0010_0000]);
    }

    #[test]
    fn test_zero_width_is_noop() {
        let mut buf = BitBuffer::new();
        buf.append_value(u64::MAX, 0);
        buf.append_zeros(0);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_wide_value_after_odd_offset() {
        let mut buf = BitBuffer::new();
        buf.append_value(0, 3);
        buf.append_value(0xCAFE_F00D, 32);
        assert_eq!(buf.len(), 35);
        // 000 | CAFEF00D, then 5 pad bits
        assert_eq!(buf.to_bytes(), [0x19, 0x5F, 0xDE, 0x01, 0xA0]);
    }

    #[test]
    fn test_unary_codewords() {
        let mut buf = BitBuffer::new();
        buf.append_unary(2); // 001
        buf.append_unary(0); // 1
        buf.append_unary(1); // 01
        buf.append_unary(4); // 00001
        assert_eq!(buf.len(), 11);
        assert_eq!(buf.to_bytes(), [0b0011_0100, 0b0010_0000]);
    }

    #[test]
    fn test_unary_longer_than_staging_word() {
        let mut buf = BitBuffer::new();
        buf.append_bit(true);
        buf.append_unary(100);
        assert_eq!(buf.len(), 102);

        let bytes = buf.into_bytes();
        assert_eq!(bytes.len(), 13);
        assert_eq!(bytes[0], 0x80);
        assert!(bytes[1..12].iter().all(|&b| b == 0));
        // Terminator is bit 101: byte 12, offset 5.
        assert_eq!(bytes[12], 0b0000_0100);
    }

    #[test]
    fn test_append_buffer_onto_byte_boundary() {
        let mut head = BitBuffer::new();
        head.append_value(0x5A, 8);
        head.append_value(0x0F, 8);

        let mut tail = BitBuffer::new();
        tail.append_value(0x81, 8);
        tail.append_value(0b11, 2);

        head.append_buffer(&tail);
        assert_eq!(head.len(), 26);
        assert_eq!(head.to_bytes(), [0x5A, 0x0F, 0x81, 0xC0]);
    }

    #[test]
    fn test_append_buffer_mid_byte() {
        let mut head = BitBuffer::new();
        head.append_value(0b0101, 4);

        let mut tail = BitBuffer::new();
        tail.append_value(0xFF, 8);
        tail.append_bit(false);
        tail.append_bit(true);

        head.append_buffer(&tail);
        assert_eq!(head.len(), 14);
        // 0101 1111 | 1111 01..
        assert_eq!(head.to_bytes(), [0x5F, 0xF4]);
    }

    #[test]
    fn test_append_empty_buffer() {
        let mut head = BitBuffer::new();
        head.append_value(0b111, 3);
        head.append_buffer(&BitBuffer::new());
        assert_eq!(head.len(), 3);
        assert_eq!(head.to_bytes(), [0xE0]);
    }

    #[test]
    fn test_to_bytes_leaves_buffer_usable() {
        let mut buf = BitBuffer::new();
        buf.append_value(0b1, 1);
        assert_eq!(buf.to_bytes(), [0x80]);

        buf.append_value(0b1000_0001, 8);
        assert_eq!(buf.len(), 9);
        assert_eq!(buf.to_bytes(), [0xC0, 0x80]);
    }
}
