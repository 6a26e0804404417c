// Bit-level buffers for the Huffman stream format.
//
// Everything in the format is MSB-first: the 16-bit header length, the
// symbol and length fields of each header entry, and the code bits
// themselves. `Bits` is an owned, growable bit string; `BitReader` walks one
// without copying.

use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error returned when parsing a textual bit string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BitsError {
    #[error("invalid bit character {ch:?} at position {pos}")]
    InvalidChar { ch: char, pos: usize },
}

// ---------------------------------------------------------------------------
// Bits
// ---------------------------------------------------------------------------

/// An owned bit string, stored MSB-first in bytes.
///
/// Bits past `len` in the last byte are always zero, so `as_bytes()` is the
/// zero-padded byte form of the string.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Bits {
    bytes: Vec<u8>,
    len: usize,
}

impl Bits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bit string with room for `bits` bits.
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits.div_ceil(8)),
            len: 0,
        }
    }

    /// Expand bytes into a bit string of exactly `8 * bytes.len()` bits.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            len: bytes.len() * 8,
        }
    }

    /// Number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bit at `index`, or `None` past the end.
    #[inline]
    pub fn get(&self, index: usize) -> Option<bool> {
        if index >= self.len {
            return None;
        }
        Some(self.bytes[index / 8] & (0x80 >> (index % 8)) != 0)
    }

    /// Append one bit.
    #[inline]
    pub fn push(&mut self, bit: bool) {
        let offset = self.len % 8;
        if offset == 0 {
            self.bytes.push(0);
        }
        if bit {
            // A push after offset 0 always has a last byte.
            if let Some(last) = self.bytes.last_mut() {
                *last |= 0x80 >> offset;
            }
        }
        self.len += 1;
    }

    /// Append the low `width` bits of `value`, most significant first.
    pub fn push_value(&mut self, value: u32, width: u8) {
        debug_assert!(width <= 32);
        for shift in (0..width).rev() {
            self.push((value >> shift) & 1 != 0);
        }
    }

    /// Append another bit string.
    pub fn extend_from(&mut self, other: &Bits) {
        if self.len % 8 == 0 {
            self.bytes.truncate(self.len / 8);
            self.bytes.extend_from_slice(&other.bytes);
            self.len += other.len;
            return;
        }
        for bit in other.iter() {
            self.push(bit);
        }
    }

    /// Shorten to `len` bits. No-op if already shorter.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        self.len = len;
        self.bytes.truncate(len.div_ceil(8));
        let offset = len % 8;
        if offset != 0
            && let Some(last) = self.bytes.last_mut()
        {
            *last &= 0xFFu8 << (8 - offset);
        }
    }

    /// Iterate over the bits in order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.bytes[i / 8] & (0x80 >> (i % 8)) != 0)
    }

    /// Bytes backing the string, zero-padded in the last byte.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of bits needed to reach the next byte boundary (0..=7).
    #[inline]
    pub fn padding_to_byte(&self) -> usize {
        (8 - self.len % 8) % 8
    }

    /// Whether `self` is a prefix of `other` (a string is a prefix of itself).
    pub fn is_prefix_of(&self, other: &Bits) -> bool {
        self.len <= other.len && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl FromStr for Bits {
    type Err = BitsError;

    /// Parse a string of `'0'` and `'1'` characters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bits = Bits::with_capacity(s.len());
        for (pos, ch) in s.chars().enumerate() {
            match ch {
                '0' => bits.push(false),
                '1' => bits.push(true),
                _ => return Err(BitsError::InvalidChar { ch, pos }),
            }
        }
        Ok(bits)
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bits({}: {self})", self.len)
    }
}

impl FromIterator<bool> for Bits {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut bits = Bits::new();
        for bit in iter {
            bits.push(bit);
        }
        bits
    }
}

// ---------------------------------------------------------------------------
// BitReader
// ---------------------------------------------------------------------------

/// Cursor over a `Bits` value.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bits: &'a Bits,
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bits: &'a Bits) -> Self {
        Self { bits, pos: 0 }
    }

    /// Current bit offset from the start of the string.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bits left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.bits.len() - self.pos
    }

    #[inline]
    pub fn read_bit(&mut self) -> Option<bool> {
        let bit = self.bits.get(self.pos)?;
        self.pos += 1;
        Some(bit)
    }

    /// Read a `width`-bit big-endian field. Returns `None` (without
    /// consuming anything) if fewer than `width` bits remain.
    pub fn read_value(&mut self, width: u8) -> Option<u32> {
        debug_assert!(width <= 32);
        if self.remaining() < width as usize {
            return None;
        }
        let mut value = 0u32;
        for _ in 0..width {
            let bit = self.read_bit()?;
            value = (value << 1) | bit as u32;
        }
        Some(value)
    }

    /// Skip `n` bits (clamped to the end).
    pub fn skip(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.bits.len());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_get_msb_first() {
        let mut bits = Bits::new();
        bits.push_value(0b101, 3);
        bits.push_value(0b11, 2);
        assert_eq!(bits.len(), 5);
        assert_eq!(bits.as_bytes(), &[0b1011_1000]);
        assert_eq!(bits.to_string(), "10111");
        assert_eq!(bits.get(5), None);
    }

    #[test]
    fn parse_and_display() {
        let bits: Bits = "0100000101".parse().unwrap();
        assert_eq!(bits.len(), 10);
        assert_eq!(bits.to_string(), "0100000101");
        assert_eq!(bits.as_bytes(), &[0x41, 0x40]);
    }

    #[test]
    fn parse_rejects_other_characters() {
        let err = "01x1".parse::<Bits>().unwrap_err();
        assert_eq!(err, BitsError::InvalidChar { ch: 'x', pos: 2 });
    }

    #[test]
    fn from_bytes_is_eight_bits_per_byte() {
        let bits = Bits::from_bytes(&[0xA5, 0x01]);
        assert_eq!(bits.len(), 16);
        assert_eq!(bits.to_string(), "1010010100000001");
    }

    #[test]
    fn extend_aligned_and_unaligned() {
        let mut a = Bits::from_bytes(&[0xFF]);
        let b: Bits = "101".parse().unwrap();
        a.extend_from(&b);
        assert_eq!(a.to_string(), "11111111101");

        let mut c: Bits = "1".parse().unwrap();
        c.extend_from(&a);
        assert_eq!(c.to_string(), "111111111101");
        assert_eq!(c.len(), 12);
    }

    #[test]
    fn truncate_clears_tail_bits() {
        let mut bits = Bits::from_bytes(&[0xFF, 0xFF]);
        bits.truncate(11);
        assert_eq!(bits.len(), 11);
        assert_eq!(bits.as_bytes(), &[0xFF, 0b1110_0000]);
        assert_eq!(bits.padding_to_byte(), 5);
    }

    #[test]
    fn prefix_relation() {
        let a: Bits = "10".parse().unwrap();
        let b: Bits = "101".parse().unwrap();
        assert!(a.is_prefix_of(&b));
        assert!(a.is_prefix_of(&a));
        assert!(!b.is_prefix_of(&a));
    }

    #[test]
    fn reader_reads_fields() {
        let bits: Bits = "0000000000000011101".parse().unwrap();
        let mut r = BitReader::new(&bits);
        assert_eq!(r.read_value(16), Some(3));
        assert_eq!(r.remaining(), 3);
        assert_eq!(r.read_value(4), None);
        assert_eq!(r.position(), 16);
        assert_eq!(r.read_bit(), Some(true));
        r.skip(10);
        assert_eq!(r.remaining(), 0);
        assert_eq!(r.read_bit(), None);
    }
}
