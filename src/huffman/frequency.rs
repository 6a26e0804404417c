// Symbol frequency counting.
//
// Natural mode counts the symbols of a message directly. Realigned mode first
// cuts a bit string (typically the output of another encoder) into 7-bit
// groups and counts those, so a second pass can squeeze that output.

use std::collections::BTreeMap;

use super::Symbol;
use super::bitstream::Bits;

/// Width of a symbol in realigned mode.
pub const REALIGN_WIDTH: u8 = 7;

/// Occurrence counts per symbol. Iteration is in ascending symbol order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<Symbol, u64>,
    total: u64,
}

impl FrequencyTable {
    /// Count the symbols of a message.
    pub fn from_symbols(symbols: &[Symbol]) -> Self {
        let mut table = Self::default();
        for &symbol in symbols {
            *table.counts.entry(symbol).or_insert(0) += 1;
        }
        table.total = symbols.len() as u64;
        table
    }

    /// Count the bytes of a message, one symbol per byte.
    pub fn from_bytes(message: &[u8]) -> Self {
        let mut counts = [0u64; 256];
        for &b in message {
            counts[b as usize] += 1;
        }
        let counts = counts
            .iter()
            .enumerate()
            .filter(|&(_, &n)| n > 0)
            .map(|(b, &n)| (b as Symbol, n))
            .collect();
        Self {
            counts,
            total: message.len() as u64,
        }
    }

    /// Count the 7-bit groups of a bit string (see `realign`).
    pub fn realigned(bits: &Bits) -> Self {
        Self::from_symbols(&realign(bits))
    }

    /// Weight of `symbol` (0 if absent).
    pub fn get(&self, symbol: Symbol) -> u64 {
        self.counts.get(&symbol).copied().unwrap_or(0)
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all weights, i.e. the message length in symbols.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// `(symbol, weight)` pairs in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, u64)> + '_ {
        self.counts.iter().map(|(&s, &n)| (s, n))
    }
}

/// Cut a bit string into `REALIGN_WIDTH`-bit symbols, MSB first.
///
/// A trailing group shorter than the width is left-aligned and zero-filled,
/// so `"1"` becomes `0b1000000`.
pub fn realign(bits: &Bits) -> Vec<Symbol> {
    let width = REALIGN_WIDTH as usize;
    let mut symbols = Vec::with_capacity(bits.len().div_ceil(width));
    let mut iter = bits.iter().peekable();
    while iter.peek().is_some() {
        let mut value: Symbol = 0;
        for _ in 0..width {
            value = (value << 1) | iter.next().unwrap_or(false) as Symbol;
        }
        symbols.push(value);
    }
    symbols
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_bytes() {
        let freq = FrequencyTable::from_bytes(b"abbccc");
        assert_eq!(freq.len(), 3);
        assert_eq!(freq.get(b'a' as Symbol), 1);
        assert_eq!(freq.get(b'b' as Symbol), 2);
        assert_eq!(freq.get(b'c' as Symbol), 3);
        assert_eq!(freq.get(b'd' as Symbol), 0);
        assert_eq!(freq.total(), 6);
    }

    #[test]
    fn weights_sum_to_length() {
        let msg = b"the quick brown fox jumps over the lazy dog";
        let freq = FrequencyTable::from_bytes(msg);
        assert_eq!(freq.iter().map(|(_, n)| n).sum::<u64>(), msg.len() as u64);
        assert!(freq.iter().all(|(_, n)| n >= 1));
    }

    #[test]
    fn symbols_and_bytes_agree() {
        let msg = b"mississippi";
        let symbols: Vec<Symbol> = msg.iter().map(|&b| b as Symbol).collect();
        assert_eq!(FrequencyTable::from_bytes(msg), FrequencyTable::from_symbols(&symbols));
    }

    #[test]
    fn iteration_is_ascending() {
        let freq = FrequencyTable::from_bytes(b"zyxzyx");
        let order: Vec<Symbol> = freq.iter().map(|(s, _)| s).collect();
        assert_eq!(order, vec![b'x' as Symbol, b'y' as Symbol, b'z' as Symbol]);
    }

    #[test]
    fn empty_message() {
        let freq = FrequencyTable::from_bytes(b"");
        assert!(freq.is_empty());
        assert_eq!(freq.total(), 0);
    }

    #[test]
    fn realign_groups_of_seven() {
        let bits: Bits = "1000001".repeat(3).parse().unwrap();
        assert_eq!(realign(&bits), vec![0x41, 0x41, 0x41]);

        let freq = FrequencyTable::realigned(&bits);
        assert_eq!(freq.len(), 1);
        assert_eq!(freq.get(0x41), 3);
    }

    #[test]
    fn realign_left_aligns_short_tail() {
        let bits: Bits = "00000011".parse().unwrap();
        assert_eq!(realign(&bits), vec![0b0000001, 0b1000000]);
        assert!(realign(&Bits::new()).is_empty());
    }
}
