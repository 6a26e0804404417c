// Code table: the symbol -> code mapping shared by encoder and decoder.
//
// Entries are kept in canonical order (code length ascending, then symbol
// ascending). The order has no effect on decoding; it only makes the
// serialized header reproducible for identical input.

use std::collections::{HashMap, HashSet};
use std::fmt;

use super::Symbol;
use super::bitstream::Bits;

/// Longest code the header's 4-bit length field can describe.
pub const MAX_CODE_LEN: u8 = 15;

// ---------------------------------------------------------------------------
// Code
// ---------------------------------------------------------------------------

/// A single prefix code: the low `len` bits of `bits`, most significant first.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code {
    bits: u16,
    len: u8,
}

impl Code {
    /// The empty code, used as the starting point when accumulating bits.
    pub const EMPTY: Code = Code { bits: 0, len: 0 };

    /// The one-bit code `"0"`.
    pub const ZERO: Code = Code { bits: 0, len: 1 };

    /// Build a code from its value and length. Returns `None` if `len`
    /// exceeds 16 or `bits` has set bits above `len`.
    pub fn new(bits: u16, len: u8) -> Option<Self> {
        if len > 16 || (len < 16 && bits >> len != 0) {
            return None;
        }
        Some(Self { bits, len })
    }

    #[inline]
    pub fn bits(self) -> u16 {
        self.bits
    }

    #[inline]
    pub fn len(self) -> u8 {
        self.len
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Leading (first transmitted) bit. `None` for the empty code.
    pub fn first_bit(self) -> Option<bool> {
        if self.len == 0 {
            return None;
        }
        Some((self.bits >> (self.len - 1)) & 1 != 0)
    }

    /// Extend the code by one trailing bit. Returns `None` past 16 bits.
    #[inline]
    pub fn push(self, bit: bool) -> Option<Self> {
        if self.len >= 16 {
            return None;
        }
        Some(Self {
            bits: (self.bits << 1) | bit as u16,
            len: self.len + 1,
        })
    }

    /// The same code with its leading bit complemented.
    pub fn with_leading_flipped(self) -> Self {
        if self.len == 0 {
            return self;
        }
        Self {
            bits: self.bits ^ (1 << (self.len - 1)),
            len: self.len,
        }
    }

    /// Whether `self` is a prefix of `other` (a code is a prefix of itself).
    pub fn is_prefix_of(self, other: Code) -> bool {
        if self.len == 0 {
            return true;
        }
        self.len <= other.len && other.bits >> (other.len - self.len) == self.bits
    }

    /// Append the code's bits to a bit string.
    pub fn write_to(self, out: &mut Bits) {
        out.push_value(self.bits as u32, self.len);
    }

    /// Code bits left-aligned in 16 bits, for lexicographic ordering.
    fn aligned(self) -> u16 {
        if self.len == 0 { 0 } else { self.bits << (16 - self.len) }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for shift in (0..self.len).rev() {
            f.write_str(if (self.bits >> shift) & 1 != 0 { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code({self})")
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Structural problems found by `CodeTable::validate`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("code table is empty")]
    Empty,
    #[error("symbol {0} has an empty code")]
    EmptyCode(Symbol),
    #[error("symbol {0} appears more than once")]
    DuplicateSymbol(Symbol),
    #[error("code {prefix} is a prefix of code {code}")]
    NotPrefixFree { prefix: Code, code: Code },
}

// ---------------------------------------------------------------------------
// CodeTable
// ---------------------------------------------------------------------------

/// Mapping from symbol to prefix code, in canonical order.
#[derive(Clone, PartialEq, Eq)]
pub struct CodeTable {
    entries: Vec<(Symbol, Code)>,
    index: HashMap<Symbol, Code>,
}

impl CodeTable {
    /// Build a table from arbitrary `(symbol, code)` pairs, sorting them into
    /// canonical order. No validation is performed; see `validate()`.
    pub fn from_entries(mut entries: Vec<(Symbol, Code)>) -> Self {
        entries.sort_by_key(|&(symbol, code)| (code.len(), symbol));
        let index = entries.iter().copied().collect();
        Self { entries, index }
    }

    /// Entries in canonical order.
    pub fn entries(&self) -> &[(Symbol, Code)] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, Code)> + '_ {
        self.entries.iter().copied()
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Code assigned to `symbol`.
    pub fn get(&self, symbol: Symbol) -> Option<Code> {
        self.index.get(&symbol).copied()
    }

    /// Length of the longest code (0 for an empty table).
    pub fn max_code_len(&self) -> u8 {
        self.entries.iter().map(|(_, c)| c.len()).max().unwrap_or(0)
    }

    /// Check the table invariants: non-empty, one entry per symbol, no empty
    /// codes, and no code a prefix of another (which also rules out
    /// duplicate codes).
    pub fn validate(&self) -> Result<(), TableError> {
        if self.entries.is_empty() {
            return Err(TableError::Empty);
        }
        let mut seen = HashSet::with_capacity(self.entries.len());
        for &(symbol, code) in &self.entries {
            if code.is_empty() {
                return Err(TableError::EmptyCode(symbol));
            }
            if !seen.insert(symbol) {
                return Err(TableError::DuplicateSymbol(symbol));
            }
        }

        // In lexicographic order, any prefix relation shows up between
        // neighbours.
        let mut codes: Vec<Code> = self.entries.iter().map(|&(_, c)| c).collect();
        codes.sort_by_key(|c| (c.aligned(), c.len()));
        for pair in codes.windows(2) {
            if pair[0].is_prefix_of(pair[1]) {
                return Err(TableError::NotPrefixFree {
                    prefix: pair[0],
                    code: pair[1],
                });
            }
        }
        Ok(())
    }

    /// Choose `n` filler bits (n < 8 in practice) that no code is a prefix
    /// of, so that appending them after a whole number of codes cannot add a
    /// symbol. Returns the lexicographically smallest such string, or `None`
    /// when the table is complete down to depth `n`.
    pub fn filler(&self, n: usize) -> Option<Bits> {
        let depth = n.min(16) as u8;
        let path = self.uncovered(Code::EMPTY, depth)?;
        let mut bits = Bits::with_capacity(n);
        path.write_to(&mut bits);
        while bits.len() < n {
            bits.push(false);
        }
        Some(bits)
    }

    /// Depth-first search for a `depth`-bit path that does not run through a
    /// code. Trie branches no code continues into are filled with zeros.
    fn uncovered(&self, path: Code, depth: u8) -> Option<Code> {
        if self.index.values().any(|&c| c == path) {
            return None;
        }
        if path.len() >= depth {
            return Some(path);
        }
        if !self.entries.iter().any(|&(_, c)| path.is_prefix_of(c)) {
            let mut filled = path;
            while filled.len() < depth {
                filled = filled.push(false)?;
            }
            return Some(filled);
        }
        [false, true]
            .into_iter()
            .find_map(|bit| self.uncovered(path.push(bit)?, depth))
    }
}

impl fmt::Debug for CodeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(s, c)| (s, c)))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> Code {
        s.chars().fold(Code::EMPTY, |c, ch| c.push(ch == '1').unwrap())
    }

    #[test]
    fn code_basics() {
        let c = code("0110");
        assert_eq!(c.len(), 4);
        assert_eq!(c.bits(), 0b0110);
        assert_eq!(c.to_string(), "0110");
        assert_eq!(c.first_bit(), Some(false));
        assert_eq!(c.with_leading_flipped().to_string(), "1110");
        assert_eq!(Code::EMPTY.first_bit(), None);
    }

    #[test]
    fn code_new_rejects_stray_bits() {
        assert!(Code::new(0b100, 2).is_none());
        assert!(Code::new(0, 17).is_none());
        assert_eq!(Code::new(0xFFFF, 16).unwrap().len(), 16);
    }

    #[test]
    fn code_prefix() {
        assert!(code("01").is_prefix_of(code("011")));
        assert!(code("01").is_prefix_of(code("01")));
        assert!(!code("01").is_prefix_of(code("001")));
        assert!(!code("011").is_prefix_of(code("01")));
    }

    #[test]
    fn canonical_order() {
        let table = CodeTable::from_entries(vec![
            (b'c' as Symbol, code("11")),
            (b'a' as Symbol, code("10")),
            (b'z' as Symbol, code("0")),
        ]);
        let order: Vec<Symbol> = table.iter().map(|(s, _)| s).collect();
        assert_eq!(order, vec![b'z' as Symbol, b'a' as Symbol, b'c' as Symbol]);
        assert_eq!(table.get(b'a' as Symbol), Some(code("10")));
        assert_eq!(table.max_code_len(), 2);
        assert!(table.validate().is_ok());
    }

    #[test]
    fn validate_catches_prefix_collisions() {
        let table = CodeTable::from_entries(vec![(1, code("10")), (2, code("101")), (3, code("0"))]);
        assert_eq!(
            table.validate(),
            Err(TableError::NotPrefixFree {
                prefix: code("10"),
                code: code("101"),
            })
        );

        let dup = CodeTable::from_entries(vec![(1, code("1")), (2, code("1"))]);
        assert!(matches!(dup.validate(), Err(TableError::NotPrefixFree { .. })));

        let twice = CodeTable::from_entries(vec![(1, code("1")), (1, code("0"))]);
        assert_eq!(twice.validate(), Err(TableError::DuplicateSymbol(1)));

        assert_eq!(CodeTable::from_entries(vec![]).validate(), Err(TableError::Empty));
    }

    #[test]
    fn filler_uses_prefix_of_longest_code() {
        let table = CodeTable::from_entries(vec![
            (1, code("0")),
            (2, code("10")),
            (3, code("110")),
            (4, code("111")),
        ]);
        assert_eq!(table.filler(2).unwrap().to_string(), "11");
        assert!(table.filler(0).unwrap().is_empty());
    }

    #[test]
    fn filler_uses_unused_branch() {
        let single = CodeTable::from_entries(vec![(7, code("0"))]);
        assert_eq!(single.filler(5).unwrap().to_string(), "10000");

        // Every code starts with 1 (a reserved 0 branch).
        let guarded = CodeTable::from_entries(vec![(1, code("10")), (2, code("11"))]);
        assert_eq!(guarded.filler(6).unwrap().to_string(), "000000");

        // A hole deep in the tree.
        let deep = CodeTable::from_entries(vec![(1, code("0")), (2, code("10")), (3, code("110"))]);
        assert_eq!(deep.filler(5).unwrap().to_string(), "11100");
    }

    #[test]
    fn filler_none_for_complete_short_tables() {
        let table = CodeTable::from_entries(vec![(1, code("0")), (2, code("1"))]);
        assert_eq!(table.filler(3), None);
        assert!(table.filler(0).unwrap().is_empty());
    }
}
