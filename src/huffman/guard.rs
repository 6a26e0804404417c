// Reserved-prefix guard.
//
// A caller can reserve a bit prefix so that no generated code begins with it,
// which keeps this codec's output distinguishable from a sibling encoding that
// uses the prefix as a framing marker.
//
// The reservation is structural. The tree builder adds a reserved leaf whose
// weight exceeds the sum of all real weights. Such a leaf is never one of the
// two lightest nodes while three or more remain, so it is merged last and sits
// directly under the root. Once codes are assigned, the root is mirrored if
// needed so that the reserved leaf's single-bit code equals the prefix's first
// bit; every real code then starts with the opposite bit and can never begin
// with the prefix. Mirroring complements the leading bit of every code, which
// keeps the table prefix-free.

use std::fmt;
use std::str::FromStr;

use super::bitstream::{Bits, BitsError};
use super::table::Code;

/// Error returned when parsing a reserved prefix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrefixError {
    #[error("reserved prefix must not be empty")]
    Empty,
    #[error(transparent)]
    Bits(#[from] BitsError),
}

/// A non-empty bit prefix that generated codes must avoid.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ReservedPrefix(Bits);

impl ReservedPrefix {
    pub fn new(bits: Bits) -> Result<Self, PrefixError> {
        if bits.is_empty() {
            return Err(PrefixError::Empty);
        }
        Ok(Self(bits))
    }

    pub fn bits(&self) -> &Bits {
        &self.0
    }

    /// First bit of the prefix. The reserved leaf takes this branch.
    pub fn first_bit(&self) -> bool {
        self.0.get(0).unwrap_or(false)
    }

    /// Whether `code` begins with this prefix.
    pub fn is_prefix_of(&self, code: Code) -> bool {
        let mut bits = Bits::with_capacity(code.len() as usize);
        code.write_to(&mut bits);
        self.0.is_prefix_of(&bits)
    }
}

impl FromStr for ReservedPrefix {
    type Err = PrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.parse()?)
    }
}

impl fmt::Display for ReservedPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for ReservedPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReservedPrefix({})", self.0)
    }
}

/// Weight for the reserved leaf: strictly above the sum of all real weights.
pub(crate) fn reserved_weight(total: u64) -> u64 {
    total.saturating_add(1)
}

/// Orient real codes away from the prefix.
///
/// `reserved` is the code the tree builder gave the reserved leaf (always one
/// bit). If it does not already match the prefix's first bit, every real code
/// has its leading bit complemented.
pub(crate) fn orient<S>(prefix: &ReservedPrefix, reserved: Code, codes: &mut [(S, Code)]) {
    debug_assert_eq!(reserved.len(), 1, "reserved leaf must sit under the root");
    if reserved.first_bit() == Some(prefix.first_bit()) {
        return;
    }
    for (_, code) in codes.iter_mut() {
        *code = code.with_leading_flipped();
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
    fn parse_prefix() {
        let p: ReservedPrefix = "110".parse().unwrap();
        assert!(p.first_bit());
        assert_eq!(p.to_string(), "110");
        assert_eq!("".parse::<ReservedPrefix>(), Err(PrefixError::Empty));
        assert!(matches!("12".parse::<ReservedPrefix>(), Err(PrefixError::Bits(_))));
    }

    #[test]
    fn prefix_matching() {
        let p: ReservedPrefix = "11".parse().unwrap();
        assert!(p.is_prefix_of(code("11")));
        assert!(p.is_prefix_of(code("110")));
        assert!(!p.is_prefix_of(code("1")));
        assert!(!p.is_prefix_of(code("101")));
    }

    #[test]
    fn orient_mirrors_when_reserved_leaf_is_on_the_wrong_side() {
        let p: ReservedPrefix = "0".parse().unwrap();
        let mut codes = vec![(1u16, code("0")), (2u16, code("10"))];
        // Reserved leaf got "1", prefix wants "0": mirror.
        orient(&p, code("1"), &mut codes);
        assert_eq!(codes, vec![(1, code("1")), (2, code("00"))]);
    }

    #[test]
    fn orient_keeps_codes_when_already_aligned() {
        let p: ReservedPrefix = "10".parse().unwrap();
        let mut codes = vec![(1u16, code("00")), (2u16, code("01"))];
        orient(&p, code("1"), &mut codes);
        assert_eq!(codes, vec![(1, code("00")), (2, code("01"))]);
    }

    #[test]
    fn reserved_weight_dominates() {
        assert_eq!(reserved_weight(10), 11);
        assert_eq!(reserved_weight(u64::MAX), u64::MAX);
    }
}
