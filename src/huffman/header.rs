// Code table header: serialization and parsing.
//
// Layout (all fields MSB-first):
//
//   [header length: 16 bits]
//   [symbol: S bits][code length: 4 bits][code: L bits]   (repeated, canonical order)
//
// The length field counts the entry bits only, not itself. S defaults to 8
// and is configurable through `HeaderFormat`; it is not stored in the stream,
// so encoder and decoder must agree on it.

use super::Symbol;
use super::bitstream::{BitReader, Bits};
use super::decoder::DecodeError;
use super::encoder::EncodeError;
use super::table::{Code, CodeTable, MAX_CODE_LEN};

/// Width of the leading header length field.
pub const HEADER_LEN_BITS: u8 = 16;
/// Width of each entry's code length field.
pub const CODE_LEN_BITS: u8 = 4;
/// Default symbol field width (one byte per symbol).
pub const DEFAULT_SYMBOL_BITS: u8 = 8;
/// Widest supported symbol field.
pub const MAX_SYMBOL_BITS: u8 = 16;

/// Largest entry area the 16-bit length field can describe.
const MAX_HEADER_BITS: usize = u16::MAX as usize;

/// Header field widths shared by encoder and decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeaderFormat {
    symbol_bits: u8,
}

impl Default for HeaderFormat {
    fn default() -> Self {
        Self {
            symbol_bits: DEFAULT_SYMBOL_BITS,
        }
    }
}

impl HeaderFormat {
    /// Header format with a `symbol_bits`-wide symbol field (1..=16).
    pub fn new(symbol_bits: u8) -> Result<Self, EncodeError> {
        if symbol_bits == 0 || symbol_bits > MAX_SYMBOL_BITS {
            return Err(EncodeError::InvalidSymbolWidth(symbol_bits));
        }
        Ok(Self { symbol_bits })
    }

    pub fn symbol_bits(self) -> u8 {
        self.symbol_bits
    }

    /// Largest symbol value the symbol field can hold.
    pub fn max_symbol(self) -> u32 {
        (1u32 << self.symbol_bits) - 1
    }

    /// Serialized size of one entry.
    pub fn entry_bits(self, code: Code) -> usize {
        self.symbol_bits as usize + CODE_LEN_BITS as usize + code.len() as usize
    }

    /// Serialized size of the whole header, including the length field.
    pub fn header_bits(self, table: &CodeTable) -> usize {
        HEADER_LEN_BITS as usize + table.iter().map(|(_, c)| self.entry_bits(c)).sum::<usize>()
    }

    /// Append the header for `table` to `out`. Returns the number of bits
    /// written.
    pub fn write(self, table: &CodeTable, out: &mut Bits) -> Result<usize, EncodeError> {
        let entry_bits = self.header_bits(table) - HEADER_LEN_BITS as usize;
        if entry_bits > MAX_HEADER_BITS {
            return Err(EncodeError::HeaderTooLarge { bits: entry_bits });
        }

        for (symbol, code) in table.iter() {
            if symbol as u32 > self.max_symbol() {
                return Err(EncodeError::SymbolOutOfRange {
                    symbol,
                    bits: self.symbol_bits,
                });
            }
            if code.len() > MAX_CODE_LEN {
                return Err(EncodeError::CodeTooLong {
                    symbol,
                    len: code.len() as usize,
                    max: MAX_CODE_LEN,
                });
            }
        }

        out.push_value(entry_bits as u32, HEADER_LEN_BITS);
        for (symbol, code) in table.iter() {
            out.push_value(symbol as u32, self.symbol_bits);
            out.push_value(code.len() as u32, CODE_LEN_BITS);
            code.write_to(out);
        }
        Ok(HEADER_LEN_BITS as usize + entry_bits)
    }

    /// Parse a header from `reader`, leaving it positioned at the payload.
    ///
    /// Only the framing is checked here; whether the parsed codes are
    /// prefix-free is up to the caller (`StreamDecoder` validates).
    pub fn read(self, reader: &mut BitReader<'_>) -> Result<CodeTable, DecodeError> {
        let declared = reader
            .read_value(HEADER_LEN_BITS)
            .ok_or_else(|| malformed("stream is shorter than the header length field"))?
            as usize;
        if declared > reader.remaining() {
            return Err(malformed(format!(
                "header declares {declared} bits but only {} remain",
                reader.remaining()
            )));
        }
        if declared == 0 {
            return Err(malformed("header declares no symbols"));
        }

        let end = reader.position() + declared;
        let fixed = self.symbol_bits as usize + CODE_LEN_BITS as usize;
        let mut entries = Vec::new();
        while reader.position() < end {
            let left = end - reader.position();
            if left < fixed {
                return Err(malformed(format!(
                    "{left} trailing header bits do not form an entry"
                )));
            }
            let symbol = reader
                .read_value(self.symbol_bits)
                .ok_or_else(|| malformed("truncated symbol field"))?;
            let len = reader
                .read_value(CODE_LEN_BITS)
                .ok_or_else(|| malformed("truncated code length field"))? as u8;
            if len == 0 {
                return Err(malformed(format!("symbol {symbol} has a zero-length code")));
            }
            if (end - reader.position()) < len as usize {
                return Err(malformed(format!(
                    "code for symbol {symbol} runs past the end of the header"
                )));
            }
            let bits = reader
                .read_value(len)
                .ok_or_else(|| malformed("truncated code bits"))?;
            let code = Code::new(bits as u16, len)
                .ok_or_else(|| malformed(format!("invalid code for symbol {symbol}")))?;
            entries.push((symbol as Symbol, code));
        }

        Ok(CodeTable::from_entries(entries))
    }
}

fn malformed(msg: impl Into<String>) -> DecodeError {
    DecodeError::MalformedHeader(msg.into())
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

    fn roundtrip(format: HeaderFormat, table: &CodeTable) -> CodeTable {
        let mut bits = Bits::new();
        let written = format.write(table, &mut bits).unwrap();
        assert_eq!(written, bits.len());
        assert_eq!(written, format.header_bits(table));
        let mut reader = BitReader::new(&bits);
        let parsed = format.read(&mut reader).unwrap();
        assert_eq!(reader.remaining(), 0);
        parsed
    }

    #[test]
    fn layout_of_single_entry() {
        let table = CodeTable::from_entries(vec![(b'a' as Symbol, code("0"))]);
        let mut bits = Bits::new();
        HeaderFormat::default().write(&table, &mut bits).unwrap();
        // 13 entry bits: 'a' (01100001), length 1 (0001), code 0.
        assert_eq!(bits.to_string(), "0000000000001101".to_owned() + "01100001" + "0001" + "0");
    }

    #[test]
    fn full_byte_range_and_all_lengths() {
        // Symbol i gets a code of length (i % 15) + 1 holding the low bits of
        // i. The header does not care whether codes are prefix-free.
        let entries: Vec<(Symbol, Code)> = (0u16..=255)
            .map(|i| {
                let len = (i % 15) as u8 + 1;
                let mask = (1u16 << len) - 1;
                (i, Code::new(i & mask, len).unwrap())
            })
            .collect();
        let table = CodeTable::from_entries(entries);
        assert_eq!(table.len(), 256);
        assert_eq!(table.max_code_len(), 15);
        assert_eq!(roundtrip(HeaderFormat::default(), &table), table);
    }

    #[test]
    fn prefix_free_table_with_lengths_one_to_fifteen() {
        // Unary ladder "1", "01", ..., "000000000000001" plus all zeros.
        let entries: Vec<(Symbol, Code)> = (1u8..=15)
            .map(|len| ((len as Symbol) * 17, Code::new(1, len).unwrap()))
            .chain(std::iter::once((0, Code::new(0, 15).unwrap())))
            .collect();
        let table = CodeTable::from_entries(entries);
        assert!(table.validate().is_ok());
        assert_eq!(roundtrip(HeaderFormat::default(), &table), table);
    }

    #[test]
    fn wide_symbols() {
        let format = HeaderFormat::new(12).unwrap();
        let table = CodeTable::from_entries(vec![(4095, code("0")), (1000, code("1"))]);
        assert_eq!(roundtrip(format, &table), table);

        let narrow = HeaderFormat::new(7).unwrap();
        let mut bits = Bits::new();
        assert!(matches!(
            narrow.write(&table, &mut bits),
            Err(EncodeError::SymbolOutOfRange { bits: 7, .. })
        ));
    }

    #[test]
    fn invalid_widths() {
        assert!(HeaderFormat::new(0).is_err());
        assert!(HeaderFormat::new(17).is_err());
        assert_eq!(HeaderFormat::new(16).unwrap().max_symbol(), 0xFFFF);
    }

    #[test]
    fn rejects_declared_length_past_end() {
        let bits: Bits = "0000000001000000".parse().unwrap();
        let err = HeaderFormat::default().read(&mut BitReader::new(&bits)).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedHeader(_)));
    }

    #[test]
    fn rejects_partial_entry() {
        // Declares 10 bits, fewer than one 12-bit entry prefix.
        let mut bits: Bits = "0000000000001010".parse().unwrap();
        bits.push_value(0, 10);
        let err = HeaderFormat::default().read(&mut BitReader::new(&bits)).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedHeader(_)));
    }

    #[test]
    fn rejects_zero_length_code_and_empty_header() {
        let mut bits: Bits = "0000000000001100".parse().unwrap();
        bits.push_value(b'a' as u32, 8);
        bits.push_value(0, 4);
        assert!(HeaderFormat::default().read(&mut BitReader::new(&bits)).is_err());

        let empty: Bits = "0000000000000000".parse().unwrap();
        assert!(HeaderFormat::default().read(&mut BitReader::new(&empty)).is_err());

        let short: Bits = "0000".parse().unwrap();
        assert!(HeaderFormat::default().read(&mut BitReader::new(&short)).is_err());
    }

    #[test]
    fn rejects_code_running_past_header() {
        // Declares 13 bits but the entry claims a 3-bit code.
        let mut bits: Bits = "0000000000001101".parse().unwrap();
        bits.push_value(b'a' as u32, 8);
        bits.push_value(3, 4);
        bits.push_value(0b101, 3);
        let err = HeaderFormat::default().read(&mut BitReader::new(&bits)).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedHeader(_)));
    }

    #[test]
    fn long_codes_rejected_on_write() {
        let table = CodeTable::from_entries(vec![(1, Code::new(0, 16).unwrap())]);
        let mut bits = Bits::new();
        assert!(matches!(
            HeaderFormat::default().write(&table, &mut bits),
            Err(EncodeError::CodeTooLong { len: 16, .. })
        ));
    }
}
