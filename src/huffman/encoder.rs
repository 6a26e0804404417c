// Huffman stream encoder.
//
// `encode` runs the whole pipeline for one message: count symbols, build the
// code table (honouring a reserved prefix if one is configured), write the
// header, then substitute each symbol's code in message order. The result is
// an `EncodedStream`, which can be used as a bit string or padded to bytes.

use super::Symbol;
use super::bitstream::Bits;
use super::frequency::{self, FrequencyTable};
use super::guard::ReservedPrefix;
use super::header::HeaderFormat;
use super::table::{CodeTable, TableError};
use super::tree;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// The message has no symbols, so there is no tree to build.
    #[error("cannot build a code table for an empty message")]
    EmptyAlphabet,
    /// A code is longer than the header's 4-bit length field allows.
    #[error("code of {len} bits for symbol {symbol} exceeds the {max}-bit header limit")]
    CodeTooLong { symbol: Symbol, len: usize, max: u8 },
    #[error("symbol {symbol} does not fit in a {bits}-bit header field")]
    SymbolOutOfRange { symbol: Symbol, bits: u8 },
    #[error("header needs {bits} bits, more than the 16-bit length field can describe")]
    HeaderTooLarge { bits: usize },
    #[error("symbol width must be 1..=16 bits, got {0}")]
    InvalidSymbolWidth(u8),
    /// Encoding against a fixed table that has no code for this symbol.
    #[error("symbol {0} has no code in the table")]
    UnknownSymbol(Symbol),
    #[error("invalid code table: {0}")]
    InvalidTable(#[from] TableError),
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for the encoder.
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    /// Bit prefix that no generated code may start with.
    pub reserved_prefix: Option<ReservedPrefix>,
    /// Header field widths.
    pub header: HeaderFormat,
    /// Keep one code path unused so that byte padding never decodes as a
    /// symbol. Costs about one bit per occurrence of the rarest symbol.
    pub padding_escape: bool,
}

impl EncodeOptions {
    /// Options for streams that will be byte-framed (files, sockets).
    pub fn byte_framed() -> Self {
        Self {
            padding_escape: true,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// EncodedStream
// ---------------------------------------------------------------------------

/// A self-describing encoded message: header followed by packed codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedStream {
    bits: Bits,
    table: CodeTable,
    header_bits: usize,
    symbols: usize,
}

impl EncodedStream {
    /// Header and payload, unpadded.
    pub fn bits(&self) -> &Bits {
        &self.bits
    }

    pub fn into_bits(self) -> Bits {
        self.bits
    }

    /// Code table carried in the header.
    pub fn table(&self) -> &CodeTable {
        &self.table
    }

    /// Total length in bits, unpadded.
    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    /// Header length in bits, including the 16-bit length field.
    pub fn header_bit_len(&self) -> usize {
        self.header_bits
    }

    /// Payload length in bits.
    pub fn payload_bit_len(&self) -> usize {
        self.bits.len() - self.header_bits
    }

    /// Number of message symbols encoded.
    pub fn symbol_count(&self) -> usize {
        self.symbols
    }

    /// Byte-aligned form of the stream.
    ///
    /// Pad bits are chosen by `CodeTable::filler` so that they cannot decode
    /// as an extra symbol. A complete table with short codes admits no such
    /// bits; the stream is then zero-padded and may decode with trailing
    /// extras (encode with `padding_escape` to rule this out).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut padded = self.bits.clone();
        let pad = padded.padding_to_byte();
        if pad > 0 {
            match self.table.filler(pad) {
                Some(filler) => padded.extend_from(&filler),
                None => {
                    log::warn!("no safe {pad}-bit filler for this code table; zero-padding");
                    padded.extend_from(&std::iter::repeat_n(false, pad).collect::<Bits>());
                }
            }
        }
        padded.into_bytes()
    }

    /// Whether `to_bytes` output decodes to exactly the encoded symbols.
    pub fn is_byte_safe(&self) -> bool {
        let pad = self.bits.padding_to_byte();
        pad == 0 || self.table.filler(pad).is_some()
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a byte message, one symbol per byte.
pub fn encode(message: &[u8], opts: &EncodeOptions) -> Result<EncodedStream, EncodeError> {
    let freq = FrequencyTable::from_bytes(message);
    let symbols: Vec<Symbol> = message.iter().map(|&b| b as Symbol).collect();
    encode_counted(&symbols, &freq, opts)
}

/// Encode an arbitrary symbol sequence.
pub fn encode_symbols(symbols: &[Symbol], opts: &EncodeOptions) -> Result<EncodedStream, EncodeError> {
    let freq = FrequencyTable::from_symbols(symbols);
    encode_counted(symbols, &freq, opts)
}

/// Encode a bit string in realigned mode: 7-bit groups become the symbols.
pub fn encode_realigned(bits: &Bits, opts: &EncodeOptions) -> Result<EncodedStream, EncodeError> {
    encode_symbols(&frequency::realign(bits), opts)
}

/// Encode with a table built elsewhere (e.g. shared across chunks).
///
/// The table must be prefix-free and contain every symbol of the message.
pub fn encode_with_table(
    symbols: &[Symbol],
    table: &CodeTable,
    format: HeaderFormat,
) -> Result<EncodedStream, EncodeError> {
    table.validate()?;
    frame(symbols, table.clone(), format)
}

fn encode_counted(
    symbols: &[Symbol],
    freq: &FrequencyTable,
    opts: &EncodeOptions,
) -> Result<EncodedStream, EncodeError> {
    let table = tree::build_with(freq, opts.reserved_prefix.as_ref(), opts.padding_escape)?;
    frame(symbols, table, opts.header)
}

fn frame(
    symbols: &[Symbol],
    table: CodeTable,
    format: HeaderFormat,
) -> Result<EncodedStream, EncodeError> {
    let payload_hint: usize = symbols.len() * table.max_code_len() as usize;
    let mut bits = Bits::with_capacity(format.header_bits(&table) + payload_hint);
    let header_bits = format.write(&table, &mut bits)?;
    pack(symbols, &table, &mut bits)?;

    log::debug!(
        "encoded {} symbols: header {} bits, payload {} bits",
        symbols.len(),
        header_bits,
        bits.len() - header_bits
    );

    Ok(EncodedStream {
        bits,
        table,
        header_bits,
        symbols: symbols.len(),
    })
}

/// Append the code of each symbol, in order, to `out`.
pub fn pack(symbols: &[Symbol], table: &CodeTable, out: &mut Bits) -> Result<(), EncodeError> {
    for &symbol in symbols {
        let code = table.get(symbol).ok_or(EncodeError::UnknownSymbol(symbol))?;
        code.write_to(out);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
