// Huffman stream decoder.
//
// StreamDecoder owns the code table parsed from a header and walks the
// payload bit by bit, growing a candidate code until it matches a table
// entry. Because the table is prefix-free the first match is the only one,
// so no backtracking is needed.
//
// The stream carries no symbol count. Decoding stops when the bits run out.
// An unmatched run that starts inside the final byte's worth of bits is
// padding and is dropped (filler bits are chosen so that this is where such
// runs end up); any other unmatched run is an `UnknownCode` error, including
// a stream cut short in the middle of a code.

use std::collections::HashMap;

use super::Symbol;
use super::bitstream::{BitReader, Bits};
use super::frequency::REALIGN_WIDTH;
use super::header::HeaderFormat;
use super::table::{Code, CodeTable};

/// Most pad bits `EncodedStream::to_bytes` appends.
const MAX_PADDING_BITS: usize = 7;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed header: {0}")]
    MalformedHeader(String),
    #[error("bits at offset {offset} do not match any code")]
    UnknownCode { offset: usize },
    #[error("decoded symbol {symbol} does not fit in {bits} bits")]
    SymbolOutOfRange { symbol: Symbol, bits: u8 },
}

// ---------------------------------------------------------------------------
// StreamDecoder
// ---------------------------------------------------------------------------

/// Greedy prefix-code decoder for one stream.
#[derive(Debug, Clone)]
pub struct StreamDecoder {
    table: CodeTable,
    lookup: HashMap<Code, Symbol>,
    max_len: u8,
}

impl StreamDecoder {
    /// Decoder for `table`. The table must be prefix-free; violations are
    /// reported as `MalformedHeader` since tables normally come from a header.
    pub fn new(table: CodeTable) -> Result<Self, DecodeError> {
        table
            .validate()
            .map_err(|e| DecodeError::MalformedHeader(e.to_string()))?;
        let lookup = table.iter().map(|(symbol, code)| (code, symbol)).collect();
        let max_len = table.max_code_len();
        Ok(Self {
            table,
            lookup,
            max_len,
        })
    }

    /// Parse the header at the reader's position and build a decoder for it.
    /// The reader is left at the start of the payload.
    pub fn from_header(format: HeaderFormat, reader: &mut BitReader<'_>) -> Result<Self, DecodeError> {
        let table = format.read(reader)?;
        log::debug!(
            "parsed header: {} symbols, max code length {}",
            table.len(),
            table.max_code_len()
        );
        Self::new(table)
    }

    pub fn table(&self) -> &CodeTable {
        &self.table
    }

    /// Decode the rest of `reader` as payload.
    pub fn decode_payload(&self, reader: &mut BitReader<'_>) -> Result<Vec<Symbol>, DecodeError> {
        let end = reader.position() + reader.remaining();
        let mut out = Vec::new();
        let mut candidate = Code::EMPTY;
        let mut start = reader.position();

        while let Some(bit) = reader.read_bit() {
            // max_len <= MAX_CODE_LEN, so the candidate never overflows.
            candidate = candidate
                .push(bit)
                .ok_or(DecodeError::UnknownCode { offset: start })?;

            if let Some(&symbol) = self.lookup.get(&candidate) {
                log::trace!("offset {start}: {candidate} -> {symbol}");
                out.push(symbol);
                candidate = Code::EMPTY;
                start = reader.position();
            } else if candidate.len() >= self.max_len {
                if end - start <= MAX_PADDING_BITS {
                    log::trace!("stopping at padding run starting at offset {start}");
                    return Ok(out);
                }
                return Err(DecodeError::UnknownCode { offset: start });
            }
        }

        if !candidate.is_empty() {
            let dropped = end - start;
            if dropped > MAX_PADDING_BITS {
                log::warn!("{dropped} trailing bits at offset {start} do not complete a code");
                return Err(DecodeError::UnknownCode { offset: start });
            }
            log::trace!("discarding {dropped} padding bits");
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Convenience functions
// ---------------------------------------------------------------------------

/// Decode a complete stream with the default header format.
pub fn decode(bits: &Bits) -> Result<Vec<Symbol>, DecodeError> {
    decode_with(bits, HeaderFormat::default())
}

/// Decode a complete stream whose header uses `format`.
pub fn decode_with(bits: &Bits, format: HeaderFormat) -> Result<Vec<Symbol>, DecodeError> {
    let mut reader = BitReader::new(bits);
    let decoder = StreamDecoder::from_header(format, &mut reader)?;
    let symbols = decoder.decode_payload(&mut reader)?;
    log::debug!("decoded {} symbols from {} bits", symbols.len(), bits.len());
    Ok(symbols)
}

/// Decode a byte-framed stream back into the original bytes.
pub fn decode_bytes(bytes: &[u8]) -> Result<Vec<u8>, DecodeError> {
    decode_bytes_with(bytes, HeaderFormat::default())
}

/// Like `decode_bytes`, for a header using `format`. Every decoded symbol
/// must fit in a byte.
pub fn decode_bytes_with(bytes: &[u8], format: HeaderFormat) -> Result<Vec<u8>, DecodeError> {
    decode_with(&Bits::from_bytes(bytes), format)?
        .into_iter()
        .map(|symbol| {
            u8::try_from(symbol).map_err(|_| DecodeError::SymbolOutOfRange { symbol, bits: 8 })
        })
        .collect()
}

/// Decode a realigned stream into the concatenated 7-bit groups.
///
/// The result is a multiple of 7 bits long; a caller that knows the original
/// length should truncate to it.
pub fn decode_realigned(bits: &Bits) -> Result<Bits, DecodeError> {
    decode_realigned_with(bits, HeaderFormat::default())
}

/// Like `decode_realigned`, for a header using `format`.
pub fn decode_realigned_with(bits: &Bits, format: HeaderFormat) -> Result<Bits, DecodeError> {
    let symbols = decode_with(bits, format)?;
    let mut out = Bits::with_capacity(symbols.len() * REALIGN_WIDTH as usize);
    for symbol in symbols {
        if symbol >> REALIGN_WIDTH != 0 {
            return Err(DecodeError::SymbolOutOfRange {
                symbol,
                bits: REALIGN_WIDTH,
            });
        }
        out.push_value(symbol as u32, REALIGN_WIDTH);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
