// Self-describing Huffman codec.
//
// An encoded stream carries its own code table in a header, so a receiver
// needs nothing but the stream (and the agreed symbol field width) to decode.
//
// # Modules
//
// - `bitstream` Bit strings and an MSB-first reader
// - `frequency` Symbol counting, natural and realigned (7-bit) mode
// - `table`     Prefix codes and the canonical code table
// - `tree`      Huffman tree construction
// - `guard`     Reserved-prefix avoidance
// - `header`    Code table header serialization
// - `encoder`   Symbol packing and `EncodedStream`
// - `decoder`   Greedy stream decoding

pub mod bitstream;
pub mod decoder;
pub mod encoder;
pub mod frequency;
pub mod guard;
pub mod header;
pub mod table;
pub mod tree;

/// One unit of the message alphabet. Bytes in natural mode, 7-bit groups in
/// realigned mode; wider alphabets need a wider `HeaderFormat`.
pub type Symbol = u16;

// Re-export key types for convenience.
pub use bitstream::{BitReader, Bits, BitsError};
pub use decoder::{
    DecodeError, StreamDecoder, decode, decode_bytes, decode_bytes_with, decode_realigned,
    decode_realigned_with, decode_with,
};
pub use encoder::{
    EncodeError, EncodeOptions, EncodedStream, encode, encode_realigned, encode_symbols,
    encode_with_table,
};
pub use frequency::FrequencyTable;
pub use guard::{PrefixError, ReservedPrefix};
pub use header::HeaderFormat;
pub use table::{Code, CodeTable, MAX_CODE_LEN, TableError};
