//! smcodec: a self-describing Huffman codec in Rust.
//!
//! Every encoded stream carries its own code table, so a receiver decodes it
//! without any side channel. The crate provides:
//! - The codec itself (`huffman`): frequency counting, tree construction with
//!   optional reserved-prefix avoidance, header serialization, encode/decode
//! - File-oriented helpers (`io`)
//! - A one-message-per-connection TCP transport (`net`)
//! - A ratio harness against gzip and LZMA (`compare`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use smcodec::huffman::{self, EncodeOptions};
//!
//! let stream = huffman::encode(b"abbccc", &EncodeOptions::default()).unwrap();
//! let symbols = huffman::decode(stream.bits()).unwrap();
//! assert_eq!(symbols, [97, 98, 98, 99, 99, 99]);
//!
//! // Byte-framed streams (files, sockets) keep padding unambiguous.
//! let bytes = huffman::encode(b"abbccc", &EncodeOptions::byte_framed())
//!     .unwrap()
//!     .to_bytes();
//! assert_eq!(huffman::decode_bytes(&bytes).unwrap(), b"abbccc");
//! ```

pub mod compare;
pub mod huffman;
pub mod io;
pub mod net;

#[cfg(feature = "cli")]
pub mod cli;
