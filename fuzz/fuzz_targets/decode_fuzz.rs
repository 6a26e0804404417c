#![no_main]
use libfuzzer_sys::fuzz_target;
use smcodec::huffman::{self, Bits, HeaderFormat};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must only ever produce errors, never panics.
    let _ = huffman::decode_bytes(data);

    // First byte picks the symbol field width, the rest is the stream.
    if let Some((&width, rest)) = data.split_first() {
        if let Ok(format) = HeaderFormat::new(width % 17) {
            let bits = Bits::from_bytes(rest);
            let _ = huffman::decode_with(&bits, format);
        }
    }
});
