#![no_main]
use libfuzzer_sys::fuzz_target;
use smcodec::huffman::{self, Bits, EncodeOptions};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    // Drop up to 7 trailing bits so arbitrary bit lengths are covered.
    let mut bits = Bits::from_bytes(&data[1..]);
    let cut = (data[0] % 8) as usize;
    bits.truncate(bits.len().saturating_sub(cut));
    if bits.is_empty() {
        return;
    }

    let stream = huffman::encode_realigned(&bits, &EncodeOptions::default()).unwrap();
    let back = huffman::decode_realigned(stream.bits()).unwrap();
    // The last group is zero-filled to a whole 7-bit symbol.
    assert_eq!(back.len(), bits.len().div_ceil(7) * 7);
    assert!(bits.is_prefix_of(&back));
    assert!((bits.len()..back.len()).all(|i| back.get(i) == Some(false)));
});
