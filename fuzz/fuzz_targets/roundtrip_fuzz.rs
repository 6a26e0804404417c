#![no_main]
use libfuzzer_sys::fuzz_target;
use smcodec::huffman::{self, EncodeOptions, ReservedPrefix};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // First byte: bit 0 toggles the padding escape, bits 1..=3 give the
    // reserved prefix length (0 = none), bits 4..=7 its pattern.
    let flags = data[0];
    let message = &data[1..];
    let prefix_len = (flags >> 1) & 0b111;
    let reserved_prefix = (prefix_len > 0).then(|| {
        let text: String = (0..prefix_len)
            .map(|i| if (flags >> (4 + i % 4)) & 1 == 1 { '1' } else { '0' })
            .collect();
        text.parse::<ReservedPrefix>().unwrap()
    });
    let opts = EncodeOptions {
        reserved_prefix: reserved_prefix.clone(),
        padding_escape: flags & 1 != 0,
        ..Default::default()
    };

    let stream = huffman::encode(message, &opts).unwrap();
    let symbols = huffman::decode(stream.bits()).unwrap();
    let expected: Vec<u16> = message.iter().map(|&b| u16::from(b)).collect();
    assert_eq!(symbols, expected);

    if let Some(prefix) = &reserved_prefix {
        assert!(stream.table().iter().all(|(_, code)| !prefix.is_prefix_of(code)));
    }
    if opts.padding_escape {
        assert_eq!(huffman::decode_bytes(&stream.to_bytes()).unwrap(), message);
    }
});
