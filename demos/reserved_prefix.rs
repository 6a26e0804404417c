// Encode with a reserved prefix and show the resulting code table.
//
// Usage:
//   cargo run --example reserved_prefix
//   cargo run --example reserved_prefix -- 110 "some message"

use smcodec::huffman::{self, EncodeOptions, ReservedPrefix};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let prefix: ReservedPrefix = args.next().as_deref().unwrap_or("11").parse()?;
    let message = args.next().unwrap_or_else(|| "mississippi river".to_string());

    let opts = EncodeOptions {
        reserved_prefix: Some(prefix.clone()),
        ..Default::default()
    };
    let stream = huffman::encode(message.as_bytes(), &opts)?;

    println!("reserved prefix: {prefix}");
    for (symbol, code) in stream.table().iter() {
        assert!(!prefix.is_prefix_of(code));
        println!("  {:?} -> {code}", char::from(symbol as u8));
    }
    println!("stream: {}", stream.bits());

    let decoded = huffman::decode(stream.bits())?;
    assert_eq!(decoded, message.bytes().map(u16::from).collect::<Vec<_>>());
    Ok(())
}
