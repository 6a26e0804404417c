use smcodec::huffman::{self, EncodeOptions};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let message = b"It was the best of times, it was the worst of times";

    let stream = huffman::encode(message, &EncodeOptions::byte_framed())?;
    let bytes = stream.to_bytes();

    let restored = huffman::decode_bytes(&bytes)?;
    assert_eq!(restored, message);

    println!(
        "encoded {} bytes -> {} bits ({} header + {} payload) -> {} bytes framed",
        message.len(),
        stream.bit_len(),
        stream.header_bit_len(),
        stream.payload_bit_len(),
        bytes.len()
    );

    Ok(())
}
