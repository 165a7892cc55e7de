#![no_main]
use libfuzzer_sys::fuzz_target;
use qscodec::bitstream::{BitReader, BitWriter};
use qscodec::huffman::{decode_block, encode_block, HuffmanDecoder};

fuzz_target!(|data: (Vec<u8>, u8)| {
    let (input_bytes, spread) = data;

    // Arbitrary bytes must decode to an error or a message, never a panic.
    let mut reader = BitReader::new(&input_bytes);
    let mut decoder = HuffmanDecoder::new();
    if decoder.decode_begin(&mut reader).is_ok() {
        let _ = decoder.decode_message(&mut reader, 1 << 16);
    }

    // Spread byte values apart to exercise sparse alphabets.
    let input: Vec<u32> = input_bytes
        .iter()
        .map(|&b| u32::from(b) * (u32::from(spread) + 1))
        .collect();

    let mut writer = BitWriter::new();
    encode_block(&mut writer, &input).unwrap();
    let bytes = writer.finish().unwrap();

    let mut reader = BitReader::new(&bytes);
    let output = decode_block(&mut reader).unwrap();
    assert_eq!(input, output);
});
