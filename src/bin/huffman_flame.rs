use qscodec::bitstream::{BitReader, BitWriter};
use qscodec::huffman::{decode_block, encode_block};
use qscodec::QualityScores;

fn main() {
    // A skewed, Illumina-like quality line repeated into blocks of 10k scores.
    let line = "IIIIIIHHHGGG@@@>>>;;;888555222###IIIHHIIGG";
    let scores = QualityScores::from_ascii(&line.repeat(240));
    let block = &scores.values()[..10_000];

    for _ in 0..1000 {
        let mut writer = BitWriter::new();
        for _ in 0..4 {
            encode_block(&mut writer, block).unwrap();
        }
        let bytes = writer.finish().unwrap();

        let mut reader = BitReader::new(&bytes);
        for _ in 0..4 {
            let decoded = decode_block(&mut reader).unwrap();
            assert_eq!(decoded.len(), block.len());
        }
    }
}
