//! Huffman block encoder.

use log::debug;

use super::table::CanonicalTables;
use super::{SymbolsUsed, MAX_CODEWORD_LEN};
use crate::bitstream::BitWriter;
use crate::error::{Error, Result};
use crate::interpolative;
use crate::universal::{encode_delta, encode_unary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncodeState {
    Ready,
    Encoding,
    Finished,
}

impl EncodeState {
    fn name(self) -> &'static str {
        match self {
            EncodeState::Ready => "ready",
            EncodeState::Encoding => "encoding",
            EncodeState::Finished => "finished",
        }
    }
}

/// Encodes one block of symbols with a canonical Huffman code.
///
/// The code is fixed at construction from the block's symbol frequencies.
/// Writing then follows `encode_begin` (prelude), any number of
/// `encode_message` calls totalling the declared message length, and
/// `encode_finish` (termination bits).
///
/// Per-symbol tables are kept parallel to the sorted sub-alphabet, so the
/// cost of a code depends on the number of distinct symbols, not on how
/// large they are.
#[derive(Debug, Clone)]
pub struct HuffmanEncoder {
    message_length: u32,
    max_symbol: u32,
    max_codeword_len: u32,
    // Distinct symbols ascending, with lengths and codewords alongside.
    symbols: SymbolsUsed,
    lengths: Vec<u8>,
    codewords: Vec<u32>,
    tables: CanonicalTables,
    encoded: u32,
    state: EncodeState,
}

impl HuffmanEncoder {
    /// Build a code from per-symbol frequencies (`frequencies[id]`).
    pub fn new(frequencies: &[u32]) -> Result<Self> {
        Self::with_max_codeword_len(frequencies, MAX_CODEWORD_LEN)
    }

    /// Build a code for exactly the symbols of `message`.
    ///
    /// Symbols may be sparse; only the distinct values are tabulated.
    pub fn from_message(message: &[u32]) -> Result<Self> {
        let mut sorted = message.to_vec();
        sorted.sort_unstable();
        let mut alphabet: Vec<u32> = Vec::new();
        let mut frequencies: Vec<u32> = Vec::new();
        for &sym in &sorted {
            match (alphabet.last(), frequencies.last_mut()) {
                (Some(&last), Some(count)) if last == sym => {
                    *count = count.checked_add(1).ok_or_else(|| {
                        Error::invalid_parameter("symbol frequency overflows 32 bits")
                    })?;
                }
                _ => {
                    alphabet.push(sym);
                    frequencies.push(1);
                }
            }
        }
        Self::build(alphabet, frequencies, MAX_CODEWORD_LEN)
    }

    /// Build a code whose codewords are at most `max_codeword_len` bits.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` if the limit is outside
    /// `1..=MAX_CODEWORD_LEN`, too small for the number of distinct symbols,
    /// the frequencies sum past 32 bits, or the sub-alphabet's prefix sums
    /// (which the prelude carries) overflow 32 bits.
    pub fn with_max_codeword_len(frequencies: &[u32], max_codeword_len: u32) -> Result<Self> {
        let (alphabet, frequencies): (Vec<u32>, Vec<u32>) = frequencies
            .iter()
            .enumerate()
            .filter(|(_, &f)| f > 0)
            .map(|(sym, &f)| (sym as u32, f))
            .unzip();
        Self::build(alphabet, frequencies, max_codeword_len)
    }

    /// `alphabet` is strictly increasing; `frequencies` is parallel and positive.
    fn build(alphabet: Vec<u32>, frequencies: Vec<u32>, max_codeword_len: u32) -> Result<Self> {
        if !(1..=MAX_CODEWORD_LEN).contains(&max_codeword_len) {
            return Err(Error::invalid_parameter(format!(
                "codeword length limit {max_codeword_len} outside 1..={MAX_CODEWORD_LEN}"
            )));
        }
        let total: u64 = frequencies.iter().map(|&f| u64::from(f)).sum();
        let message_length = u32::try_from(total).map_err(|_| {
            Error::invalid_parameter(format!("message length {total} exceeds 32 bits"))
        })?;
        if alphabet.len() as u64 > 1u64 << max_codeword_len {
            return Err(Error::invalid_parameter(format!(
                "{} distinct symbols cannot fit {max_codeword_len}-bit codewords",
                alphabet.len()
            )));
        }
        let sum: u64 = alphabet.iter().map(|&s| u64::from(s)).sum();
        if sum > u64::from(u32::MAX) {
            return Err(Error::invalid_parameter(format!(
                "sub-alphabet prefix sums reach {sum}, past 32 bits"
            )));
        }
        let max_symbol = alphabet.last().copied().unwrap_or(0);

        let mut by_frequency: SymbolsUsed = (0..alphabet.len() as u32).collect();
        by_frequency.sort_by_frequency(|i| frequencies[i as usize]);
        let weights: Vec<u32> = by_frequency
            .symbols()
            .iter()
            .map(|&i| frequencies[i as usize])
            .collect();
        let histogram = code_length_histogram(&weights, max_codeword_len)?;
        let next_len = (1..histogram.len())
            .flat_map(|len| std::iter::repeat(len as u8).take(histogram[len] as usize));
        let mut lengths = vec![0u8; alphabet.len()];
        for (&i, len) in by_frequency.symbols().iter().zip(next_len) {
            lengths[i as usize] = len;
        }
        let max_len = histogram
            .iter()
            .rposition(|&count| count > 0)
            .map_or(0, |len| len as u32);

        let tables = CanonicalTables::from_histogram(&histogram, max_len)?;
        let indices: Vec<u32> = (0..alphabet.len() as u32).collect();
        let ranks = tables.assign_ranks(&indices, |i| u32::from(lengths[i as usize]));
        let codewords = ranks
            .iter()
            .zip(&lengths)
            .map(|(&rank, &len)| tables.codeword(rank, u32::from(len)) as u32)
            .collect();

        Ok(Self {
            message_length,
            max_symbol,
            max_codeword_len: max_len,
            symbols: alphabet.into_iter().collect(),
            lengths,
            codewords,
            tables,
            encoded: 0,
            state: EncodeState::Ready,
        })
    }

    /// Number of symbols the block declares.
    pub fn message_length(&self) -> u32 {
        self.message_length
    }

    /// Largest symbol occurring in the block.
    pub fn max_symbol(&self) -> u32 {
        self.max_symbol
    }

    /// Longest codeword actually assigned.
    pub fn max_codeword_len(&self) -> u32 {
        self.max_codeword_len
    }

    fn index_of(&self, symbol: u32) -> Option<usize> {
        self.symbols.symbols().binary_search(&symbol).ok()
    }

    /// Codeword length of `symbol`, or 0 if it does not occur.
    pub fn code_length(&self, symbol: u32) -> u32 {
        self.index_of(symbol)
            .map_or(0, |i| u32::from(self.lengths[i]))
    }

    /// Codeword of `symbol` and its length, if it occurs.
    pub fn codeword(&self, symbol: u32) -> Option<(u32, u32)> {
        self.index_of(symbol)
            .map(|i| (self.codewords[i], u32::from(self.lengths[i])))
    }

    /// Distinct symbols in ascending order.
    pub fn symbols(&self) -> &[u32] {
        self.symbols.symbols()
    }

    /// Canonical tables shared with the decoder.
    pub fn tables(&self) -> &CanonicalTables {
        &self.tables
    }

    /// Write the block prelude.
    ///
    /// The sub-alphabet goes through [`interpolative::encode`], which codes
    /// the prefix sums of the sorted symbols.
    pub fn encode_begin(&mut self, writer: &mut BitWriter) -> Result<()> {
        self.require_state(EncodeState::Ready)?;
        let word_bits = writer.config().word_bits();
        if self.max_codeword_len >= word_bits {
            return Err(Error::invalid_parameter(format!(
                "{}-bit codewords do not fit the {word_bits}-bit word width",
                self.max_codeword_len
            )));
        }
        let start = writer.bits_written();

        encode_delta(writer, self.message_length)?;
        encode_delta(writer, self.max_symbol)?;
        encode_delta(writer, self.symbols.len() as u32)?;
        encode_delta(writer, self.max_codeword_len)?;
        interpolative::encode(writer, self.symbols.symbols())?;
        for &len in &self.lengths {
            encode_unary(writer, u64::from(self.max_codeword_len + 1 - u32::from(len)))?;
        }

        debug!(
            "huffman prelude: {} symbols, {} distinct, max symbol {}, max length {}, {} bits",
            self.message_length,
            self.symbols.len(),
            self.max_symbol,
            self.max_codeword_len,
            writer.bits_written() - start
        );
        self.state = EncodeState::Encoding;
        Ok(())
    }

    /// Write the codewords for `message`. May be called repeatedly.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` if a symbol has no codeword or the
    /// total would exceed the declared message length. Nothing is written
    /// in either case.
    pub fn encode_message(&mut self, writer: &mut BitWriter, message: &[u32]) -> Result<()> {
        self.require_state(EncodeState::Encoding)?;
        let remaining = (self.message_length - self.encoded) as usize;
        if message.len() > remaining {
            return Err(Error::invalid_parameter(format!(
                "{} symbols exceed the {remaining} remaining in the block",
                message.len()
            )));
        }
        let codes = message
            .iter()
            .map(|&sym| {
                self.codeword(sym).ok_or_else(|| {
                    Error::invalid_parameter(format!("symbol {sym} has no codeword in this block"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        for (code, len) in codes {
            writer.write_bits(code, len)?;
        }
        self.encoded += message.len() as u32;
        Ok(())
    }

    /// Write the zero termination bits that close the block.
    pub fn encode_finish(&mut self, writer: &mut BitWriter) -> Result<()> {
        self.require_state(EncodeState::Encoding)?;
        if self.encoded != self.message_length {
            return Err(Error::InvalidState {
                expected: "all declared symbols encoded",
                actual: "symbols remaining",
            });
        }
        writer.write_zeros(u64::from(self.max_codeword_len))?;
        self.state = EncodeState::Finished;
        Ok(())
    }

    fn require_state(&self, state: EncodeState) -> Result<()> {
        if self.state != state {
            return Err(Error::InvalidState {
                expected: state.name(),
                actual: self.state.name(),
            });
        }
        Ok(())
    }
}

/// Codeword-length histogram for `weights` (non-increasing), limited to
/// `limit` bits.
fn code_length_histogram(weights: &[u32], limit: u32) -> Result<Vec<u32>> {
    let n = weights.len();
    let mut histogram = vec![0u32; limit as usize + 1];
    if n == 0 {
        return Ok(histogram);
    }
    if n == 1 {
        histogram[1] = 1;
        return Ok(histogram);
    }

    // Ascending weights; lengths come back in the same positions.
    let mut depths: Vec<u64> = weights.iter().rev().map(|&w| u64::from(w)).collect();
    minimum_redundancy(&mut depths);

    let longest = depths.iter().copied().max().unwrap_or(0) as usize;
    let mut full = vec![0u32; longest.max(limit as usize) + 1];
    for &len in &depths {
        full[len as usize] += 1;
    }
    limit_lengths(&mut full, limit)?;
    histogram.copy_from_slice(&full[..=limit as usize]);
    Ok(histogram)
}

/// In-place minimum-redundancy code lengths.
///
/// `a` holds weights in non-decreasing order and is overwritten with the
/// codeword length of each position.
fn minimum_redundancy(a: &mut [u64]) {
    let n = a.len();
    if n == 0 {
        return;
    }
    if n == 1 {
        a[0] = 0;
        return;
    }

    // Left to right: merge weights, leaving parent pointers behind.
    a[0] += a[1];
    let (mut root, mut leaf) = (0usize, 2usize);
    for next in 1..n - 1 {
        if leaf >= n || a[root] < a[leaf] {
            a[next] = a[root];
            a[root] = next as u64;
            root += 1;
        } else {
            a[next] = a[leaf];
            leaf += 1;
        }
        if leaf >= n || (root < next && a[root] < a[leaf]) {
            a[next] += a[root];
            a[root] = next as u64;
            root += 1;
        } else {
            a[next] += a[leaf];
            leaf += 1;
        }
    }

    // Right to left: internal node depths.
    a[n - 2] = 0;
    for next in (0..n - 2).rev() {
        a[next] = a[a[next] as usize] + 1;
    }

    // Right to left: leaf depths.
    let (mut avail, mut used, mut depth) = (1usize, 0usize, 0u64);
    let mut root = n as isize - 2;
    let mut next = n as isize - 1;
    while avail > 0 {
        while root >= 0 && a[root as usize] == depth {
            used += 1;
            root -= 1;
        }
        while avail > used {
            a[next as usize] = depth;
            next -= 1;
            avail -= 1;
        }
        avail = 2 * used;
        depth += 1;
        used = 0;
    }
}

/// Fold codewords longer than `limit` back into the code space.
///
/// Overlong codewords are clamped to `limit`; while the code is
/// oversubscribed, one `limit`-bit codeword is dropped and the deepest
/// shorter leaf is split to make room for it.
fn limit_lengths(histogram: &mut Vec<u32>, limit: u32) -> Result<()> {
    let limit = limit as usize;
    if histogram.len() <= limit + 1 {
        return Ok(());
    }
    let overflow: u32 = histogram[limit + 1..].iter().sum();
    histogram.truncate(limit + 1);
    histogram[limit] += overflow;

    let target = 1u64 << limit;
    let mut kraft: u64 = histogram
        .iter()
        .enumerate()
        .skip(1)
        .map(|(len, &count)| u64::from(count) << (limit - len))
        .sum();
    while kraft > target {
        if histogram[limit] == 0 {
            return Err(Error::invalid_parameter(format!(
                "cannot fit the alphabet into {limit}-bit codewords"
            )));
        }
        histogram[limit] -= 1;
        if let Some(len) = (1..limit).rev().find(|&len| histogram[len] > 0) {
            histogram[len] -= 1;
            histogram[len + 1] += 2;
        }
        kraft -= 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitstream::BitReader;
    use crate::huffman::HuffmanDecoder;

    fn lengths_of(weights: &[u64]) -> Vec<u64> {
        let mut a = weights.to_vec();
        minimum_redundancy(&mut a);
        a
    }

    #[test]
    fn test_minimum_redundancy_small() {
        assert_eq!(lengths_of(&[1, 2, 3]), vec![2, 2, 1]);
        assert_eq!(lengths_of(&[4, 4]), vec![1, 1]);
        assert_eq!(lengths_of(&[1, 1, 1, 1]), vec![2, 2, 2, 2]);
        assert_eq!(lengths_of(&[1, 1, 2, 4, 8]), vec![4, 4, 3, 2, 1]);
    }

    #[test]
    fn test_minimum_redundancy_is_complete() {
        let weights: Vec<u64> = (1..=40).map(|i| i * i).collect();
        let lengths = lengths_of(&weights);
        let kraft: f64 = lengths.iter().map(|&l| 0.5f64.powi(l as i32)).sum();
        assert!((kraft - 1.0).abs() < 1e-12);
        assert!(lengths.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_fibonacci_weights_are_limited() {
        // Fibonacci weights produce the deepest possible tree.
        let mut fib = vec![1u32, 1];
        while fib.len() < 30 {
            let next = fib[fib.len() - 1] + fib[fib.len() - 2];
            fib.push(next);
        }
        let unlimited = HuffmanEncoder::new(&fib).unwrap();
        assert_eq!(unlimited.max_codeword_len(), 29);

        let limited = HuffmanEncoder::with_max_codeword_len(&fib, 8).unwrap();
        assert_eq!(limited.max_codeword_len(), 8);
        let kraft: u64 = (0..fib.len() as u32)
            .map(|s| 1u64 << (8 - limited.code_length(s)))
            .sum();
        assert!(kraft <= 256);
        // More frequent symbols never get longer codes.
        for s in 2..fib.len() as u32 {
            assert!(limited.code_length(s) <= limited.code_length(s - 1));
        }
    }

    #[test]
    fn test_limit_too_small_for_alphabet() {
        let freqs = vec![1u32; 5];
        assert!(matches!(
            HuffmanEncoder::with_max_codeword_len(&freqs, 2),
            Err(Error::InvalidParameter(_))
        ));
        assert!(HuffmanEncoder::with_max_codeword_len(&freqs, 0).is_err());
        assert!(HuffmanEncoder::with_max_codeword_len(&freqs, 32).is_err());
    }

    #[test]
    fn test_tie_break_by_value() {
        let mut freqs = vec![0u32; 10];
        for s in [2, 4, 6] {
            freqs[s] = 3;
        }
        let encoder = HuffmanEncoder::new(&freqs).unwrap();
        // The smallest value wins the tie for the short code.
        assert_eq!(encoder.code_length(2), 1);
        assert_eq!(encoder.code_length(4), 2);
        assert_eq!(encoder.code_length(6), 2);
    }

    #[test]
    fn test_codewords_are_canonical() {
        let message = [5, 5, 5, 9, 9, 42];
        let encoder = HuffmanEncoder::from_message(&message).unwrap();
        assert_eq!(encoder.codeword(5), Some((0b0, 1)));
        assert_eq!(encoder.codeword(9), Some((0b10, 2)));
        assert_eq!(encoder.codeword(42), Some((0b11, 2)));
        assert_eq!(encoder.codeword(6), None);
        assert_eq!(encoder.symbols(), &[5, 9, 42]);
        assert_eq!(encoder.max_symbol(), 42);
        assert_eq!(encoder.message_length(), 6);
    }

    #[test]
    fn test_sparse_symbols_tabulate_only_distinct() {
        let message = [u32::MAX, 0, u32::MAX];
        let encoder = HuffmanEncoder::from_message(&message).unwrap();
        assert_eq!(encoder.symbols(), &[0, u32::MAX]);
        assert_eq!(encoder.max_symbol(), u32::MAX);
        assert_eq!(encoder.code_length(u32::MAX), 1);
        assert_eq!(encoder.code_length(7), 0);

        let mut writer = BitWriter::new();
        crate::huffman::encode_block(&mut writer, &message).unwrap();
        let bytes = writer.finish().unwrap();
        let mut reader = BitReader::new(&bytes);
        assert_eq!(crate::huffman::decode_block(&mut reader).unwrap(), message);
    }

    #[test]
    fn test_sub_alphabet_sum_overflow_rejected() {
        assert!(matches!(
            HuffmanEncoder::from_message(&[u32::MAX - 1, u32::MAX, 3]),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_state_order_enforced() {
        let message = [1, 2, 2];
        let mut encoder = HuffmanEncoder::from_message(&message).unwrap();
        let mut writer = BitWriter::new();
        assert!(matches!(
            encoder.encode_message(&mut writer, &message),
            Err(Error::InvalidState { .. })
        ));
        encoder.encode_begin(&mut writer).unwrap();
        assert!(encoder.encode_begin(&mut writer).is_err());
        encoder.encode_message(&mut writer, &message[..1]).unwrap();
        assert!(matches!(
            encoder.encode_finish(&mut writer),
            Err(Error::InvalidState { .. })
        ));
        assert!(encoder.encode_message(&mut writer, &[3]).is_err());
        assert!(encoder.encode_message(&mut writer, &[1, 2, 2]).is_err());
        encoder.encode_message(&mut writer, &message[1..]).unwrap();
        encoder.encode_finish(&mut writer).unwrap();
        assert!(encoder.encode_finish(&mut writer).is_err());
    }

    #[test]
    fn test_frequency_table_block_roundtrip() {
        // Frequencies declared up front, message written in pieces.
        let mut freqs = vec![0u32; 300];
        freqs[0] = 10;
        freqs[17] = 3;
        freqs[299] = 1;
        let message: Vec<u32> = std::iter::repeat(0)
            .take(10)
            .chain([17, 17, 17, 299])
            .collect();
        let mut encoder = HuffmanEncoder::new(&freqs).unwrap();
        let mut writer = BitWriter::new();
        encoder.encode_begin(&mut writer).unwrap();
        for chunk in message.chunks(3) {
            encoder.encode_message(&mut writer, chunk).unwrap();
        }
        encoder.encode_finish(&mut writer).unwrap();
        let bytes = writer.finish().unwrap();

        let mut reader = BitReader::new(&bytes);
        let mut decoder = HuffmanDecoder::new();
        decoder.decode_begin(&mut reader).unwrap();
        assert_eq!(decoder.tables(), encoder.tables());
        assert_eq!(decoder.decode_message(&mut reader, 100).unwrap(), message);
        decoder.decode_finish(&mut reader).unwrap();
    }

    #[test]
    fn test_narrow_word_rejects_long_codes() {
        use crate::bitstream::BitConfig;
        let mut fib = vec![1u32, 1];
        while fib.len() < 12 {
            let next = fib[fib.len() - 1] + fib[fib.len() - 2];
            fib.push(next);
        }
        let mut encoder = HuffmanEncoder::new(&fib).unwrap();
        let mut writer = BitWriter::with_config(BitConfig::new(8).unwrap());
        assert!(matches!(
            encoder.encode_begin(&mut writer),
            Err(Error::InvalidParameter(_))
        ));
    }
}
