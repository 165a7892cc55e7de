//! Canonical, table-driven Huffman coding of symbol blocks.
//!
//! Each block is self-describing. Its prelude carries, in order:
//!
//! ```text
//! δ(message length) δ(max symbol) δ(distinct symbols) δ(max codeword length)
//! interpolative(prefix sums of the sorted sub-alphabet)
//! unary(max_len + 1 - len) for every used symbol, ascending by value
//! ```
//!
//! followed by the codewords and `max_len` zero bits that let the decoder's
//! look-ahead window drain cleanly.
//!
//! Decoding never walks a tree: a `max_len`-bit window is compared against a
//! left-justified limit per codeword length, and the codeword's rank indexes
//! the symbols-used list directly.

mod decoder;
mod encoder;
mod table;

pub use decoder::{DecodeState, HuffmanDecoder};
pub use encoder::HuffmanEncoder;
pub use table::CanonicalTables;

use std::cmp::Ordering;

use crate::bitstream::{BitReader, BitWriter};
use crate::error::Result;

/// Longest codeword the encoder will produce by default.
pub const MAX_CODEWORD_LEN: u32 = 31;

/// Value stored in the unused slot 0 of a [`SymbolsUsed`] list.
pub const SENTINEL: u32 = u32::MAX;

/// The distinct symbols of a block, behind a sentinel slot at index 0.
///
/// Keeping slot 0 reserved lets canonical ranks (which start at 1) index the
/// list directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolsUsed {
    slots: Vec<u32>,
}

impl SymbolsUsed {
    /// An empty list holding only the sentinel.
    pub fn new() -> Self {
        Self {
            slots: vec![SENTINEL],
        }
    }

    /// Append a symbol.
    pub fn push(&mut self, symbol: u32) {
        self.slots.push(symbol);
    }

    /// Number of distinct symbols (the sentinel excluded).
    pub fn len(&self) -> usize {
        self.slots.len() - 1
    }

    /// True if no symbol has been added.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The symbols, without the sentinel.
    pub fn symbols(&self) -> &[u32] {
        &self.slots[1..]
    }

    /// Symbol at `rank` (1-based).
    pub fn get(&self, rank: usize) -> Option<u32> {
        if rank == 0 {
            return None;
        }
        self.slots.get(rank).copied()
    }

    /// Order by descending `frequency_of`, ties by ascending value.
    pub fn sort_by_frequency<F>(&mut self, frequency_of: F)
    where
        F: Fn(u32) -> u32,
    {
        self.slots[1..].sort_by(|&a, &b| match frequency_of(b).cmp(&frequency_of(a)) {
            Ordering::Equal => a.cmp(&b),
            other => other,
        });
    }

    /// Order by ascending value.
    pub fn sort_by_value(&mut self) {
        self.slots[1..].sort_unstable();
    }

    /// Move every symbol to the slot given by its rank.
    ///
    /// `ranks` is parallel to [`symbols`](Self::symbols) and must be a
    /// permutation of `1..=len`.
    pub(crate) fn permute_by_rank(&mut self, ranks: &[u32]) {
        let current = self.slots.clone();
        for (&symbol, &rank) in current[1..].iter().zip(ranks) {
            self.slots[rank as usize] = symbol;
        }
    }
}

impl Default for SymbolsUsed {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<u32> for SymbolsUsed {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut used = Self::new();
        used.slots.extend(iter);
        used
    }
}

/// Encode `message` as one self-describing block.
pub fn encode_block(writer: &mut BitWriter, message: &[u32]) -> Result<()> {
    let mut encoder = HuffmanEncoder::from_message(message)?;
    encoder.encode_begin(writer)?;
    encoder.encode_message(writer, message)?;
    encoder.encode_finish(writer)
}

/// Decode one block written by [`encode_block`] (or the encoder's
/// begin/message/finish sequence).
pub fn decode_block(reader: &mut BitReader) -> Result<Vec<u32>> {
    let mut decoder = HuffmanDecoder::new();
    decoder.decode_begin(reader)?;
    let message = decoder.decode_message(reader, decoder.remaining())?;
    decoder.decode_finish(reader)?;
    Ok(message)
}
