//! Huffman block decoder.
//!
//! The decoder keeps a look-ahead window of up to `max_len` bits. Each
//! symbol is found by comparing the full window against the left-justified
//! limit of every length in turn; the first limit the window falls below is
//! the codeword's length.

use log::debug;

use super::table::CanonicalTables;
use super::SymbolsUsed;
use crate::bitstream::BitReader;
use crate::error::{Error, Result};
use crate::interpolative;
use crate::universal::{decode_delta, decode_unary};

/// Where a [`HuffmanDecoder`] is in its per-block lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// No block started.
    Idle,
    /// Prelude fields and code lengths read; tables not yet built.
    ///
    /// Only held inside [`HuffmanDecoder::decode_begin`]: the call returns
    /// in `TablesBuilt` on success and `Idle` on failure.
    PreludeRead,
    /// Tables built; no symbol decoded yet.
    TablesBuilt,
    /// At least one symbol decoded.
    Decoding,
    /// Termination bits checked.
    Finished,
}

impl DecodeState {
    /// Lower-case name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            DecodeState::Idle => "idle",
            DecodeState::PreludeRead => "prelude read",
            DecodeState::TablesBuilt => "tables built",
            DecodeState::Decoding => "decoding",
            DecodeState::Finished => "finished",
        }
    }
}

/// Prelude of one block, before table construction.
struct Prelude {
    message_length: u32,
    max_symbol: u32,
    max_len: u32,
    alphabet: Vec<u32>,
    lengths: Vec<u8>,
}

/// Decodes blocks written by [`HuffmanEncoder`](super::HuffmanEncoder).
///
/// One decoder may read any number of consecutive blocks: after
/// `decode_finish`, `decode_begin` starts the next one.
#[derive(Debug, Clone)]
pub struct HuffmanDecoder {
    state: DecodeState,
    message_length: u32,
    max_symbol: u32,
    // Distinct symbols ascending, with their code lengths alongside.
    alphabet: Vec<u32>,
    lengths: Vec<u8>,
    symbols: SymbolsUsed,
    tables: CanonicalTables,
    window: u64,
    window_bits: u32,
    decoded: u32,
}

impl HuffmanDecoder {
    /// Create an idle decoder.
    pub fn new() -> Self {
        Self {
            state: DecodeState::Idle,
            message_length: 0,
            max_symbol: 0,
            alphabet: Vec::new(),
            lengths: Vec::new(),
            symbols: SymbolsUsed::new(),
            tables: CanonicalTables::default(),
            window: 0,
            window_bits: 0,
            decoded: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Symbols declared by the current block.
    pub fn message_length(&self) -> u32 {
        self.message_length
    }

    /// Symbols not yet decoded from the current block.
    pub fn remaining(&self) -> usize {
        (self.message_length - self.decoded) as usize
    }

    /// Largest symbol the current block declares.
    pub fn max_symbol(&self) -> u32 {
        self.max_symbol
    }

    /// Longest codeword of the current block.
    pub fn max_codeword_len(&self) -> u32 {
        self.tables.max_len()
    }

    /// Codeword length of `symbol` in the current block, or 0 if absent.
    pub fn code_length(&self, symbol: u32) -> u32 {
        self.alphabet
            .binary_search(&symbol)
            .map_or(0, |i| u32::from(self.lengths[i]))
    }

    /// Canonical tables of the current block.
    pub fn tables(&self) -> &CanonicalTables {
        &self.tables
    }

    /// Distinct symbols in canonical-rank order.
    pub fn symbols_by_rank(&self) -> &[u32] {
        self.symbols.symbols()
    }

    /// Read a block prelude and build its decoding tables.
    ///
    /// Allowed on an idle decoder or one that finished its previous block.
    /// On error the decoder returns to [`DecodeState::Idle`].
    pub fn decode_begin(&mut self, reader: &mut BitReader) -> Result<()> {
        if !matches!(self.state, DecodeState::Idle | DecodeState::Finished) {
            return Err(Error::InvalidState {
                expected: "idle or finished",
                actual: self.state.name(),
            });
        }
        *self = Self::new();
        let result = read_prelude(reader).and_then(|prelude| {
            self.state = DecodeState::PreludeRead;
            self.build_tables(prelude)
        });
        if result.is_err() {
            *self = Self::new();
        }
        result
    }

    fn build_tables(&mut self, prelude: Prelude) -> Result<()> {
        let Prelude {
            message_length,
            max_symbol,
            max_len,
            alphabet,
            lengths,
        } = prelude;

        let tables = CanonicalTables::from_lengths(lengths.iter().map(|&l| u32::from(l)), max_len)?;
        debug!(
            "huffman tables: counts {:?}, base {:?}, offset {:?}, lj_limit {:?}",
            tables.counts(),
            tables.base(),
            tables.offset(),
            tables.lj_limit()
        );

        let indices: Vec<u32> = (0..alphabet.len() as u32).collect();
        let ranks = tables.assign_ranks(&indices, |i| u32::from(lengths[i as usize]));
        let mut symbols: SymbolsUsed = alphabet.iter().copied().collect();
        symbols.permute_by_rank(&ranks);
        debug!("huffman ranks assigned: {:?}", symbols.symbols());

        self.message_length = message_length;
        self.max_symbol = max_symbol;
        self.alphabet = alphabet;
        self.lengths = lengths;
        self.symbols = symbols;
        self.tables = tables;
        self.state = DecodeState::TablesBuilt;
        Ok(())
    }

    /// Decode the next symbol of the block.
    ///
    /// # Errors
    /// Returns `Error::StreamCorruption` if the window matches no codeword,
    /// `Error::InputExhausted` if the stream ends early, and
    /// `Error::InvalidState` if no symbols remain.
    pub fn decode_symbol(&mut self, reader: &mut BitReader) -> Result<u32> {
        self.expect_decoding()?;
        if self.decoded == self.message_length {
            return Err(Error::InvalidState {
                expected: "symbols remaining",
                actual: "all declared symbols decoded",
            });
        }

        let max_len = self.tables.max_len();
        self.refill(reader, max_len)?;
        let len = self.tables.length_for_window(self.window).ok_or_else(|| {
            Error::corrupted(format!(
                "bit window {:#b} matches no codeword",
                self.window
            ))
        })?;
        let rest = max_len - len;
        let code = self.window >> rest;
        self.window &= (1u64 << rest) - 1;
        self.window_bits = rest;

        let rank = self.tables.rank(code, len);
        let symbol = usize::try_from(rank)
            .ok()
            .and_then(|rank| self.symbols.get(rank))
            .ok_or_else(|| {
                Error::corrupted(format!(
                    "rank {rank} outside 1..={}",
                    self.symbols.len()
                ))
            })?;
        self.decoded += 1;
        self.state = DecodeState::Decoding;
        Ok(symbol)
    }

    /// Decode up to `len` symbols, stopping at the end of the block.
    ///
    /// Calls may be repeated; the concatenated output equals one call for
    /// the whole block.
    pub fn decode_message(&mut self, reader: &mut BitReader, len: usize) -> Result<Vec<u32>> {
        self.expect_decoding()?;
        let count = len.min(self.remaining());
        // Every codeword is at least one bit.
        let capacity = count.min(usize::try_from(reader.remaining_bits()).unwrap_or(usize::MAX));
        let mut message = Vec::with_capacity(capacity);
        for _ in 0..count {
            message.push(self.decode_symbol(reader)?);
        }
        Ok(message)
    }

    /// Consume the termination bits and close the block.
    ///
    /// # Errors
    /// Returns `Error::StreamCorruption` if the termination bits are not
    /// all zero and `Error::InvalidState` if symbols remain undecoded.
    pub fn decode_finish(&mut self, reader: &mut BitReader) -> Result<()> {
        self.expect_decoding()?;
        if self.decoded != self.message_length {
            return Err(Error::InvalidState {
                expected: "all declared symbols decoded",
                actual: "symbols remaining",
            });
        }
        let max_len = self.tables.max_len();
        self.refill(reader, max_len)?;
        if self.window != 0 {
            return Err(Error::corrupted(format!(
                "termination bits {:#b} are not zero",
                self.window
            )));
        }
        self.window_bits = 0;
        self.state = DecodeState::Finished;
        Ok(())
    }

    fn refill(&mut self, reader: &mut BitReader, max_len: u32) -> Result<()> {
        let need = max_len - self.window_bits;
        if need > 0 {
            self.window = (self.window << need) | u64::from(reader.read_bits(need)?);
            self.window_bits = max_len;
        }
        Ok(())
    }

    fn expect_decoding(&self) -> Result<()> {
        match self.state {
            DecodeState::TablesBuilt | DecodeState::Decoding => Ok(()),
            other => Err(Error::InvalidState {
                expected: "tables built",
                actual: other.name(),
            }),
        }
    }
}

impl Default for HuffmanDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn read_prelude(reader: &mut BitReader) -> Result<Prelude> {
    let message_length = decode_delta(reader)?;
    let max_symbol = decode_delta(reader)?;
    let distinct = decode_delta(reader)?;
    let max_len = decode_delta(reader)?;

    let word_bits = reader.config().word_bits();
    if max_len >= word_bits {
        return Err(Error::corrupted(format!(
            "codeword length {max_len} does not fit the {word_bits}-bit word width"
        )));
    }
    let empty = distinct == 0;
    if empty != (message_length == 0) || empty != (max_len == 0) {
        return Err(Error::corrupted(format!(
            "inconsistent prelude: {message_length} symbols, {distinct} distinct, max length {max_len}"
        )));
    }
    if distinct > message_length
        || u64::from(distinct) > u64::from(max_symbol) + 1
        || u64::from(distinct) > 1u64 << max_len
    {
        return Err(Error::corrupted(format!(
            "{distinct} distinct symbols impossible with {message_length} symbols, \
             max symbol {max_symbol} and max length {max_len}"
        )));
    }
    // Each distinct symbol needs at least one length bit.
    let remaining = reader.remaining_bits();
    if u64::from(distinct) > remaining {
        return Err(Error::InputExhausted {
            requested: u64::from(distinct),
            remaining,
        });
    }

    let alphabet = interpolative::decode(reader, distinct as usize)?;
    if alphabet.windows(2).any(|w| w[0] >= w[1]) {
        return Err(Error::corrupted("sub-alphabet is not strictly increasing"));
    }
    if alphabet.last().is_some_and(|&last| last > max_symbol) {
        return Err(Error::corrupted(format!(
            "sub-alphabet exceeds max symbol {max_symbol}"
        )));
    }

    let mut lengths = Vec::with_capacity(alphabet.len());
    for _ in 0..alphabet.len() {
        let delta = decode_unary(reader)?;
        if delta > u64::from(max_len) {
            return Err(Error::corrupted(format!(
                "length delta {delta} exceeds max length {max_len}"
            )));
        }
        lengths.push((u64::from(max_len) + 1 - delta) as u8);
    }

    debug!(
        "huffman prelude: {message_length} symbols, {distinct} distinct, \
         max symbol {max_symbol}, max length {max_len}"
    );
    Ok(Prelude {
        message_length,
        max_symbol,
        max_len,
        alphabet,
        lengths,
    })
}
