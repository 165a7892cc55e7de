//! # Quality-Score Codecs
//!
//! *Self-describing canonical Huffman blocks and integer codes for FASTQ quality scores.*
//!
//! ## Intuition First
//!
//! A quality line from a sequencer is a string of a few dozen distinct ASCII
//! characters, heavily skewed toward a handful of values. Within one block of
//! reads, some scores never occur at all. A good coder should pay nothing
//! for the values a block does not use, and should give the common values
//! codes a bit or two long.
//!
//! This crate codes each block with its own canonical Huffman code. The code
//! is described by a compact prelude (which symbols occur, and how long each
//! codeword is), so blocks can be decoded independently.
//!
//! ## The Problem
//!
//! Sending a Huffman code naively costs more than it saves on small blocks:
//! - **Explicit trees**: one pointer per node, and a tree walk per bit at decode time.
//! - **Full length tables**: one length per possible symbol, most of them zero.
//!
//! Canonical codes need only the length of each used symbol. The used symbols
//! form a sorted set, which interpolative coding stores in a few bits each,
//! and often in none when the set is a dense run.
//!
//! ## Historical Context
//!
//! ```text
//! 1952  Huffman          Minimum-redundancy prefix codes
//! 1966  Golomb           Run-length codes for geometric sources
//! 1975  Elias            Universal codes for the integers (gamma, delta)
//! 1979  Rice             Power-of-two Golomb codes
//! 1995  Moffat, Katajainen  In-place minimum-redundancy code lengths
//! 1997  Moffat, Turpin   Table-driven canonical Huffman decoding
//! 2000  Moffat, Stuiver  Binary interpolative coding
//! ```
//!
//! ## Mathematical Formulation
//!
//! Let $n_\ell$ be the number of codewords of length $\ell$ and $L$ the
//! longest length. Canonical codewords of each length are contiguous:
//!
//! ```text
//! base[1]   = 0
//! base[l]   = (base[l-1] + n[l-1]) << 1
//! limit[l]  = (base[l] + n[l]) << (L - l)
//! ```
//!
//! A window $V$ of the next $L$ bits holds a codeword of length $\ell$ exactly
//! when $\ell$ is the smallest length with $V < \mathrm{limit}[\ell]$.
//!
//! ## Complexity Analysis
//!
//! - **Code construction**: $O(n \log n)$ for the frequency sort, $O(n)$ for lengths.
//! - **Decoding**: $O(L)$ comparisons per symbol, no tree.
//! - **Prelude**: $O(d \log(u/d))$ bits for $d$ used symbols out of $u$.
//!
//! ## Failure Modes
//!
//! 1. **Truncated input**: reads past the end fail with [`Error::InputExhausted`].
//! 2. **Corrupt blocks**: impossible preludes, unmatched windows and non-zero
//!    termination bits fail with [`Error::StreamCorruption`].
//! 3. **Deep codes**: skewed frequencies can produce codewords wider than the
//!    word width; the encoder limits lengths to 31 bits (or a caller-chosen limit).
//!
//! ## Implementation Notes
//!
//! This crate provides:
//! - **[`bitstream`]**: MSB-first bit writer and reader with explicit word width.
//! - **[`universal`]**: unary, Elias gamma and delta, and bounded binary codes.
//! - **[`rice`]**: Rice codes with an out-of-band parameter.
//! - **[`interpolative`]**: binary interpolative coding of increasing sequences.
//! - **[`huffman`]**: canonical Huffman blocks with resumable encode and decode.
//! - **[`stats`]** and **[`qscores`]**: the data model feeding the coder.
//!
//! ## References
//!
//! - Moffat, A., & Katajainen, J. (1995). "In-place calculation of minimum-redundancy codes."
//! - Moffat, A., & Turpin, A. (1997). "On the implementation of minimum redundancy prefix codes."
//! - Moffat, A., & Stuiver, L. (2000). "Binary interpolative coding for effective index compression."
//! - Wan, R., Anh, V. N., & Asai, K. (2012). "Transformations for the compression of FASTQ quality scores of next-generation sequencing data."

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bitstream;
pub mod error;
pub mod huffman;
pub mod interpolative;
pub mod qscores;
pub mod rice;
pub mod stats;
pub mod universal;

pub use bitstream::{BitConfig, BitReader, BitWriter};
pub use error::{Error, Result};
pub use huffman::{decode_block, encode_block, DecodeState, HuffmanDecoder, HuffmanEncoder};
pub use qscores::{QScoreFormat, QualityScores};
pub use stats::BlockStatistics;
