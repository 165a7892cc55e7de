//! Binary interpolative coding.
//!
//! A strictly increasing sequence is coded by writing its global bounds with
//! the gamma code, then recursively writing the middle element of each
//! sub-range with a bounded binary code. The bounds of a sub-range are
//! inherited from the neighbors already placed, and tightened by one for every
//! element that must still fit on either side of the midpoint:
//!
//! ```text
//! [ low ........ seq[mid] ........ high ]
//!   ^ `before` elements   ^ `after` elements
//! seq[mid] ∈ [low + before, high - after]
//! ```
//!
//! Dense runs cost nothing: once a sub-range has exactly as many candidate
//! values as elements, every remaining value is implied.
//!
//! [`encode`]/[`decode`] accept arbitrary gap sequences by coding their prefix
//! sums; every gap after the first must be at least one so the sums stay
//! strictly increasing. Sorted sets of distinct values (such as the
//! sub-alphabet of a Huffman block) satisfy this directly.

use crate::bitstream::{BitReader, BitWriter};
use crate::error::{Error, Result};
use crate::universal::{decode_binary_low_high, decode_gamma, encode_binary_low_high, encode_gamma};

/// Write `values` by interpolative coding of their prefix sums.
///
/// # Errors
/// Returns `Error::InvalidParameter` if an element after the first is zero
/// or the prefix sums overflow 32 bits.
pub fn encode(writer: &mut BitWriter, values: &[u32]) -> Result<()> {
    let sums = prefix_sums(values)?;
    encode_increasing(writer, &sums)
}

/// Read `count` values written by [`encode`].
pub fn decode(reader: &mut BitReader, count: usize) -> Result<Vec<u32>> {
    let mut values = decode_increasing(reader, count)?;
    for i in (1..values.len()).rev() {
        values[i] -= values[i - 1];
    }
    Ok(values)
}

/// Write a strictly increasing sequence.
pub fn encode_increasing(writer: &mut BitWriter, seq: &[u32]) -> Result<()> {
    if let Some(i) = seq.windows(2).position(|w| w[0] >= w[1]) {
        return Err(Error::invalid_parameter(format!(
            "sequence is not strictly increasing at index {}",
            i + 1
        )));
    }
    let (low, high) = match (seq.first(), seq.last()) {
        (Some(&low), Some(&high)) => (low, high),
        _ => (0, 0),
    };
    encode_gamma(writer, low)?;
    encode_gamma(writer, high)?;
    encode_range(writer, seq, low, high)
}

/// Read a strictly increasing sequence of `count` values.
pub fn decode_increasing(reader: &mut BitReader, count: usize) -> Result<Vec<u32>> {
    let low = decode_gamma(reader)?;
    let high = decode_gamma(reader)?;
    if count == 0 {
        return Ok(Vec::new());
    }
    if low > high || u64::from(high - low) + 1 < count as u64 {
        return Err(Error::corrupted(format!(
            "interpolative bounds [{low}, {high}] cannot hold {count} distinct values"
        )));
    }
    let mut seq = vec![0u32; count];
    decode_range(reader, &mut seq, low, high)?;
    Ok(seq)
}

fn prefix_sums(values: &[u32]) -> Result<Vec<u32>> {
    let mut sums = Vec::with_capacity(values.len());
    let mut acc = 0u32;
    for (i, &v) in values.iter().enumerate() {
        if i > 0 && v == 0 {
            return Err(Error::invalid_parameter(format!(
                "element {i} is zero; gaps after the first must be positive"
            )));
        }
        acc = acc
            .checked_add(v)
            .ok_or_else(|| Error::invalid_parameter("prefix sums overflow 32 bits"))?;
        sums.push(acc);
    }
    Ok(sums)
}

/// Midpoint index and the element counts on either side of it.
#[inline]
fn split(len: usize) -> (usize, u32, u32) {
    let mid = (len + 1) / 2 - 1;
    (mid, mid as u32, (len - mid - 1) as u32)
}

fn encode_range(writer: &mut BitWriter, seq: &[u32], low: u32, high: u32) -> Result<()> {
    if seq.is_empty() {
        return Ok(());
    }
    let (mid, before, after) = split(seq.len());
    let value = seq[mid];
    encode_binary_low_high(writer, value, low + before, high - after)?;
    if before > 0 {
        encode_range(writer, &seq[..mid], low, value - 1)?;
    }
    if after > 0 {
        encode_range(writer, &seq[mid + 1..], value + 1, high)?;
    }
    Ok(())
}

fn decode_range(reader: &mut BitReader, out: &mut [u32], low: u32, high: u32) -> Result<()> {
    if out.is_empty() {
        return Ok(());
    }
    let (mid, before, after) = split(out.len());
    let (Some(lo), Some(hi)) = (low.checked_add(before), high.checked_sub(after)) else {
        return Err(Error::corrupted(format!(
            "interpolative range [{low}, {high}] too narrow for {} values",
            out.len()
        )));
    };
    let value = decode_binary_low_high(reader, lo, hi)?;
    out[mid] = value;
    let (left, right) = out.split_at_mut(mid);
    if before > 0 {
        decode_range(reader, left, low, value - 1)?;
    }
    if after > 0 {
        decode_range(reader, &mut right[1..], value + 1, high)?;
    }
    Ok(())
}
