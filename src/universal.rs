//! Universal prefix codes.
//!
//! | Arg | unary | γ      | δ       |
//! |-----|------:|-------:|--------:|
//! | 0   |     - |      1 |       1 |
//! | 1   |     1 |    010 |    0100 |
//! | 2   |    01 |    011 |    0101 |
//! | 3   |   001 |  00100 |   01100 |
//! | 4   |  0001 |  00101 |   01101 |
//!
//! Unary codes positive integers: `n` is written as `n - 1` zeros and a one.
//! Gamma and delta accept any non-negative 32-bit value `x` by coding `x + 1`.
//! Bounded binary codes a value inside a known inclusive range with a
//! truncated binary code, so ranges that are not a power of two waste less
//! than one bit.

use crate::bitstream::{BitReader, BitWriter};
use crate::error::{Error, Result};

/// Bit length of `n` (position of the highest set bit, plus one).
#[inline]
fn bit_width(n: u64) -> u32 {
    u64::BITS - n.leading_zeros()
}

// ---------------------------------------------------------------------------
// Unary
// ---------------------------------------------------------------------------

/// Write `n >= 1` in unary.
///
/// # Errors
/// Returns `Error::InvalidParameter` if `n` is 0.
pub fn encode_unary(writer: &mut BitWriter, n: u64) -> Result<()> {
    if n == 0 {
        return Err(Error::invalid_parameter("unary code requires n >= 1"));
    }
    writer.write_zeros(n - 1)?;
    writer.write_bit(true)
}

/// Read a unary-coded positive integer.
pub fn decode_unary(reader: &mut BitReader) -> Result<u64> {
    let mut n = 1u64;
    while !reader.read_bit()? {
        n += 1;
    }
    Ok(n)
}

/// Length in bits of the unary code for `n`.
pub fn len_unary(n: u64) -> u64 {
    n
}

// ---------------------------------------------------------------------------
// Elias gamma
// ---------------------------------------------------------------------------

fn encode_gamma_positive(writer: &mut BitWriter, n: u64) -> Result<()> {
    let low_bits = bit_width(n) - 1;
    encode_unary(writer, u64::from(low_bits) + 1)?;
    writer.write_long(n, low_bits)
}

fn decode_gamma_positive(reader: &mut BitReader) -> Result<u64> {
    let low_bits = decode_unary(reader)? - 1;
    if low_bits > 32 {
        return Err(Error::corrupted(format!(
            "gamma prefix of {low_bits} bits exceeds the 32-bit domain"
        )));
    }
    let low_bits = low_bits as u32;
    Ok((1u64 << low_bits) | reader.read_long(low_bits)?)
}

/// Write a non-negative value with the Elias gamma code.
pub fn encode_gamma(writer: &mut BitWriter, x: u32) -> Result<()> {
    encode_gamma_positive(writer, u64::from(x) + 1)
}

/// Read an Elias gamma coded value.
pub fn decode_gamma(reader: &mut BitReader) -> Result<u32> {
    to_domain(decode_gamma_positive(reader)? - 1, "gamma")
}

/// Length in bits of the gamma code for `x`.
pub fn len_gamma(x: u32) -> u64 {
    u64::from(2 * bit_width(u64::from(x) + 1) - 1)
}

// ---------------------------------------------------------------------------
// Elias delta
// ---------------------------------------------------------------------------

/// Write a non-negative value with the Elias delta code.
pub fn encode_delta(writer: &mut BitWriter, x: u32) -> Result<()> {
    let n = u64::from(x) + 1;
    let width = bit_width(n);
    encode_gamma_positive(writer, u64::from(width))?;
    writer.write_long(n, width - 1)
}

/// Read an Elias delta coded value.
pub fn decode_delta(reader: &mut BitReader) -> Result<u32> {
    let width = decode_gamma_positive(reader)?;
    if width > 33 {
        return Err(Error::corrupted(format!(
            "delta width {width} exceeds the 32-bit domain"
        )));
    }
    let low_bits = width as u32 - 1;
    let n = (1u64 << low_bits) | reader.read_long(low_bits)?;
    to_domain(n - 1, "delta")
}

/// Length in bits of the delta code for `x`.
pub fn len_delta(x: u32) -> u64 {
    let width = bit_width(u64::from(x) + 1);
    u64::from(2 * bit_width(u64::from(width)) - 1) + u64::from(width - 1)
}

fn to_domain(value: u64, code: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| Error::corrupted(format!("{code} value {value} exceeds the 32-bit domain")))
}

// ---------------------------------------------------------------------------
// Bounded binary
// ---------------------------------------------------------------------------

/// Truncated binary parameters for a range of `size` values:
/// the short width `k` and the count `u` of values that get `k` bits.
#[inline]
fn truncated_params(size: u64) -> (u32, u64) {
    let k = bit_width(size) - 1;
    let short = (1u64 << (k + 1)) - size;
    (k, short)
}

fn check_range(low: u32, high: u32) -> Result<()> {
    if low > high {
        return Err(Error::invalid_parameter(format!(
            "empty range [{low}, {high}]"
        )));
    }
    Ok(())
}

/// Write `value`, known to lie in `[low, high]`.
///
/// Spends `⌊log2(size)⌋` or `⌈log2(size)⌉` bits where `size = high - low + 1`,
/// and nothing at all when the range holds a single value.
pub fn encode_binary_low_high(writer: &mut BitWriter, value: u32, low: u32, high: u32) -> Result<()> {
    check_range(low, high)?;
    if value < low || value > high {
        return Err(Error::invalid_parameter(format!(
            "value {value} outside range [{low}, {high}]"
        )));
    }
    let size = u64::from(high - low) + 1;
    if size == 1 {
        return Ok(());
    }
    let (k, short) = truncated_params(size);
    let offset = u64::from(value - low);
    if offset < short {
        writer.write_long(offset, k)
    } else {
        writer.write_long(offset + short, k + 1)
    }
}

/// Read a value known to lie in `[low, high]`.
pub fn decode_binary_low_high(reader: &mut BitReader, low: u32, high: u32) -> Result<u32> {
    if low > high {
        return Err(Error::corrupted(format!(
            "bounded binary range [{low}, {high}] is empty"
        )));
    }
    let size = u64::from(high - low) + 1;
    if size == 1 {
        return Ok(low);
    }
    let (k, short) = truncated_params(size);
    let mut offset = reader.read_long(k)?;
    if offset >= short {
        offset = ((offset << 1) | u64::from(reader.read_bit()?)) - short;
    }
    if offset >= size {
        return Err(Error::corrupted(format!(
            "bounded binary offset {offset} outside range of {size} values"
        )));
    }
    Ok(low + offset as u32)
}

/// Length in bits of the bounded binary code for `value` in `[low, high]`.
pub fn len_binary_low_high(value: u32, low: u32, high: u32) -> u64 {
    let size = u64::from(high.saturating_sub(low)) + 1;
    if size == 1 {
        return 0;
    }
    let (k, short) = truncated_params(size);
    if u64::from(value.saturating_sub(low)) < short {
        u64::from(k)
    } else {
        u64::from(k) + 1
    }
}
