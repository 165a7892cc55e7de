//! Rice (power-of-two Golomb) coding.
//!
//! A value `x` is split into a quotient `x >> k`, written in unary as
//! `quotient + 1` so that a zero quotient still has a terminator, and the low
//! `k` bits of `x`, written verbatim. With `k = 0` the code degenerates to
//! unary of `x + 1`.
//!
//! The parameter `k` travels out of band: no header is written.

use crate::bitstream::{BitReader, BitWriter};
use crate::error::{Error, Result};
use crate::universal::{decode_unary, encode_unary};

fn check_k(k: u32, word_bits: u32) -> Result<()> {
    if k >= word_bits {
        return Err(Error::invalid_parameter(format!(
            "Rice parameter k = {k} must be below the {word_bits}-bit word width"
        )));
    }
    Ok(())
}

#[inline]
fn low_bits(value: u32, k: u32) -> u32 {
    if k == 0 {
        0
    } else {
        value & ((1u32 << k) - 1)
    }
}

/// Write `value` with Rice parameter `k`.
///
/// # Errors
/// Returns `Error::InvalidParameter` if `k` is not below the writer's word width.
pub fn encode(writer: &mut BitWriter, value: u32, k: u32) -> Result<()> {
    check_k(k, writer.config().word_bits())?;
    encode_unary(writer, u64::from(value >> k) + 1)?;
    writer.write_bits(low_bits(value, k), k)
}

/// Read a value written with Rice parameter `k`.
pub fn decode(reader: &mut BitReader, k: u32) -> Result<u32> {
    check_k(k, reader.config().word_bits())?;
    let quotient = decode_unary(reader)? - 1;
    if quotient > u64::from(u32::MAX >> k) {
        return Err(Error::corrupted(format!(
            "Rice quotient {quotient} with k = {k} exceeds the 32-bit domain"
        )));
    }
    let low = reader.read_bits(k)?;
    Ok(((quotient as u32) << k) | low)
}

/// Write every value in `values` with the same parameter.
pub fn encode_all(writer: &mut BitWriter, values: &[u32], k: u32) -> Result<()> {
    check_k(k, writer.config().word_bits())?;
    for &value in values {
        encode(writer, value, k)?;
    }
    Ok(())
}

/// Read `count` values written with the same parameter.
pub fn decode_all(reader: &mut BitReader, count: usize, k: u32) -> Result<Vec<u32>> {
    check_k(k, reader.config().word_bits())?;
    let mut values = Vec::with_capacity(count.min(reader.remaining_bits() as usize));
    for _ in 0..count {
        values.push(decode(reader, k)?);
    }
    Ok(values)
}

/// Length in bits of the Rice code for `value` with parameter `k` (`k < 32`).
pub fn len_rice(value: u32, k: u32) -> u64 {
    u64::from(value >> k) + 1 + u64::from(k)
}

/// The parameter below `word_bits` that minimizes the total coded length of `values`.
///
/// Ties resolve to the smaller `k`. An empty input yields 0.
pub fn optimal_k(values: &[u32], word_bits: u32) -> u32 {
    let mut best = (u64::MAX, 0);
    for k in 0..word_bits.min(u32::BITS) {
        let total = values
            .iter()
            .fold(0u64, |acc, &v| acc.saturating_add(len_rice(v, k)));
        if total < best.0 {
            best = (total, k);
        }
    }
    best.1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitstream::BitConfig;
    use proptest::prelude::*;

    #[test]
    fn test_k_zero_is_unary() {
        let mut writer = BitWriter::new();
        encode(&mut writer, 4, 0).unwrap();
        assert_eq!(writer.bits_written(), 5);
        // 0000 1 -> 0b0000_1000
        assert_eq!(writer.finish().unwrap(), vec![0b0000_1000]);
    }

    #[test]
    fn test_zero_quotient_keeps_terminator() {
        // x < 2^k still writes the one-bit unary terminator before the remainder.
        let mut writer = BitWriter::new();
        encode(&mut writer, 5, 3).unwrap();
        assert_eq!(writer.bits_written(), 4);
        assert_eq!(writer.finish().unwrap(), vec![0b1101_0000]);

        let mut writer = BitWriter::new();
        encode(&mut writer, 0, 0).unwrap();
        assert_eq!(writer.bits_written(), 1);
    }

    #[test]
    fn test_known_codeword() {
        // 19 = 0b10011, k = 2: quotient 4 -> unary(5) = 00001, remainder 11.
        let mut writer = BitWriter::new();
        encode(&mut writer, 19, 2).unwrap();
        assert_eq!(writer.bits_written(), len_rice(19, 2));
        let bytes = writer.finish().unwrap();
        assert_eq!(bytes, vec![0b0000_1110]);
        let mut reader = BitReader::new(&bytes);
        assert_eq!(decode(&mut reader, 2).unwrap(), 19);
    }

    #[test]
    fn test_k_must_be_below_word_width() {
        let mut writer = BitWriter::new();
        assert!(matches!(
            encode(&mut writer, 1, 32),
            Err(Error::InvalidParameter(_))
        ));
        encode(&mut writer, u32::MAX, 31).unwrap();

        let narrow = BitConfig::new(8).unwrap();
        let mut writer = BitWriter::with_config(narrow);
        assert!(encode(&mut writer, 1, 8).is_err());
        let bytes = [0xFF];
        let mut reader = BitReader::with_config(&bytes, narrow);
        assert!(decode(&mut reader, 8).is_err());
    }

    #[test]
    fn test_extreme_values() {
        let mut writer = BitWriter::new();
        encode(&mut writer, u32::MAX, 31).unwrap();
        encode(&mut writer, u32::MAX, 24).unwrap();
        encode(&mut writer, 0, 31).unwrap();
        let bytes = writer.finish().unwrap();
        let mut reader = BitReader::new(&bytes);
        assert_eq!(decode(&mut reader, 31).unwrap(), u32::MAX);
        assert_eq!(decode(&mut reader, 24).unwrap(), u32::MAX);
        assert_eq!(decode(&mut reader, 31).unwrap(), 0);
    }

    #[test]
    fn test_overflowing_quotient_is_corruption() {
        // Quotient 2 with k = 31 would need 33 bits.
        let mut writer = BitWriter::new();
        encode_unary(&mut writer, 3).unwrap();
        writer.write_zeros(31).unwrap();
        let bytes = writer.finish().unwrap();
        let mut reader = BitReader::new(&bytes);
        assert!(matches!(
            decode(&mut reader, 31),
            Err(Error::StreamCorruption(_))
        ));
    }

    #[test]
    fn test_optimal_k() {
        assert_eq!(optimal_k(&[], 32), 0);
        assert_eq!(optimal_k(&[0, 0, 1, 0], 32), 0);
        // Values around 100 are best served by k = 5 or 6.
        let values = [90, 110, 95, 105, 100, 120, 80];
        let k = optimal_k(&values, 32);
        let cost = |k| values.iter().map(|&v| len_rice(v, k)).sum::<u64>();
        for other in 0..32 {
            assert!(cost(k) <= cost(other));
        }
        assert!((5..=6).contains(&k));
    }

    proptest! {
        #[test]
        fn prop_rice_roundtrip(
            values in prop::collection::vec(0u32..1_000_000, 0..80),
            k in 0u32..32,
        ) {
            // Keep unary runs short for large values with small k.
            let values: Vec<u32> = values.into_iter().map(|v| v.min(4096u32 << k.min(19))).collect();
            let mut writer = BitWriter::new();
            encode_all(&mut writer, &values, k).unwrap();
            let expected_bits: u64 = values.iter().map(|&v| len_rice(v, k)).sum();
            prop_assert_eq!(writer.bits_written(), expected_bits);
            let bytes = writer.finish().unwrap();
            let mut reader = BitReader::new(&bytes);
            prop_assert_eq!(decode_all(&mut reader, values.len(), k).unwrap(), values);
        }
    }
}
