//! Bit-level reader and writer over an in-memory byte buffer.
//!
//! Fields are packed most-significant bit first and may straddle byte
//! boundaries. A single read or write carries at most `word_bits - 1` bits;
//! the `*_long` helpers split wider fields into legal chunks.
//!
//! Reads never wrap or zero-fill: asking for more bits than remain fails with
//! [`Error::InputExhausted`].

use std::io::Cursor;

use bitstream_io::{BigEndian, BitRead, BitWrite};

use crate::error::{Error, Result};

/// Default word width of the numeric domain, in bits.
pub const WORD_BITS: u32 = 32;

/// Word-width assumptions shared by a writer/reader pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitConfig {
    word_bits: u32,
}

impl BitConfig {
    /// Create a configuration for a `word_bits`-wide numeric domain (2..=32).
    pub fn new(word_bits: u32) -> Result<Self> {
        if !(2..=WORD_BITS).contains(&word_bits) {
            return Err(Error::invalid_parameter(format!(
                "word width must be in 2..={WORD_BITS}, got {word_bits}"
            )));
        }
        Ok(Self { word_bits })
    }

    /// Width of the numeric domain in bits.
    pub fn word_bits(&self) -> u32 {
        self.word_bits
    }

    /// Widest field a single `write_bits`/`read_bits` call may carry.
    pub fn max_field_bits(&self) -> u32 {
        self.word_bits - 1
    }

    fn check_width(&self, n: u32) -> Result<()> {
        if n >= self.word_bits {
            return Err(Error::invalid_parameter(format!(
                "field of {n} bits does not fit below the {}-bit word width",
                self.word_bits
            )));
        }
        Ok(())
    }
}

impl Default for BitConfig {
    fn default() -> Self {
        Self {
            word_bits: WORD_BITS,
        }
    }
}

#[inline]
fn low_mask(n: u32) -> u32 {
    // n < 32 is guaranteed by check_width
    (1u32 << n) - 1
}

/// Appends bit fields to a growable byte buffer.
pub struct BitWriter {
    inner: bitstream_io::BitWriter<Vec<u8>, BigEndian>,
    config: BitConfig,
    bits_written: u64,
}

impl BitWriter {
    /// Create a writer with the default 32-bit word width.
    pub fn new() -> Self {
        Self::with_config(BitConfig::default())
    }

    /// Create a writer with an explicit word width.
    pub fn with_config(config: BitConfig) -> Self {
        Self {
            inner: bitstream_io::BitWriter::endian(Vec::new(), BigEndian),
            config,
            bits_written: 0,
        }
    }

    /// Word-width configuration of this writer.
    pub fn config(&self) -> BitConfig {
        self.config
    }

    /// Append the lowest `n` bits of `value`, most significant first.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` if `n` is not below the word width.
    pub fn write_bits(&mut self, value: u32, n: u32) -> Result<()> {
        self.config.check_width(n)?;
        if n == 0 {
            return Ok(());
        }
        self.inner.write(n, value & low_mask(n))?;
        self.bits_written += u64::from(n);
        Ok(())
    }

    /// Append a single bit.
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        self.write_bits(u32::from(bit), 1)
    }

    /// Append the lowest `n` bits of `value` (`n <= 64`), split into legal chunks.
    pub fn write_long(&mut self, value: u64, n: u32) -> Result<()> {
        if n > 64 {
            return Err(Error::invalid_parameter(format!(
                "cannot write {n} bits from a 64-bit value"
            )));
        }
        let chunk = self.config.max_field_bits();
        let mut remaining = n;
        while remaining > 0 {
            let take = remaining.min(chunk);
            remaining -= take;
            self.write_bits((value >> remaining) as u32, take)?;
        }
        Ok(())
    }

    /// Append `count` zero bits.
    pub fn write_zeros(&mut self, count: u64) -> Result<()> {
        let chunk = u64::from(self.config.max_field_bits());
        let mut remaining = count;
        while remaining > 0 {
            let take = remaining.min(chunk);
            self.write_bits(0, take as u32)?;
            remaining -= take;
        }
        Ok(())
    }

    /// Total bits appended so far.
    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    /// Cursor as (byte index, bit offset within that byte).
    pub fn position(&self) -> (usize, u32) {
        ((self.bits_written / 8) as usize, (self.bits_written % 8) as u32)
    }

    /// Zero-pad the final partial byte and return the buffer.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.inner.byte_align()?;
        Ok(self.inner.into_writer())
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumes bit fields from a borrowed byte buffer.
pub struct BitReader<'a> {
    inner: bitstream_io::BitReader<Cursor<&'a [u8]>, BigEndian>,
    config: BitConfig,
    bits_read: u64,
    bit_len: u64,
}

impl<'a> BitReader<'a> {
    /// Create a reader over `data` with the default 32-bit word width.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_config(data, BitConfig::default())
    }

    /// Create a reader over `data` with an explicit word width.
    pub fn with_config(data: &'a [u8], config: BitConfig) -> Self {
        Self {
            inner: bitstream_io::BitReader::endian(Cursor::new(data), BigEndian),
            config,
            bits_read: 0,
            bit_len: data.len() as u64 * 8,
        }
    }

    /// Restrict the readable length to the first `bit_len` bits of the buffer.
    pub fn with_bit_len(mut self, bit_len: u64) -> Result<Self> {
        if bit_len > self.bit_len {
            return Err(Error::invalid_parameter(format!(
                "bit length {bit_len} exceeds buffer capacity of {} bits",
                self.bit_len
            )));
        }
        self.bit_len = bit_len;
        Ok(self)
    }

    /// Word-width configuration of this reader.
    pub fn config(&self) -> BitConfig {
        self.config
    }

    /// Consume the next `n` bits, most significant first.
    ///
    /// # Errors
    /// Returns `Error::InputExhausted` if fewer than `n` bits remain and
    /// `Error::InvalidParameter` if `n` is not below the word width.
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        self.config.check_width(n)?;
        if n == 0 {
            return Ok(0);
        }
        self.ensure(u64::from(n))?;
        let value = self.inner.read::<u32>(n)?;
        self.bits_read += u64::from(n);
        Ok(value)
    }

    /// Consume a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Consume the next `n` bits (`n <= 64`). Fails without consuming anything
    /// if fewer than `n` bits remain.
    pub fn read_long(&mut self, n: u32) -> Result<u64> {
        if n > 64 {
            return Err(Error::invalid_parameter(format!(
                "cannot read {n} bits into a 64-bit value"
            )));
        }
        self.ensure(u64::from(n))?;
        let chunk = self.config.max_field_bits();
        let mut value = 0u64;
        let mut remaining = n;
        while remaining > 0 {
            let take = remaining.min(chunk);
            value = (value << take) | u64::from(self.read_bits(take)?);
            remaining -= take;
        }
        Ok(value)
    }

    /// Total bits consumed so far.
    pub fn bits_read(&self) -> u64 {
        self.bits_read
    }

    /// Bits still available to read.
    pub fn remaining_bits(&self) -> u64 {
        self.bit_len - self.bits_read
    }

    /// Cursor as (byte index, bit offset within that byte).
    pub fn position(&self) -> (usize, u32) {
        ((self.bits_read / 8) as usize, (self.bits_read % 8) as u32)
    }

    fn ensure(&self, n: u64) -> Result<()> {
        let remaining = self.remaining_bits();
        if n > remaining {
            return Err(Error::InputExhausted {
                requested: n,
                remaining,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_msb_first_packing() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b101, 3).unwrap();
        writer.write_bits(0b11111, 5).unwrap();
        writer.write_bits(0b1, 1).unwrap();
        assert_eq!(writer.bits_written(), 9);
        assert_eq!(writer.position(), (1, 1));
        let bytes = writer.finish().unwrap();
        assert_eq!(bytes, vec![0b1011_1111, 0b1000_0000]);
    }

    #[test]
    fn test_value_is_masked_to_width() {
        let mut writer = BitWriter::new();
        writer.write_bits(0xFFFF_FFFF, 4).unwrap();
        writer.write_bits(0, 4).unwrap();
        assert_eq!(writer.finish().unwrap(), vec![0xF0]);
    }

    #[test]
    fn test_read_across_bytes() {
        let data = [0b1011_0110, 0b0101_1100];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(reader.read_bits(7).unwrap(), 0b1011001);
        assert_eq!(reader.position(), (1, 2));
        assert_eq!(reader.read_bits(6).unwrap(), 0b011100);
        assert_eq!(reader.remaining_bits(), 0);
    }

    #[test]
    fn test_read_past_end_is_exhausted() {
        let data = [0xAB];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_bits(5).unwrap(), 0b10101);
        let err = reader.read_bits(4).unwrap_err();
        assert!(matches!(
            err,
            Error::InputExhausted {
                requested: 4,
                remaining: 3
            }
        ));
        // A failed read consumes nothing.
        assert_eq!(reader.read_bits(3).unwrap(), 0b011);
    }

    #[test]
    fn test_bit_len_limits_reads() {
        let data = [0xFF, 0xFF];
        let mut reader = BitReader::new(&data).with_bit_len(10).unwrap();
        assert_eq!(reader.read_bits(8).unwrap(), 0xFF);
        assert!(reader.read_bits(3).unwrap_err().is_exhausted());
        assert!(BitReader::new(&data).with_bit_len(17).is_err());
    }

    #[test]
    fn test_width_must_stay_below_word() {
        let mut writer = BitWriter::new();
        assert!(matches!(
            writer.write_bits(1, 32),
            Err(Error::InvalidParameter(_))
        ));
        writer.write_bits(u32::MAX, 31).unwrap();

        let narrow = BitConfig::new(8).unwrap();
        let mut writer = BitWriter::with_config(narrow);
        assert!(writer.write_bits(0, 8).is_err());
        writer.write_bits(0x7F, 7).unwrap();

        assert!(BitConfig::new(1).is_err());
        assert!(BitConfig::new(33).is_err());
    }

    #[test]
    fn test_zero_width_fields() {
        let mut writer = BitWriter::new();
        writer.write_bits(123, 0).unwrap();
        assert_eq!(writer.bits_written(), 0);
        assert!(writer.finish().unwrap().is_empty());

        let mut reader = BitReader::new(&[]);
        assert_eq!(reader.read_bits(0).unwrap(), 0);
    }

    #[test]
    fn test_long_fields_with_narrow_words() {
        let config = BitConfig::new(8).unwrap();
        let mut writer = BitWriter::with_config(config);
        writer.write_long(0x1_2345_6789, 33).unwrap();
        writer.write_zeros(20).unwrap();
        writer.write_bit(true).unwrap();
        assert_eq!(writer.bits_written(), 54);
        let bytes = writer.finish().unwrap();

        let mut reader = BitReader::with_config(&bytes, config);
        assert_eq!(reader.read_long(33).unwrap(), 0x1_2345_6789);
        assert_eq!(reader.read_long(20).unwrap(), 0);
        assert!(reader.read_bit().unwrap());
    }

    #[test]
    fn test_read_long_is_atomic_on_exhaustion() {
        let data = [0x12, 0x34];
        let mut reader = BitReader::new(&data);
        assert!(reader.read_long(17).unwrap_err().is_exhausted());
        assert_eq!(reader.bits_read(), 0);
        assert_eq!(reader.read_long(16).unwrap(), 0x1234);
    }

    proptest! {
        #[test]
        fn prop_fields_roundtrip(
            fields in prop::collection::vec((any::<u32>(), 0u32..32), 0..64),
        ) {
            let mut writer = BitWriter::new();
            for &(value, n) in &fields {
                writer.write_bits(value, n).unwrap();
            }
            let total: u64 = fields.iter().map(|&(_, n)| u64::from(n)).sum();
            prop_assert_eq!(writer.bits_written(), total);
            let bytes = writer.finish().unwrap();
            prop_assert_eq!(bytes.len() as u64, total.div_ceil(8));

            let mut reader = BitReader::new(&bytes);
            for &(value, n) in &fields {
                let expected = if n == 0 { 0 } else { value & ((1u32 << n) - 1) };
                prop_assert_eq!(reader.read_bits(n).unwrap(), expected);
            }
        }
    }
}
