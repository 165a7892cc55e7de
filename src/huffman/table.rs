//! Canonical code tables derived from a codeword-length histogram.
//!
//! Codewords of one length occupy a contiguous numeric range that starts
//! where the previous length's range ended, doubled. Shorter codewords are
//! therefore numerically smaller than any left-justified longer codeword,
//! which lets the decoder find a codeword's length by comparing a
//! `max_len`-bit window against one threshold per length.

use crate::error::{Error, Result};

/// Per-length tables for one block. Index 0 of every table is unused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalTables {
    max_len: u32,
    counts: Vec<u32>,
    base: Vec<u64>,
    offset: Vec<u32>,
    lj_limit: Vec<u64>,
}

impl CanonicalTables {
    /// Build tables from the number of codewords of each length.
    ///
    /// `counts[len]` is the number of symbols with a `len`-bit codeword;
    /// `counts[0]` is ignored. Ranks start at 1 because rank 0 is the
    /// sentinel slot of the symbols-used list.
    ///
    /// # Errors
    /// Returns `Error::StreamCorruption` if the histogram oversubscribes the
    /// code space.
    pub fn from_histogram(counts: &[u32], max_len: u32) -> Result<Self> {
        let size = max_len as usize + 1;
        let mut hist = vec![0u32; size];
        for (len, &count) in counts.iter().enumerate().skip(1) {
            if count == 0 {
                continue;
            }
            if len > max_len as usize {
                return Err(Error::corrupted(format!(
                    "{count} codewords of length {len} exceed maximum length {max_len}"
                )));
            }
            hist[len] = count;
        }

        let mut base = vec![0u64; size];
        let mut offset = vec![0u32; size];
        let mut lj_limit = vec![0u64; size];
        for len in 1..size {
            if len == 1 {
                offset[1] = 1;
            } else {
                base[len] = (base[len - 1] + u64::from(hist[len - 1])) << 1;
                offset[len] = offset[len - 1] + hist[len - 1];
            }
            let end = base[len] + u64::from(hist[len]);
            if end > 1u64 << len {
                return Err(Error::corrupted(format!(
                    "codeword lengths oversubscribe the code space at length {len}"
                )));
            }
            lj_limit[len] = end << (max_len as usize - len);
        }

        Ok(Self {
            max_len,
            counts: hist,
            base,
            offset,
            lj_limit,
        })
    }

    /// Build tables from the codeword length of every used symbol.
    pub fn from_lengths<I>(lengths: I, max_len: u32) -> Result<Self>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut counts = vec![0u32; max_len as usize + 1];
        for len in lengths {
            if len == 0 || len > max_len {
                return Err(Error::corrupted(format!(
                    "codeword length {len} outside 1..={max_len}"
                )));
            }
            counts[len as usize] += 1;
        }
        Self::from_histogram(&counts, max_len)
    }

    /// Longest codeword length.
    pub fn max_len(&self) -> u32 {
        self.max_len
    }

    /// Number of codewords of each length.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Numeric value of the first codeword of each length.
    pub fn base(&self) -> &[u64] {
        &self.base
    }

    /// Rank of the first symbol of each length.
    pub fn offset(&self) -> &[u32] {
        &self.offset
    }

    /// Left-justified exclusive upper bound of each length's codewords.
    pub fn lj_limit(&self) -> &[u64] {
        &self.lj_limit
    }

    /// Assign canonical ranks to `symbols` (ascending by value).
    ///
    /// Within a length, ranks follow the order of `symbols`. The returned
    /// ranks are parallel to `symbols`.
    pub fn assign_ranks<F>(&self, symbols: &[u32], length_of: F) -> Vec<u32>
    where
        F: Fn(u32) -> u32,
    {
        let mut cursor = self.offset.clone();
        symbols
            .iter()
            .map(|&sym| {
                let len = length_of(sym) as usize;
                let rank = cursor[len];
                cursor[len] += 1;
                rank
            })
            .collect()
    }

    /// Codeword value for the symbol at `rank` with a `len`-bit code.
    pub fn codeword(&self, rank: u32, len: u32) -> u64 {
        let len = len as usize;
        self.base[len] + u64::from(rank - self.offset[len])
    }

    /// Length of the codeword at the top of a `max_len`-bit window, if any.
    #[inline]
    pub fn length_for_window(&self, window: u64) -> Option<u32> {
        (1..=self.max_len).find(|&len| window < self.lj_limit[len as usize])
    }

    /// Rank of the `len`-bit codeword `code`.
    #[inline]
    pub fn rank(&self, code: u64, len: u32) -> u64 {
        let len = len as usize;
        code - self.base[len] + u64::from(self.offset[len])
    }
}

impl Default for CanonicalTables {
    /// Tables of an empty block.
    fn default() -> Self {
        Self {
            max_len: 0,
            counts: vec![0],
            base: vec![0],
            offset: vec![0],
            lj_limit: vec![0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_for_lengths_1_2_2() {
        let tables = CanonicalTables::from_lengths([1, 2, 2], 2).unwrap();
        assert_eq!(tables.counts(), &[0, 1, 2]);
        assert_eq!(tables.base(), &[0, 0, 2]);
        assert_eq!(tables.offset(), &[0, 1, 2]);
        assert_eq!(tables.lj_limit(), &[0, 2, 4]);
        // 0 -> len 1; 10, 11 -> len 2
        assert_eq!(tables.length_for_window(0b01), Some(1));
        assert_eq!(tables.length_for_window(0b10), Some(2));
        assert_eq!(tables.rank(0b11, 2), 3);
    }

    #[test]
    fn test_gap_in_histogram() {
        // Lengths 1 and 3 only: length 2 is empty, so its limit repeats length 1's.
        let tables = CanonicalTables::from_lengths([1, 3, 3], 3).unwrap();
        assert_eq!(tables.base(), &[0, 0, 2, 4]);
        assert_eq!(tables.lj_limit(), &[0, 4, 4, 6]);
        assert_eq!(tables.length_for_window(0b100), Some(3));
        // An incomplete code leaves windows with no codeword.
        assert_eq!(tables.length_for_window(0b110), None);
    }

    #[test]
    fn test_limits_increase_over_used_lengths() {
        let lengths = [2, 2, 3, 3, 3, 4, 5, 5];
        let tables = CanonicalTables::from_lengths(lengths, 5).unwrap();
        let used: Vec<u64> = (1..=5)
            .filter(|&len| tables.counts()[len] > 0)
            .map(|len| tables.lj_limit()[len])
            .collect();
        assert!(used.windows(2).all(|w| w[0] < w[1]));
        assert!(tables.lj_limit().windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(tables.lj_limit()[5], 32);
    }

    #[test]
    fn test_oversubscribed_rejected() {
        assert!(matches!(
            CanonicalTables::from_lengths([1, 1, 1], 1),
            Err(Error::StreamCorruption(_))
        ));
        assert!(CanonicalTables::from_lengths([0], 3).is_err());
        assert!(CanonicalTables::from_lengths([4], 3).is_err());
    }

    #[test]
    fn test_rank_assignment_and_codewords() {
        // Symbols ascending by value, with their lengths.
        let symbols = [5, 9, 42, 50];
        let length_of = |s: u32| match s {
            9 => 1,
            5 | 42 => 3,
            _ => 2,
        };
        let tables = CanonicalTables::from_lengths(symbols.iter().map(|&s| length_of(s)), 3).unwrap();
        let ranks = tables.assign_ranks(&symbols, length_of);
        assert_eq!(ranks, vec![3, 1, 4, 2]);
        let codes: Vec<u64> = symbols
            .iter()
            .zip(&ranks)
            .map(|(&s, &r)| tables.codeword(r, length_of(s)))
            .collect();
        // 9: 0, 50: 10, 5: 110, 42: 111
        assert_eq!(codes, vec![0b110, 0b0, 0b111, 0b10]);
    }

    #[test]
    fn test_empty_tables() {
        let tables = CanonicalTables::from_lengths(std::iter::empty(), 0).unwrap();
        assert_eq!(tables, CanonicalTables::default());
        assert_eq!(tables.max_len(), 0);
        assert_eq!(tables.length_for_window(0), None);
    }
}
