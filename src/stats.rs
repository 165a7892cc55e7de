//! Per-block symbol statistics and the dense symbol-ID remap.
//!
//! Quality-score values are sparse in the ASCII range. Before Huffman
//! coding, each distinct value is given a dense ID: the most frequent value
//! becomes 0, the next 1, and so on (ties by ascending value). The coder
//! only ever sees IDs; the mapping travels with the caller.

use std::fmt;

use crate::error::{Error, Result};

/// Size of the value table before any value above the ASCII range is seen.
pub const MAX_ASCII: u32 = 0xFF;

/// Frequency table and value/ID mapping for one block of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockStatistics {
    frequencies: Vec<u32>,
    value_to_id: Vec<Option<u32>>,
    id_to_value: Vec<u32>,
}

impl BlockStatistics {
    /// An empty table.
    pub fn new() -> Self {
        Self {
            frequencies: vec![0; MAX_ASCII as usize + 1],
            value_to_id: vec![None; MAX_ASCII as usize + 1],
            id_to_value: Vec::new(),
        }
    }

    /// Tally `values` into a fresh table.
    pub fn from_values(values: &[u32]) -> Result<Self> {
        let mut stats = Self::new();
        stats.update_frequency_table(values)?;
        Ok(stats)
    }

    /// Add `values` to the frequency table and rebuild the ID mapping.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` if a count overflows 32 bits. The
    /// table is left unchanged in that case.
    pub fn update_frequency_table(&mut self, values: &[u32]) -> Result<()> {
        let mut frequencies = self.frequencies.clone();
        for &value in values {
            let index = value as usize;
            if index >= frequencies.len() {
                frequencies.resize(index + 1, 0);
            }
            frequencies[index] = frequencies[index].checked_add(1).ok_or_else(|| {
                Error::invalid_parameter(format!("frequency of value {value} overflows 32 bits"))
            })?;
        }
        self.frequencies = frequencies;
        self.rebuild_mapping();
        Ok(())
    }

    fn rebuild_mapping(&mut self) {
        let mut used: Vec<u32> = self
            .frequencies
            .iter()
            .enumerate()
            .filter(|(_, &f)| f > 0)
            .map(|(value, _)| value as u32)
            .collect();
        let freqs = &self.frequencies;
        used.sort_by(|&a, &b| freqs[b as usize].cmp(&freqs[a as usize]).then(a.cmp(&b)));

        self.value_to_id = vec![None; self.frequencies.len()];
        for (id, &value) in used.iter().enumerate() {
            self.value_to_id[value as usize] = Some(id as u32);
        }
        self.id_to_value = used;
    }

    /// Times `value` has been seen.
    pub fn frequency(&self, value: u32) -> u32 {
        self.frequencies.get(value as usize).copied().unwrap_or(0)
    }

    /// Number of distinct values seen.
    pub fn distinct(&self) -> usize {
        self.id_to_value.len()
    }

    /// Total number of values tallied.
    pub fn total(&self) -> u64 {
        self.frequencies.iter().map(|&f| u64::from(f)).sum()
    }

    /// Dense ID of `value`, if it has been seen.
    pub fn value_to_id(&self, value: u32) -> Option<u32> {
        self.value_to_id.get(value as usize).copied().flatten()
    }

    /// Value carrying `id`, if the ID is assigned.
    pub fn id_to_value(&self, id: u32) -> Option<u32> {
        self.id_to_value.get(id as usize).copied()
    }

    /// Values in ID order.
    pub fn ids_to_values(&self) -> &[u32] {
        &self.id_to_value
    }

    /// Frequencies indexed by ID (non-increasing).
    ///
    /// Suitable as input to [`HuffmanEncoder::new`](crate::huffman::HuffmanEncoder::new).
    pub fn id_frequencies(&self) -> Vec<u32> {
        self.id_to_value
            .iter()
            .map(|&value| self.frequencies[value as usize])
            .collect()
    }

    /// Map values to their IDs.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` for a value that was never tallied.
    pub fn to_ids(&self, values: &[u32]) -> Result<Vec<u32>> {
        values
            .iter()
            .map(|&value| {
                self.value_to_id(value).ok_or_else(|| {
                    Error::invalid_parameter(format!("value {value} has no assigned ID"))
                })
            })
            .collect()
    }

    /// Map IDs back to their values.
    pub fn from_ids(&self, ids: &[u32]) -> Result<Vec<u32>> {
        ids.iter()
            .map(|&id| {
                self.id_to_value(id)
                    .ok_or_else(|| Error::invalid_parameter(format!("ID {id} is not assigned")))
            })
            .collect()
    }
}

impl Default for BlockStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlockStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} values, {} distinct", self.total(), self.distinct())?;
        for (id, &value) in self.id_to_value.iter().enumerate() {
            writeln!(f, "{id}\t{value}\t{}", self.frequencies[value as usize])?;
        }
        Ok(())
    }
}
