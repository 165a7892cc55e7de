//! Quality-score strings and their integer form.
//!
//! A FASTQ quality line is a string of printable ASCII characters, one per
//! base. [`QualityScores`] holds the integer form (one value per character)
//! and offers the lossy transforms applied before coding: clamping low or
//! high scores and remapping through a lookup table.

use std::fmt;

use log::warn;

use crate::error::{Error, Result};

/// ASCII encodings of FASTQ quality scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QScoreFormat {
    /// Phred+33, scores 0..=93.
    Sanger,
    /// Solexa+64, scores -5..=62.
    Solexa,
    /// Phred+64, scores 0..=62.
    Illumina,
}

impl QScoreFormat {
    /// Inclusive range of valid ASCII values.
    pub fn ascii_range(self) -> (u32, u32) {
        match self {
            QScoreFormat::Sanger => (33, 126),
            QScoreFormat::Solexa => (59, 126),
            QScoreFormat::Illumina => (64, 126),
        }
    }

    fn name(self) -> &'static str {
        match self {
            QScoreFormat::Sanger => "Sanger",
            QScoreFormat::Solexa => "Solexa",
            QScoreFormat::Illumina => "Illumina",
        }
    }
}

impl fmt::Display for QScoreFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One read's quality scores as integers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualityScores {
    values: Vec<u32>,
}

impl QualityScores {
    /// Wrap integer scores.
    pub fn new(values: Vec<u32>) -> Self {
        Self { values }
    }

    /// Parse a quality line; each byte becomes one score.
    pub fn from_ascii(line: &str) -> Self {
        Self {
            values: line.bytes().map(u32::from).collect(),
        }
    }

    /// Render the scores back to a quality line.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` if a score is not an ASCII character.
    pub fn to_ascii(&self) -> Result<String> {
        self.values
            .iter()
            .map(|&value| {
                u8::try_from(value)
                    .ok()
                    .filter(u8::is_ascii)
                    .map(char::from)
                    .ok_or_else(|| {
                        Error::invalid_parameter(format!("score {value} is not an ASCII character"))
                    })
            })
            .collect()
    }

    /// The integer scores.
    pub fn values(&self) -> &[u32] {
        &self.values
    }

    /// Consume into the integer scores.
    pub fn into_values(self) -> Vec<u32> {
        self.values
    }

    /// Number of scores.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if there are no scores.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raise every score below `floor` to `floor`.
    pub fn apply_min_truncation(&mut self, floor: u32) {
        for value in &mut self.values {
            *value = (*value).max(floor);
        }
    }

    /// Lower every score above `ceiling` to `ceiling`.
    pub fn apply_max_truncation(&mut self, ceiling: u32) {
        for value in &mut self.values {
            *value = (*value).min(ceiling);
        }
    }

    /// Replace every score `v` with `lookup[v]`.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` if a score falls outside the table;
    /// no score is changed in that case.
    pub fn apply_remapping(&mut self, lookup: &[u32]) -> Result<()> {
        if let Some(&value) = self.values.iter().find(|&&v| v as usize >= lookup.len()) {
            return Err(Error::invalid_parameter(format!(
                "score {value} outside a remapping table of {} entries",
                lookup.len()
            )));
        }
        for value in &mut self.values {
            *value = lookup[*value as usize];
        }
        Ok(())
    }

    /// Undo [`apply_remapping`](Self::apply_remapping) with the inverse table.
    pub fn unapply_remapping(&mut self, inverse: &[u32]) -> Result<()> {
        self.apply_remapping(inverse)
    }

    /// Count scores outside `format`'s ASCII range, logging a warning for each.
    ///
    /// Invalid scores are a data-quality problem, not a coding error, so
    /// nothing is rejected.
    pub fn validate(&self, format: QScoreFormat) -> usize {
        let (min, max) = format.ascii_range();
        let mut invalid = 0;
        for (position, &value) in self.values.iter().enumerate() {
            if !(min..=max).contains(&value) {
                warn!("invalid {format} quality score {value} at position {position}");
                invalid += 1;
            }
        }
        invalid
    }
}

impl From<Vec<u32>> for QualityScores {
    fn from(values: Vec<u32>) -> Self {
        Self::new(values)
    }
}
