//! Column boundary sets.
//!
//! A [`ColumnSchema`] of `N` strictly increasing boundaries splits a line
//! into `N + 1` half-open columns; the last column is unbounded above.
//! Positional (PDF) schemas use `f64` coordinates, fixed-width schemas
//! use `usize` character offsets.

use std::cmp::Ordering;

use serde::Serialize;

/// Errors produced when validating a boundary set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A boundary is not strictly greater than its predecessor, or is not
    /// comparable at all (NaN).
    #[error("column boundaries must be strictly increasing (violated at index {index})")]
    MalformedBoundaries {
        /// Index of the first offending boundary.
        index: usize,
    },
}

/// An ordered set of column boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSchema<B> {
    boundaries: Vec<B>,
}

impl<B: Copy + PartialOrd> ColumnSchema<B> {
    /// Creates a schema, rejecting any boundary set that is not strictly
    /// increasing.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MalformedBoundaries`] on the first boundary
    /// that is not comparable or not greater than the one before it.
    pub fn new(boundaries: Vec<B>) -> Result<Self, SchemaError> {
        if let Some(index) = first_violation(&boundaries) {
            return Err(SchemaError::MalformedBoundaries { index });
        }
        Ok(Self { boundaries })
    }

    /// Creates a schema from untrusted boundaries.
    ///
    /// Valid input is used as-is. Otherwise incomparable values are dropped
    /// and the rest re-sorted and de-duplicated; if nothing usable remains
    /// the `fallback` boundaries are used instead (repaired the same way).
    #[must_use]
    pub fn sanitized(raw: Vec<B>, fallback: &[B]) -> Self {
        if first_violation(&raw).is_none() {
            return Self { boundaries: raw };
        }

        log::warn!("Column boundaries are not strictly increasing, repairing");
        let repaired = repair(raw);
        if repaired.is_empty() {
            log::warn!("No usable column boundaries left, using defaults");
            return Self {
                boundaries: repair(fallback.to_vec()),
            };
        }
        Self {
            boundaries: repaired,
        }
    }

    /// The boundary values, ascending.
    #[must_use]
    pub fn boundaries(&self) -> &[B] {
        &self.boundaries
    }

    /// Number of columns (`boundaries + 1`).
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.boundaries.len() + 1
    }

    /// Index of the column containing `position`.
    ///
    /// A position counts as past a boundary only when it is strictly
    /// greater, so a value equal to a boundary stays in the lower column.
    #[must_use]
    pub fn column_of(&self, position: B) -> usize {
        self.boundaries
            .iter()
            .take_while(|&&bound| position > bound)
            .count()
    }
}

impl ColumnSchema<usize> {
    /// Character ranges `[start, end)` for every column; the last range has
    /// no end.
    #[must_use]
    pub fn char_ranges(&self) -> Vec<(usize, Option<usize>)> {
        let mut start = 0;
        let mut ranges = Vec::with_capacity(self.column_count());
        for &end in &self.boundaries {
            ranges.push((start, Some(end)));
            start = end;
        }
        ranges.push((start, None));
        ranges
    }
}

fn first_violation<B: PartialOrd>(boundaries: &[B]) -> Option<usize> {
    boundaries.iter().enumerate().find_map(|(i, b)| {
        let incomparable = b.partial_cmp(b).is_none();
        let not_increasing = i > 0 && boundaries[i - 1].partial_cmp(b) != Some(Ordering::Less);
        (incomparable || not_increasing).then_some(i)
    })
}

fn repair<B: Copy + PartialOrd>(mut boundaries: Vec<B>) -> Vec<B> {
    boundaries.retain(|b| b.partial_cmp(b).is_some());
    boundaries.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    boundaries.dedup_by(|a, b| *a == *b);
    boundaries
}
