//! Dense conditional probability table: row key -> column key -> probability.
//!
//! Row and column key sets are fixed at construction. Storage is a single
//! row-major vector, so a whole row is available as a slice in column order.

use std::fmt::Display;
use std::hash::Hash;

use super::error::{Axis, Result};
use super::index::KeyIndex;
use super::stable::stable_sum;

/// Conditional probability table `P(column | row)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalTable<R: Eq + Hash, C: Eq + Hash> {
    rows: KeyIndex<R>,
    columns: KeyIndex<C>,
    values: Vec<f64>,
}

impl<R, C> ConditionalTable<R, C>
where
    R: Eq + Hash + Clone + Display,
    C: Eq + Hash + Clone + Display,
{
    /// Create a table with every entry set to 0.
    pub fn new<RI, CI>(rows: RI, columns: CI) -> Result<Self>
    where
        RI: IntoIterator<Item = R>,
        CI: IntoIterator<Item = C>,
    {
        let rows = KeyIndex::new(rows, Axis::Row)?;
        let columns = KeyIndex::new(columns, Axis::Column)?;
        let values = vec![0.0; rows.len() * columns.len()];
        Ok(Self {
            rows,
            columns,
            values,
        })
    }

    fn offset(&self, row: &R, column: &C) -> Result<usize> {
        let r = self.rows.position(row)?;
        let c = self.columns.position(column)?;
        Ok(r * self.columns.len() + c)
    }

    /// Store `probability` at `(row, column)`.
    pub fn set(&mut self, row: &R, column: &C, probability: f64) -> Result<()> {
        let at = self.offset(row, column)?;
        self.values[at] = probability;
        Ok(())
    }

    /// Stored value at `(row, column)`; 0 if never set.
    pub fn get(&self, row: &R, column: &C) -> Result<f64> {
        let at = self.offset(row, column)?;
        Ok(self.values[at])
    }

    /// All entries of `row`, in column order.
    pub fn row(&self, row: &R) -> Result<&[f64]> {
        let r = self.rows.position(row)?;
        let width = self.columns.len();
        Ok(&self.values[r * width..(r + 1) * width])
    }

    /// Position of `column` in column order.
    pub fn column_position(&self, column: &C) -> Result<usize> {
        self.columns.position(column)
    }

    pub fn row_keys(&self) -> &[R] {
        self.rows.keys()
    }

    pub fn column_keys(&self) -> &[C] {
        self.columns.keys()
    }

    pub fn contains_row(&self, row: &R) -> bool {
        self.rows.contains(row)
    }

    pub fn contains_column(&self, column: &C) -> bool {
        self.columns.contains(column)
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    /// Sum of the entries of `row`.
    pub fn row_sum(&self, row: &R) -> Result<f64> {
        Ok(stable_sum(self.row(row)?.iter().copied()))
    }

    /// Rows whose entries do not sum to 1 within `tolerance`, with their sums.
    pub fn malformed_rows(&self, tolerance: f64) -> Vec<(&R, f64)> {
        let width = self.columns.len();
        self.rows
            .keys()
            .iter()
            .enumerate()
            .filter_map(|(r, key)| {
                let sum = stable_sum(self.values[r * width..(r + 1) * width].iter().copied());
                if (sum - 1.0).abs() > tolerance || sum.is_nan() {
                    Some((key, sum))
                } else {
                    None
                }
            })
            .collect()
    }
}
