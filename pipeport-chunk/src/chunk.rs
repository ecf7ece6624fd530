//! Batches of equal-length columns.

use crate::{ChunkError, Column, ColumnRef};

/// An ordered set of columns that all hold `num_rows` values.
///
/// A chunk is *empty* only when it has neither rows nor columns. A chunk with
/// zero columns may still carry a row count (for example, the result of
/// `SELECT count()` style sources that only need to report cardinality).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    columns: Vec<ColumnRef>,
    num_rows: usize,
}

impl Chunk {
    /// Build a chunk, checking that every column has `num_rows` values.
    ///
    /// # Errors
    /// Returns [`ChunkError::RowCountMismatch`] naming the first column whose
    /// length differs.
    pub fn new(columns: Vec<ColumnRef>, num_rows: usize) -> Result<Self, ChunkError> {
        for (column, col) in columns.iter().enumerate() {
            if col.len() != num_rows {
                return Err(ChunkError::RowCountMismatch {
                    column,
                    expected: num_rows,
                    found: col.len(),
                });
            }
        }
        Ok(Self { columns, num_rows })
    }

    /// Build a chunk from owned columns, taking the row count from the first.
    ///
    /// # Errors
    /// Returns [`ChunkError::RowCountMismatch`] if the columns disagree.
    pub fn from_columns<I>(columns: I) -> Result<Self, ChunkError>
    where
        I: IntoIterator,
        I::Item: Into<Column>,
    {
        let columns: Vec<ColumnRef> = columns
            .into_iter()
            .map(|c| ColumnRef::new(c.into()))
            .collect();
        let num_rows = columns.first().map_or(0, |c| c.len());
        Self::new(columns, num_rows)
    }

    /// A chunk with no columns that still reports `num_rows` rows.
    #[must_use]
    pub const fn with_rows(num_rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            num_rows,
        }
    }

    /// No columns, no rows.
    #[must_use]
    pub const fn empty() -> Self {
        Self::with_rows(0)
    }

    /// True if the chunk has neither rows nor columns.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_rows == 0 && self.columns.is_empty()
    }

    /// Number of columns.
    #[inline]
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// All columns in order.
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &[ColumnRef] {
        &self.columns
    }

    /// Column at `index`.
    #[must_use]
    pub fn column(&self, index: usize) -> Option<&ColumnRef> {
        self.columns.get(index)
    }

    /// Take the columns, leaving nothing behind.
    #[must_use]
    pub fn into_columns(self) -> Vec<ColumnRef> {
        self.columns
    }

    /// Total payload size of all columns.
    #[must_use]
    pub fn bytes(&self) -> usize {
        self.columns.iter().map(|c| c.byte_size()).sum()
    }

    /// Drop all columns and reset the row count.
    pub fn clear(&mut self) {
        self.columns.clear();
        self.num_rows = 0;
    }

    /// `"UInt64(size = 2) String(size = 2)"`, or `"(no columns, rows = N)"`.
    #[must_use]
    pub fn dump_structure(&self) -> String {
        if self.columns.is_empty() {
            return format!("(no columns, rows = {})", self.num_rows);
        }
        self.columns
            .iter()
            .map(|c| c.dump_structure())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
