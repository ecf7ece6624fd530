//! Column schemas agreed between connected ports.

use std::sync::Arc;

use crate::{Chunk, DataType};

/// Header shared by a port and everything that inspects it.
pub type SharedHeader = Arc<Header>;

/// Name and type of one column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnSchema {
    /// Column name.
    pub name: String,
    /// Column type.
    pub data_type: DataType,
}

impl ColumnSchema {
    /// Create a column schema.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered column schemas of a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Header {
    columns: Vec<ColumnSchema>,
}

impl Header {
    /// Create a header from column schemas.
    #[must_use]
    pub fn new(columns: Vec<ColumnSchema>) -> Self {
        Self { columns }
    }

    /// Number of columns.
    #[inline]
    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns.len()
    }

    /// True if the header declares no columns.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column schema at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ColumnSchema> {
        self.columns.get(index)
    }

    /// Position of the column called `name`.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Iterate column schemas in order.
    pub fn iter(&self) -> core::slice::Iter<'_, ColumnSchema> {
        self.columns.iter()
    }

    /// Same column count and the same type at every position.
    ///
    /// Names are not compared: connected stages may rename freely.
    #[must_use]
    pub fn has_equal_structure(&self, other: &Header) -> bool {
        self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(a, b)| a.data_type == b.data_type)
    }

    /// True if `chunk` has exactly as many columns as this header.
    #[inline]
    #[must_use]
    pub fn matches_arity(&self, chunk: &Chunk) -> bool {
        chunk.num_columns() == self.columns.len()
    }

    /// `"a UInt64, b String"`.
    #[must_use]
    pub fn dump_structure(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.data_type))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<ColumnSchema> for Header {
    fn from_iter<I: IntoIterator<Item = ColumnSchema>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Header {
    type Item = &'a ColumnSchema;
    type IntoIter = core::slice::Iter<'a, ColumnSchema>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
