//! Typed column buffers.

use core::fmt;
use std::sync::Arc;

/// Shared, immutable column.
pub type ColumnRef = Arc<Column>;

/// Logical type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    /// Boolean.
    Bool,
    /// Unsigned 64-bit integer.
    UInt64,
    /// Signed 64-bit integer.
    Int64,
    /// 64-bit float.
    Float64,
    /// UTF-8 string.
    String,
}

impl DataType {
    /// Type name as it appears in structure dumps.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::UInt64 => "UInt64",
            Self::Int64 => "Int64",
            Self::Float64 => "Float64",
            Self::String => "String",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A column of values, all of one [`DataType`].
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Boolean values.
    Bool(Vec<bool>),
    /// Unsigned integers.
    UInt64(Vec<u64>),
    /// Signed integers.
    Int64(Vec<i64>),
    /// Floats.
    Float64(Vec<f64>),
    /// Strings.
    String(Vec<String>),
}

impl Column {
    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::UInt64(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::String(v) => v.len(),
        }
    }

    /// True if the column has no rows.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Logical type of the values.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Bool(_) => DataType::Bool,
            Self::UInt64(_) => DataType::UInt64,
            Self::Int64(_) => DataType::Int64,
            Self::Float64(_) => DataType::Float64,
            Self::String(_) => DataType::String,
        }
    }

    /// Approximate payload size in bytes.
    ///
    /// Strings count their UTF-8 length; container overhead is ignored.
    #[must_use]
    pub fn byte_size(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::UInt64(v) => v.len() * size_of::<u64>(),
            Self::Int64(v) => v.len() * size_of::<i64>(),
            Self::Float64(v) => v.len() * size_of::<f64>(),
            Self::String(v) => v.iter().map(String::len).sum(),
        }
    }

    /// `"UInt64(size = 2)"`.
    #[must_use]
    pub fn dump_structure(&self) -> String {
        format!("{}(size = {})", self.data_type(), self.len())
    }
}

impl From<Vec<bool>> for Column {
    fn from(v: Vec<bool>) -> Self {
        Self::Bool(v)
    }
}

impl From<Vec<u64>> for Column {
    fn from(v: Vec<u64>) -> Self {
        Self::UInt64(v)
    }
}

impl From<Vec<i64>> for Column {
    fn from(v: Vec<i64>) -> Self {
        Self::Int64(v)
    }
}

impl From<Vec<f64>> for Column {
    fn from(v: Vec<f64>) -> Self {
        Self::Float64(v)
    }
}

impl From<Vec<String>> for Column {
    fn from(v: Vec<String>) -> Self {
        Self::String(v)
    }
}
