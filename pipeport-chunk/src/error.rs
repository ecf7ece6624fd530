use thiserror::Error;

/// Errors raised while assembling a [`Chunk`](crate::Chunk).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    /// A column's length differs from the chunk's row count.
    #[error("invalid number of rows in column {column}: expected {expected}, found {found}")]
    RowCountMismatch {
        /// Position of the offending column.
        column: usize,
        /// Row count of the chunk.
        expected: usize,
        /// Row count of the column.
        found: usize,
    },
}
