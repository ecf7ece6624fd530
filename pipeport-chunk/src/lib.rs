//! Columnar data exchanged between pipeline ports.
//!
//! A [`Chunk`] is a batch of equal-length [`Column`]s. A [`Header`] is the
//! schema two connected ports agree on; ports check chunk arity against it
//! on every push and pull.

#![warn(missing_docs)]

mod chunk;
mod column;
mod error;
mod header;


pub use chunk::Chunk;
pub use column::{Column, ColumnRef, DataType};
pub use error::ChunkError;
pub use header::{ColumnSchema, Header, SharedHeader};
