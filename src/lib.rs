//! Single-slot port connections for pipelined columnar query execution.
//!
//! Re-exports [`pipeport_core`] (ports, connections, notifications) and the
//! data model of [`pipeport_chunk`].

pub use pipeport_chunk::{
    Chunk, ChunkError, Column, ColumnRef, ColumnSchema, DataType, Header, SharedHeader,
};
pub use pipeport_core::*;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Chunk, ColumnSchema, Connector, DataType, Fault, Header, InputPort, OutputPort, PortError,
        PortInfo, PushOutcome, UpdateInfo, UpdateList, connect,
    };
}
