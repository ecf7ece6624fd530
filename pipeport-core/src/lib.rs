//! Lock-free single-slot connection between pipeline ports.
//!
//! Adjacent stages of a query pipeline exchange [`Chunk`]s through a pair of
//! ports: an [`OutputPort`] owned by the producer and an [`InputPort`] owned
//! by the consumer. The pair shares one atomic word that holds at most one
//! payload plus three flags:
//!
//! | Flag | Set by | Meaning |
//! |---|---|---|
//! | finished | either side | no more data will flow |
//! | needed | consumer | the consumer wants data |
//! | has data | producer | an unread payload is waiting |
//!
//! Nothing here blocks. An external scheduler decides when to run each stage
//! and learns about state changes through [`UpdateInfo`] / [`UpdateList`].
//!
//! # Example
//!
//! ```
//! use pipeport_chunk::{Chunk, ColumnSchema, DataType, Header};
//! use pipeport_core::{InputPort, OutputPort, PortInfo, connect};
//!
//! let header = Header::new(vec![
//!     ColumnSchema::new("a", DataType::UInt64),
//!     ColumnSchema::new("b", DataType::UInt64),
//! ]);
//! let mut output = OutputPort::new(header.clone());
//! let mut input = InputPort::new(header);
//! connect(&mut output, &mut input).unwrap();
//!
//! input.set_needed().unwrap();
//! assert!(output.can_push().unwrap());
//!
//! let chunk = Chunk::from_columns([vec![1u64, 2], vec![3u64, 4]]).unwrap();
//! output.push(chunk.clone()).unwrap();
//!
//! assert_eq!(input.pull(false).unwrap(), chunk);
//! assert!(!input.has_data().unwrap());
//! ```

#![warn(missing_docs)]

mod connect;
mod error;
mod port;
mod state;
mod sync;
mod update;

#[cfg(all(test, not(loom)))]
mod tests;

#[cfg(all(test, loom))]
mod loom_tests;

pub use connect::{Connector, connect};
pub use error::{Fault, PortError, PortKind};
pub use port::{InputPort, OutputPort, PortId, PortInfo, PortStats};
pub use state::{Data, PortFlags, PushOutcome};
pub use update::{UpdateInfo, UpdateList};

pub use pipeport_chunk::Chunk;
