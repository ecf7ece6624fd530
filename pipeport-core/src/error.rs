//! Protocol violations and carried faults.

use core::fmt;
use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

use crate::{PortFlags, PortId};

/// Which end of a connection an error was raised on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    /// Consumer end.
    Input,
    /// Producer end.
    Output,
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Input => "pulled from input port",
            Self::Output => "pushed to output port",
        })
    }
}

/// An upstream data-processing error carried through a connection in place
/// of a chunk.
///
/// Cloning is cheap; every clone refers to the same underlying error, which
/// [`same_as`](Self::same_as) can verify.
#[derive(Clone)]
pub struct Fault(Arc<dyn StdError + Send + Sync + 'static>);

#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for Message {}

impl Fault {
    /// Wrap an error.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    /// A fault that only carries a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    /// True if both values carry the very same error.
    #[must_use]
    pub fn same_as(&self, other: &Fault) -> bool {
        core::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }

    /// The wrapped error.
    #[must_use]
    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.0
    }

    /// Downcast the wrapped error.
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl StdError for Fault {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

/// Errors returned by port operations.
///
/// Everything except [`PortError::Fault`] is a logical error: the scheduler
/// or a stage broke the port protocol. Those abort the query and are never
/// retried.
#[derive(Debug, Clone, Error)]
pub enum PortError {
    /// The port was used before [`connect`](crate::connect).
    #[error("port {port} is not connected")]
    NotConnected {
        /// Offending port.
        port: PortId,
    },

    /// `connect` was called on a bound port without asking to reconnect.
    #[error("port {port} is already connected (header: [{header}])")]
    AlreadyConnected {
        /// Offending port.
        port: PortId,
        /// Structure of the port's header.
        header: String,
    },

    /// Headers of the two ports differ in column count or types.
    #[error("cannot connect ports with different structure: output [{output}], input [{input}]")]
    IncompatibleHeaders {
        /// Output header structure.
        output: String,
        /// Input header structure.
        input: String,
    },

    /// Push into a connection that still holds unread data.
    #[error("cannot push to port {port} which already has data (flags: {flags})")]
    AlreadyHasData {
        /// Offending port.
        port: PortId,
        /// Flags observed at the time of the push.
        flags: PortFlags,
    },

    /// Pull from a connection that holds no data.
    #[error("cannot pull from port {port} which has no data (flags: {flags})")]
    NoData {
        /// Offending port.
        port: PortId,
        /// Flags observed at the time of the pull.
        flags: PortFlags,
    },

    /// Pull without having declared demand first.
    #[error("cannot pull from port {port} which is not needed (flags: {flags})")]
    NotNeeded {
        /// Offending port.
        port: PortId,
        /// Flags observed at the time of the pull.
        flags: PortFlags,
    },

    /// Push of a payload with neither rows, columns nor fault.
    #[error("cannot push an empty chunk to port {port}")]
    EmptyPayload {
        /// Offending port.
        port: PortId,
    },

    /// Chunk arity differs from the port header.
    #[error(
        "invalid number of columns in chunk {kind}. Expected {expected}, found {found}\nHeader: {header}\nChunk: {chunk}"
    )]
    ColumnCountMismatch {
        /// Side that detected the mismatch.
        kind: PortKind,
        /// Columns declared by the header.
        expected: usize,
        /// Columns present in the chunk.
        found: usize,
        /// Header structure.
        header: String,
        /// Chunk structure.
        chunk: String,
    },

    /// An upstream fault re-raised by [`InputPort::pull`](crate::InputPort::pull).
    #[error("{0}")]
    Fault(Fault),
}

impl PortError {
    /// True for protocol violations, false for carried faults.
    #[must_use]
    pub fn is_logical_error(&self) -> bool {
        !matches!(self, Self::Fault(_))
    }

    /// The carried fault, if this error is one.
    #[must_use]
    pub fn as_fault(&self) -> Option<&Fault> {
        match self {
            Self::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}

impl From<Fault> for PortError {
    fn from(fault: Fault) -> Self {
        Self::Fault(fault)
    }
}
