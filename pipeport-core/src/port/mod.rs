//! Input and output ports.
//!
//! A port starts unconnected; [`connect`](crate::connect) binds one
//! [`OutputPort`] to one [`InputPort`] through a fresh shared state. Each
//! port owns one local data slot for its whole lifetime and trades it with
//! the shared state on every push or pull.

mod input;
mod output;

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use pipeport_chunk::{Header, SharedHeader};

use crate::state::{Data, DataPtr, State};
use crate::{PortError, PortFlags, PortKind, UpdateInfo, UpdateList};

pub use input::InputPort;
pub use output::OutputPort;

/// Process-unique identity of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortId(u64);

impl PortId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Rows and bytes that went through a port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortStats {
    /// Rows pushed or pulled.
    pub rows: u64,
    /// Column bytes pushed or pulled.
    pub bytes: u64,
}

impl PortStats {
    fn record(&mut self, rows: usize, bytes: usize) {
        self.rows += rows as u64;
        self.bytes += bytes as u64;
    }
}

/// Read-only surface shared by both port kinds.
pub trait PortInfo {
    /// Identity of this port.
    fn id(&self) -> PortId;

    /// Header this port was created with.
    fn header(&self) -> &Header;

    /// True once [`connect`](crate::connect) has bound the port.
    fn is_connected(&self) -> bool;

    /// Identity of the port on the other end.
    fn peer(&self) -> Option<PortId>;

    /// Live flags of the connection.
    ///
    /// # Errors
    /// [`PortError::NotConnected`] if the port is not bound.
    fn flags(&self) -> Result<PortFlags, PortError>;

    /// Rows and bytes that went through this port.
    fn stats(&self) -> PortStats;

    /// The connection holds an unread payload.
    ///
    /// # Errors
    /// [`PortError::NotConnected`] if the port is not bound.
    fn has_data(&self) -> Result<bool, PortError> {
        Ok(self.flags()?.has_data())
    }
}

/// State common to both port kinds.
struct Port {
    id: PortId,
    header: SharedHeader,
    state: Option<Arc<State>>,
    data: DataPtr,
    update_info: Option<Arc<UpdateInfo>>,
    peer: Option<PortId>,
    stats: PortStats,
}

impl Port {
    fn new(header: SharedHeader) -> Self {
        Self {
            id: PortId::next(),
            header,
            state: None,
            data: DataPtr::new(),
            update_info: None,
            peer: None,
            stats: PortStats::default(),
        }
    }

    fn attach(&mut self, state: Arc<State>, peer: PortId) {
        self.state = Some(state);
        self.peer = Some(peer);
    }

    #[inline]
    fn state(&self) -> Result<&State, PortError> {
        self.state
            .as_deref()
            .ok_or(PortError::NotConnected { port: self.id })
    }

    #[inline]
    fn update_version(&self) {
        if let Some(info) = &self.update_info {
            info.update();
        }
    }

    fn track_updates(&mut self, list: &UpdateList) -> Arc<UpdateInfo> {
        let info = Arc::new(UpdateInfo::new(self.id, list.clone()));
        self.update_info = Some(Arc::clone(&info));
        info
    }

    fn check_arity(&self, data: &Data, kind: PortKind) -> Result<(), PortError> {
        if data.fault().is_some() || self.header.matches_arity(data.chunk()) {
            return Ok(());
        }
        Err(PortError::ColumnCountMismatch {
            kind,
            expected: self.header.columns(),
            found: data.chunk().num_columns(),
            header: self.header.dump_structure(),
            chunk: data.chunk().dump_structure(),
        })
    }
}
