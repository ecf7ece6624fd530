use std::sync::Arc;

use pipeport_chunk::{Chunk, Header, SharedHeader};

use super::{Port, PortInfo, PortStats};
use crate::state::{Data, IS_FINISHED, PushOutcome, State};
use crate::{Fault, PortError, PortFlags, PortId, PortKind, UpdateInfo, UpdateList};

/// Producer end of a connection.
///
/// # Invariants
///
/// - After [`finish`](Self::finish) the port is finished.
/// - A finished port accepts pushes but drops them.
/// - Push only when [`can_push`](Self::can_push): the consumer asked for data
///   and the previous payload was pulled.
pub struct OutputPort {
    port: Port,
}

impl OutputPort {
    /// Create an unconnected port.
    pub fn new(header: impl Into<SharedHeader>) -> Self {
        Self {
            port: Port::new(header.into()),
        }
    }

    /// Shared handle to the header.
    #[must_use]
    pub fn shared_header(&self) -> &SharedHeader {
        &self.port.header
    }

    /// Report state changes of this port through `info`.
    pub fn set_update_info(&mut self, info: Arc<UpdateInfo>) {
        self.port.update_info = Some(info);
    }

    /// Report state changes of this port into `list`, under this port's id.
    pub fn track_updates(&mut self, list: &UpdateList) -> Arc<UpdateInfo> {
        self.port.track_updates(list)
    }

    /// The detector this port reports to, if any.
    #[must_use]
    pub fn update_info(&self) -> Option<&Arc<UpdateInfo>> {
        self.port.update_info.as_ref()
    }

    pub(crate) fn attach(&mut self, state: Arc<State>, peer: PortId) {
        self.port.attach(state, peer);
    }

    // ── Push ─────────────────────────────────────────────────────────

    /// Push a chunk.
    ///
    /// # Errors
    /// See [`push_data`](Self::push_data).
    #[inline]
    pub fn push(&mut self, chunk: Chunk) -> Result<PushOutcome, PortError> {
        self.push_data(Data::from_chunk(chunk))
    }

    /// Push an upstream fault in place of a chunk.
    ///
    /// # Errors
    /// See [`push_data`](Self::push_data).
    #[inline]
    pub fn push_fault(&mut self, fault: Fault) -> Result<PushOutcome, PortError> {
        self.push_data(Data::from_fault(fault))
    }

    /// Push a payload.
    ///
    /// Returns [`PushOutcome::Discarded`] if the connection is already
    /// finished; the payload is dropped.
    ///
    /// # Errors
    /// - [`PortError::ColumnCountMismatch`] if a chunk's arity differs from
    ///   the header.
    /// - [`PortError::EmptyPayload`] for a payload with no rows, no columns
    ///   and no fault.
    /// - [`PortError::NotConnected`] if the port is not bound.
    /// - [`PortError::AlreadyHasData`] if the previous payload was not pulled.
    ///
    /// On error the connection is left unchanged.
    pub fn push_data(&mut self, data: Data) -> Result<PushOutcome, PortError> {
        self.port.check_arity(&data, PortKind::Output)?;
        if data.is_empty() {
            return Err(PortError::EmptyPayload { port: self.port.id });
        }

        let port = &mut self.port;
        let state = port
            .state
            .as_deref()
            .ok_or(PortError::NotConnected { port: port.id })?;

        port.update_version();

        let (rows, bytes) = (data.chunk().num_rows(), data.chunk().bytes());
        *port.data.get_mut() = data;
        let outcome = state.push(&mut port.data, port.id)?;
        if outcome == PushOutcome::Stored {
            port.stats.record(rows, bytes);
        }
        Ok(outcome)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Declare that no more data will be pushed.
    ///
    /// # Errors
    /// [`PortError::NotConnected`] if the port is not bound.
    pub fn finish(&mut self) -> Result<(), PortError> {
        let flags = self.port.state()?.set_flags(IS_FINISHED, IS_FINISHED);
        if !flags.is_finished() {
            tracing::trace!(port = %self.port.id, "output finished");
            self.port.update_version();
        }
        Ok(())
    }

    /// The consumer wants data.
    ///
    /// # Errors
    /// [`PortError::NotConnected`] if the port is not bound.
    #[inline]
    pub fn is_needed(&self) -> Result<bool, PortError> {
        Ok(self.port.state()?.flags().is_needed())
    }

    /// The connection was finished by either side.
    ///
    /// # Errors
    /// [`PortError::NotConnected`] if the port is not bound.
    #[inline]
    pub fn is_finished(&self) -> Result<bool, PortError> {
        Ok(self.port.state()?.flags().is_finished())
    }

    /// The consumer wants data and the slot is free.
    ///
    /// # Errors
    /// [`PortError::NotConnected`] if the port is not bound.
    #[inline]
    pub fn can_push(&self) -> Result<bool, PortError> {
        let flags = self.port.state()?.flags();
        Ok(flags.is_needed() && !flags.has_data())
    }
}

// ── Trait impls ──────────────────────────────────────────────────────

impl PortInfo for OutputPort {
    #[inline]
    fn id(&self) -> PortId {
        self.port.id
    }

    #[inline]
    fn header(&self) -> &Header {
        &self.port.header
    }

    #[inline]
    fn is_connected(&self) -> bool {
        self.port.state.is_some()
    }

    #[inline]
    fn peer(&self) -> Option<PortId> {
        self.port.peer
    }

    #[inline]
    fn flags(&self) -> Result<PortFlags, PortError> {
        Ok(self.port.state()?.flags())
    }

    #[inline]
    fn stats(&self) -> PortStats {
        self.port.stats
    }
}
