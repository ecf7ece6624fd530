use core::cell::Cell;
use std::sync::Arc;

use pipeport_chunk::{Chunk, Header, SharedHeader};

use super::{Port, PortInfo, PortStats};
use crate::state::{Data, IS_FINISHED, IS_NEEDED, State};
use crate::{PortError, PortFlags, PortId, PortKind, UpdateInfo, UpdateList};

/// Consumer end of a connection.
///
/// # Invariants
///
/// - After [`close`](Self::close) the port is finished.
/// - A finished port stays finished until [`reopen`](Self::reopen).
/// - A port that is not needed can only be set needed or closed.
/// - Pull only when [`has_data`](PortInfo::has_data).
pub struct InputPort {
    port: Port,
    /// Sticky copy of "finished and drained".
    is_finished: Cell<bool>,
}

impl InputPort {
    /// Create an unconnected port.
    pub fn new(header: impl Into<SharedHeader>) -> Self {
        Self {
            port: Port::new(header.into()),
            is_finished: Cell::new(false),
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
        self.is_finished.set(false);
    }

    // ── Pull ─────────────────────────────────────────────────────────

    /// Pull the next payload without interpreting it.
    ///
    /// With `set_not_needed` the demand flag is cleared in the same exchange
    /// and no notification is sent.
    ///
    /// # Errors
    /// - [`PortError::NotConnected`] if the port is not bound.
    /// - [`PortError::NoData`] if nothing was pushed.
    /// - [`PortError::NotNeeded`] if demand was never declared and
    ///   `set_not_needed` is false.
    /// - [`PortError::ColumnCountMismatch`] if the chunk's arity differs from
    ///   the header.
    pub fn pull_data(&mut self, set_not_needed: bool) -> Result<Data, PortError> {
        let port = &mut self.port;
        let state = port
            .state
            .as_deref()
            .ok_or(PortError::NotConnected { port: port.id })?;

        if !set_not_needed {
            port.update_version();
        }

        let flags = state.pull(&mut port.data, port.id, set_not_needed)?;
        self.is_finished.set(flags.is_finished());

        let data = core::mem::take(port.data.get_mut());
        port.check_arity(&data, PortKind::Input)?;
        port.stats.record(data.chunk().num_rows(), data.chunk().bytes());
        Ok(data)
    }

    /// Pull the next chunk, re-raising a carried fault.
    ///
    /// # Errors
    /// Everything [`pull_data`](Self::pull_data) returns, plus
    /// [`PortError::Fault`] with the fault the producer pushed.
    #[inline]
    pub fn pull(&mut self, set_not_needed: bool) -> Result<Chunk, PortError> {
        Ok(self.pull_data(set_not_needed)?.into_result()?)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Finished and drained.
    ///
    /// Once true, stays true until [`reopen`](Self::reopen). A finished
    /// connection that still holds data is not finished yet: the last
    /// payload must be pulled first.
    ///
    /// # Errors
    /// [`PortError::NotConnected`] if the port is not bound.
    pub fn is_finished(&self) -> Result<bool, PortError> {
        let state = self.port.state()?;
        if self.is_finished.get() {
            return Ok(true);
        }
        let flags = state.flags();
        let finished = flags.is_finished() && !flags.has_data();
        self.is_finished.set(finished);
        Ok(finished)
    }

    /// Ask the producer for data.
    ///
    /// # Errors
    /// [`PortError::NotConnected`] if the port is not bound.
    pub fn set_needed(&mut self) -> Result<(), PortError> {
        let flags = self.port.state()?.set_flags(IS_NEEDED, IS_NEEDED);
        if !flags.is_needed() {
            self.port.update_version();
        }
        Ok(())
    }

    /// Withdraw demand. The producer is not notified.
    ///
    /// # Errors
    /// [`PortError::NotConnected`] if the port is not bound.
    pub fn set_not_needed(&mut self) -> Result<(), PortError> {
        self.port.state()?.set_flags(0, IS_NEEDED);
        Ok(())
    }

    /// Stop reading. The producer sees the connection as finished even if it
    /// still has data queued.
    ///
    /// # Errors
    /// [`PortError::NotConnected`] if the port is not bound.
    pub fn close(&mut self) -> Result<(), PortError> {
        let flags = self.port.state()?.set_flags(IS_FINISHED, IS_FINISHED);
        if !flags.is_finished() {
            tracing::trace!(port = %self.port.id, "input closed");
            self.port.update_version();
        }
        self.is_finished.set(true);
        Ok(())
    }

    /// Clear the finished state so the connection can carry a new stream.
    ///
    /// Does nothing unless the port [`is_finished`](Self::is_finished). A
    /// payload of the old stream left unread by [`close`](Self::close) is
    /// dropped first, so the new stream starts empty.
    ///
    /// # Errors
    /// [`PortError::NotConnected`] if the port is not bound.
    pub fn reopen(&mut self) -> Result<(), PortError> {
        if !self.is_finished()? {
            return Ok(());
        }
        let port = &mut self.port;
        let state = port
            .state
            .as_deref()
            .ok_or(PortError::NotConnected { port: port.id })?;

        // Pushes into a finished connection are discarded, so nothing can
        // land between the drain and the flag reset.
        let discarded = state.drain(&mut port.data);
        state.set_flags(0, IS_FINISHED);
        self.is_finished.set(false);
        tracing::trace!(port = %port.id, discarded, "input reopened");
        Ok(())
    }
}

// ── Trait impls ──────────────────────────────────────────────────────

impl PortInfo for InputPort {
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
