//! Shared exchange state of two connected ports.
//!
//! One atomic word holds a pointer to a heap-allocated [`Data`] slot with
//! the three port flags packed into its low bits. Every slot is owned by
//! exactly one party at a time: either the shared [`State`] or one port's
//! local [`DataPtr`]. A push or pull swaps the local slot with the shared
//! one, so ownership moves with each exchange and no allocation happens on
//! the steady-state path.

use core::fmt;
use core::ptr::NonNull;

use pipeport_chunk::Chunk;

use crate::sync::{AtomicPtr, Ordering};
use crate::{Fault, PortError, PortId};

// ── Flags ────────────────────────────────────────────────────────────

/// The pair declared that no further data will flow.
pub(crate) const IS_FINISHED: usize = 1;
/// The consumer currently wants data.
pub(crate) const IS_NEEDED: usize = 2;
/// The slot holds an unconsumed payload.
pub(crate) const HAS_DATA: usize = 4;

const FLAGS_MASK: usize = IS_FINISHED | IS_NEEDED | HAS_DATA;

// ── Payload ──────────────────────────────────────────────────────────

/// One unit of payload: a chunk or a carried fault, never both.
///
/// Aligned so that the low three bits of its address are always zero and
/// can carry the port flags.
#[repr(align(8))]
#[derive(Debug, Default)]
pub struct Data {
    chunk: Chunk,
    fault: Option<Fault>,
}

const _: () = assert!(align_of::<Data>() > FLAGS_MASK);

impl Data {
    /// A chunk payload.
    #[must_use]
    pub fn from_chunk(chunk: Chunk) -> Self {
        Self { chunk, fault: None }
    }

    /// A fault payload.
    #[must_use]
    pub fn from_fault(fault: Fault) -> Self {
        Self {
            chunk: Chunk::empty(),
            fault: Some(fault),
        }
    }

    /// True if there is neither a chunk nor a fault.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunk.is_empty() && self.fault.is_none()
    }

    /// The chunk (empty for fault payloads).
    #[inline]
    #[must_use]
    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    /// The carried fault, if any.
    #[inline]
    #[must_use]
    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    /// `Ok(chunk)` or `Err(fault)`.
    ///
    /// # Errors
    /// Returns the carried fault for fault payloads.
    pub fn into_result(self) -> Result<Chunk, Fault> {
        match self.fault {
            Some(fault) => Err(fault),
            None => Ok(self.chunk),
        }
    }

    fn clear(&mut self) {
        self.chunk.clear();
        self.fault = None;
    }
}

impl From<Chunk> for Data {
    fn from(chunk: Chunk) -> Self {
        Self::from_chunk(chunk)
    }
}

impl From<Fault> for Data {
    fn from(fault: Fault) -> Self {
        Self::from_fault(fault)
    }
}

// ── Flag snapshots ───────────────────────────────────────────────────

/// Snapshot of the flags of a connection.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct PortFlags(usize);

impl PortFlags {
    #[inline]
    const fn from_addr(addr: usize) -> Self {
        Self(addr & FLAGS_MASK)
    }

    /// `IS_FINISHED` is set.
    #[inline]
    #[must_use]
    pub const fn is_finished(self) -> bool {
        self.0 & IS_FINISHED != 0
    }

    /// `IS_NEEDED` is set.
    #[inline]
    #[must_use]
    pub const fn is_needed(self) -> bool {
        self.0 & IS_NEEDED != 0
    }

    /// `HAS_DATA` is set.
    #[inline]
    #[must_use]
    pub const fn has_data(self) -> bool {
        self.0 & HAS_DATA != 0
    }

    /// Raw flag bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> usize {
        self.0
    }
}

impl fmt::Display for PortFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (self.is_finished(), "FINISHED"),
            (self.is_needed(), "NEEDED"),
            (self.has_data(), "HAS_DATA"),
        ];
        let mut first = true;
        for (_, name) in names.iter().filter(|(set, _)| *set) {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(name)?;
            first = false;
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

impl fmt::Debug for PortFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PortFlags({self})")
    }
}

/// Result of a push that did not violate the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The payload now sits in the connection.
    Stored,
    /// The connection is finished; the payload was dropped unread.
    Discarded,
}

// ── Local slot ───────────────────────────────────────────────────────

/// Port-local owning handle of one [`Data`] slot.
pub(crate) struct DataPtr {
    ptr: NonNull<Data>,
}

// SAFETY: DataPtr uniquely owns a heap `Data`, which is itself Send + Sync.
unsafe impl Send for DataPtr {}
unsafe impl Sync for DataPtr {}

impl DataPtr {
    pub(crate) fn new() -> Self {
        let ptr = NonNull::from(Box::leak(Box::new(Data::default())));
        debug_assert_eq!(ptr.as_ptr().addr() & FLAGS_MASK, 0);
        Self { ptr }
    }

    #[cfg(test)]
    pub(crate) fn get(&self) -> &Data {
        // SAFETY: we own the slot until the next swap.
        unsafe { self.ptr.as_ref() }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self) -> &mut Data {
        // SAFETY: we own the slot until the next swap, and `&mut self` is unique.
        unsafe { self.ptr.as_mut() }
    }

    /// Publish the local slot with `set` flags, keeping the current flags
    /// outside `mask`. Returns the previous flags; the previous slot becomes
    /// the local one.
    #[cfg(test)]
    #[inline]
    pub(crate) fn swap(&mut self, state: &State, set: usize, mask: usize) -> PortFlags {
        match self.swap_if(state, set, mask, |_| true) {
            Ok(flags) | Err(flags) => flags,
        }
    }

    /// Like [`swap`](Self::swap), but abandons the exchange if `accept`
    /// rejects the current flags. On rejection nothing is written and the
    /// local slot is untouched.
    #[inline]
    pub(crate) fn swap_if(
        &mut self,
        state: &State,
        set: usize,
        mask: usize,
        accept: impl Fn(PortFlags) -> bool,
    ) -> Result<PortFlags, PortFlags> {
        debug_assert_eq!(set & !FLAGS_MASK, 0);
        debug_assert_eq!(mask & !FLAGS_MASK, 0);

        let local = self.ptr.as_ptr();
        let mut current = state.data.load(Ordering::Acquire);
        loop {
            let prev = PortFlags::from_addr(current.addr());
            if !accept(prev) {
                return Err(prev);
            }
            let desired = local.map_addr(|addr| addr | (prev.0 & !mask) | set);
            match state.data.compare_exchange_weak(
                current,
                desired,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    let taken = current.map_addr(|addr| addr & !FLAGS_MASK);
                    // SAFETY: the shared word is only null after `State` is
                    // dropped, and we hold a reference to it.
                    self.ptr = unsafe { NonNull::new_unchecked(taken) };
                    return Ok(prev);
                }
                Err(actual) => current = actual,
            }
        }
    }
}

impl Drop for DataPtr {
    fn drop(&mut self) {
        // SAFETY: the pointer came from `Box` (here or in `State::new`) and
        // ownership was transferred to us by the last swap.
        drop(unsafe { Box::from_raw(self.ptr.as_ptr()) });
    }
}

// ── Shared state ─────────────────────────────────────────────────────

/// The atomic word shared by one output port and one input port.
pub(crate) struct State {
    data: AtomicPtr<Data>,
}

impl State {
    /// Not finished, not needed, no data.
    pub(crate) fn new() -> Self {
        let slot = Box::into_raw(Box::new(Data::default()));
        debug_assert_eq!(slot.addr() & FLAGS_MASK, 0);
        Self {
            data: AtomicPtr::new(slot),
        }
    }

    #[inline]
    pub(crate) fn flags(&self) -> PortFlags {
        PortFlags::from_addr(self.data.load(Ordering::Acquire).addr())
    }

    /// Replace the flags under `mask` with `flags`, leaving the slot pointer
    /// alone. Returns the previous flags.
    #[inline]
    pub(crate) fn set_flags(&self, flags: usize, mask: usize) -> PortFlags {
        debug_assert_eq!(flags & !mask, 0);

        let mut current = self.data.load(Ordering::Acquire);
        loop {
            let desired = current.map_addr(|addr| (addr & !mask) | flags);
            match self.data.compare_exchange_weak(
                current,
                desired,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return PortFlags::from_addr(current.addr()),
                Err(actual) => current = actual,
            }
        }
    }

    /// Move the payload in `slot` into the connection.
    ///
    /// A finished connection swallows the payload. A connection that still
    /// holds data rejects the push and stays unchanged. In both cases the
    /// local slot is cleared so it can be reused.
    pub(crate) fn push(&self, slot: &mut DataPtr, port: PortId) -> Result<PushOutcome, PortError> {
        match slot.swap_if(self, HAS_DATA, HAS_DATA, |f| !f.is_finished() && !f.has_data()) {
            Ok(_) => Ok(PushOutcome::Stored),
            Err(flags) => {
                slot.get_mut().clear();
                if flags.is_finished() {
                    tracing::debug!(%port, %flags, "discarding push into finished port");
                    Ok(PushOutcome::Discarded)
                } else {
                    tracing::debug!(%port, %flags, "push into port which already has data");
                    Err(PortError::AlreadyHasData { port, flags })
                }
            }
        }
    }

    /// Take the payload out of the connection into `slot`.
    ///
    /// Clears `HAS_DATA`, and `IS_NEEDED` too when `set_not_needed`. A pull
    /// without data, or without demand unless `set_not_needed`, is rejected
    /// and leaves the connection unchanged.
    pub(crate) fn pull(
        &self,
        slot: &mut DataPtr,
        port: PortId,
        set_not_needed: bool,
    ) -> Result<PortFlags, PortError> {
        let mask = if set_not_needed {
            HAS_DATA | IS_NEEDED
        } else {
            HAS_DATA
        };

        slot.swap_if(self, 0, mask, |f| f.has_data() && (set_not_needed || f.is_needed()))
            .map_err(|flags| {
                tracing::debug!(%port, %flags, set_not_needed, "rejected pull");
                if flags.has_data() {
                    PortError::NotNeeded { port, flags }
                } else {
                    PortError::NoData { port, flags }
                }
            })
    }

    /// Take any payload out of the connection and drop it.
    ///
    /// Only `HAS_DATA` is cleared. Returns true if a payload was discarded.
    pub(crate) fn drain(&self, slot: &mut DataPtr) -> bool {
        let drained = slot.swap_if(self, 0, HAS_DATA, PortFlags::has_data).is_ok();
        slot.get_mut().clear();
        drained
    }
}

impl Drop for State {
    fn drop(&mut self) {
        let last = self.data.swap(core::ptr::null_mut(), Ordering::Acquire);
        let slot = last.map_addr(|addr| addr & !FLAGS_MASK);
        if !slot.is_null() {
            // SAFETY: the shared slot came from `Box` and nobody else can
            // reach it once the state is being dropped.
            drop(unsafe { Box::from_raw(slot) });
        }
    }
}
