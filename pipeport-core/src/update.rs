//! Edge-triggered change notifications for an external scheduler.
//!
//! Each port may carry an [`UpdateInfo`]. Whenever the port changes state in
//! a way its peer must react to, it calls [`UpdateInfo::update`]. The first
//! update after a [`trigger`](UpdateInfo::trigger) pushes the port's id into
//! the scheduler's [`UpdateList`]; later updates only bump the version. A
//! burst of pushes and pulls therefore costs the scheduler one wake-up.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::PortId;
use crate::sync::{AtomicU64, Ordering};

/// Scheduler-owned collection of ports whose state changed.
///
/// Cloning yields another handle to the same collection.
#[derive(Debug, Clone, Default)]
pub struct UpdateList {
    dirty: Arc<Mutex<Vec<PortId>>>,
}

impl UpdateList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` as dirty.
    pub fn push(&self, id: PortId) {
        self.dirty.lock().push(id);
    }

    /// Take every recorded id, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<PortId> {
        core::mem::take(&mut *self.dirty.lock())
    }

    /// Number of recorded ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dirty.lock().len()
    }

    /// True if nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dirty.lock().is_empty()
    }
}

/// Set while no notification is outstanding since the last trigger.
const ARMED: u64 = 1;
/// One update, counted above the armed bit.
const VERSION_STEP: u64 = 2;

/// Per-port edge detector feeding an [`UpdateList`].
///
/// The version counter and the armed bit share one atomic word, so an
/// update racing a trigger is either seen by the scheduler or leaves the
/// detector armed for the next update.
#[derive(Debug)]
pub struct UpdateInfo {
    id: PortId,
    list: Option<UpdateList>,
    /// `version << 1 | ARMED`.
    state: AtomicU64,
}

impl UpdateInfo {
    /// Detector reporting `id` into `list`.
    #[must_use]
    pub fn new(id: PortId, list: UpdateList) -> Self {
        Self {
            id,
            list: Some(list),
            state: AtomicU64::new(ARMED),
        }
    }

    /// Detector that only counts versions.
    #[must_use]
    pub fn detached(id: PortId) -> Self {
        Self {
            id,
            list: None,
            state: AtomicU64::new(ARMED),
        }
    }

    /// Id pushed into the list.
    #[must_use]
    pub fn id(&self) -> PortId {
        self.id
    }

    /// Note a state change.
    ///
    /// Enqueues the id only if no notification is outstanding since the last
    /// [`trigger`](Self::trigger).
    #[inline]
    pub fn update(&self) {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let desired = (current & !ARMED).wrapping_add(VERSION_STEP);
            match self.state.compare_exchange_weak(
                current,
                desired,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        if current & ARMED != 0 {
            if let Some(list) = &self.list {
                list.push(self.id);
            }
        }
    }

    /// Re-arm the detector. Called by the scheduler after it has examined
    /// this port.
    #[inline]
    pub fn trigger(&self) {
        self.state.fetch_or(ARMED, Ordering::AcqRel);
    }

    /// Number of updates so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.load(Ordering::Acquire) >> 1
    }

    /// True if the next update will enqueue a notification.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.state.load(Ordering::Acquire) & ARMED != 0
    }
}
