use pipeport_chunk::Chunk;

use crate::state::{DataPtr, HAS_DATA, IS_FINISHED, IS_NEEDED, State};
use crate::{Data, PortError, PortId, PushOutcome};

fn port_id() -> PortId {
    crate::PortInfo::id(&crate::OutputPort::new(super::header(0)))
}

#[test]
fn fresh_state_has_no_flags() {
    let state = State::new();
    let flags = state.flags();
    assert!(!flags.is_finished());
    assert!(!flags.is_needed());
    assert!(!flags.has_data());
    assert_eq!(flags.bits(), 0);
}

#[test]
fn set_flags_returns_previous_and_keeps_others() {
    let state = State::new();
    assert_eq!(state.set_flags(IS_NEEDED, IS_NEEDED).bits(), 0);
    let prev = state.set_flags(IS_FINISHED, IS_FINISHED);
    assert!(prev.is_needed());
    assert!(!prev.is_finished());

    let now = state.flags();
    assert!(now.is_needed() && now.is_finished());

    state.set_flags(0, IS_NEEDED);
    assert!(!state.flags().is_needed());
    assert!(state.flags().is_finished());
}

#[test]
fn swap_moves_slot_ownership() {
    let state = State::new();
    let mut producer = DataPtr::new();
    let mut consumer = DataPtr::new();

    *producer.get_mut() = Data::from_chunk(Chunk::with_rows(7));
    let prev = producer.swap(&state, HAS_DATA, HAS_DATA);
    assert!(!prev.has_data());
    assert!(state.flags().has_data());
    // The producer now holds the state's initial empty slot.
    assert!(producer.get().is_empty());

    let prev = consumer.swap(&state, 0, HAS_DATA);
    assert!(prev.has_data());
    assert!(!state.flags().has_data());
    assert_eq!(consumer.get().chunk().num_rows(), 7);
}

#[test]
fn swap_preserves_flags_outside_mask() {
    let state = State::new();
    state.set_flags(IS_NEEDED | IS_FINISHED, IS_NEEDED | IS_FINISHED);

    let mut slot = DataPtr::new();
    slot.swap(&state, HAS_DATA, HAS_DATA);
    let flags = state.flags();
    assert!(flags.is_needed() && flags.is_finished() && flags.has_data());

    slot.swap(&state, 0, HAS_DATA | IS_NEEDED);
    let flags = state.flags();
    assert!(!flags.is_needed() && !flags.has_data());
    assert!(flags.is_finished());
}

#[test]
fn swap_if_rejection_leaves_everything_alone() {
    let state = State::new();
    let mut slot = DataPtr::new();
    *slot.get_mut() = Data::from_chunk(Chunk::with_rows(1));

    let err = slot.swap_if(&state, HAS_DATA, HAS_DATA, |_| false).unwrap_err();
    assert_eq!(err.bits(), 0);
    assert_eq!(state.flags().bits(), 0);
    assert_eq!(slot.get().chunk().num_rows(), 1);
}

#[test]
fn push_into_occupied_state_is_rejected() {
    let state = State::new();
    let port = port_id();
    let mut slot = DataPtr::new();

    *slot.get_mut() = Data::from_chunk(Chunk::with_rows(1));
    assert_eq!(state.push(&mut slot, port).unwrap(), PushOutcome::Stored);

    *slot.get_mut() = Data::from_chunk(Chunk::with_rows(2));
    let err = state.push(&mut slot, port).unwrap_err();
    assert!(matches!(err, PortError::AlreadyHasData { .. }));
    assert!(slot.get().is_empty(), "rejected payload is cleared");

    let mut reader = DataPtr::new();
    state.pull(&mut reader, port, true).unwrap();
    assert_eq!(reader.get().chunk().num_rows(), 1, "first payload survives");
}

#[test]
fn push_into_finished_state_is_discarded() {
    let state = State::new();
    state.set_flags(IS_FINISHED, IS_FINISHED);
    let mut slot = DataPtr::new();
    *slot.get_mut() = Data::from_chunk(Chunk::with_rows(1));

    assert_eq!(state.push(&mut slot, port_id()).unwrap(), PushOutcome::Discarded);
    assert!(!state.flags().has_data());
    assert!(slot.get().is_empty());
}

#[test]
fn pull_checks_data_before_demand() {
    let state = State::new();
    let mut slot = DataPtr::new();
    let port = port_id();

    let err = state.pull(&mut slot, port, false).unwrap_err();
    assert!(matches!(err, PortError::NoData { .. }));

    let mut writer = DataPtr::new();
    *writer.get_mut() = Data::from_chunk(Chunk::with_rows(1));
    state.push(&mut writer, port).unwrap();

    let err = state.pull(&mut slot, port, false).unwrap_err();
    assert!(matches!(err, PortError::NotNeeded { .. }));
    assert!(state.flags().has_data());

    // Pulling with set_not_needed does not require demand.
    let prev = state.pull(&mut slot, port, true).unwrap();
    assert!(prev.has_data());
}

#[test]
fn drain_discards_only_the_payload() {
    let state = State::new();
    let mut slot = DataPtr::new();
    assert!(!state.drain(&mut slot));

    *slot.get_mut() = Data::from_chunk(Chunk::with_rows(5));
    state.push(&mut slot, port_id()).unwrap();
    state.set_flags(IS_FINISHED | IS_NEEDED, IS_FINISHED | IS_NEEDED);

    assert!(state.drain(&mut slot));
    assert!(slot.get().is_empty());
    let flags = state.flags();
    assert!(!flags.has_data());
    assert!(flags.is_finished() && flags.is_needed());
}

#[test]
fn flags_display() {
    let state = State::new();
    assert_eq!(state.flags().to_string(), "none");
    state.set_flags(IS_FINISHED | IS_NEEDED, IS_FINISHED | IS_NEEDED);
    assert_eq!(state.flags().to_string(), "FINISHED|NEEDED");
}

#[test]
fn dropping_state_with_payload_frees_it() {
    use std::sync::Arc;

    use pipeport_chunk::Column;

    let column = Arc::new(Column::from(vec![1u64, 2, 3]));
    let state = State::new();
    let mut slot = DataPtr::new();
    *slot.get_mut() = Data::from_chunk(Chunk::new(vec![Arc::clone(&column)], 3).unwrap());
    state.push(&mut slot, port_id()).unwrap();
    assert_eq!(Arc::strong_count(&column), 2);

    drop(state);
    assert_eq!(Arc::strong_count(&column), 1);
    drop(slot);
}
