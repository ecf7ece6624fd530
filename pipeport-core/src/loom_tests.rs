#![cfg(all(test, loom))]

use loom::sync::Arc;
use loom::thread;
use pipeport_chunk::{Chunk, ColumnSchema, DataType, Header};

use crate::state::{DataPtr, HAS_DATA, IS_FINISHED, IS_NEEDED, State};
use crate::{Data, InputPort, OutputPort, PortInfo, PushOutcome, UpdateInfo, UpdateList, connect};

fn pair() -> (OutputPort, InputPort) {
    let header = Header::new(vec![ColumnSchema::new("v", DataType::UInt64)]);
    let mut output = OutputPort::new(header.clone());
    let mut input = InputPort::new(header);
    connect(&mut output, &mut input).unwrap();
    (output, input)
}

fn value(chunk: u64) -> Chunk {
    Chunk::from_columns([vec![chunk]]).unwrap()
}

#[test]
fn push_pull_handoff() {
    loom::model(|| {
        let (mut output, mut input) = pair();
        input.set_needed().unwrap();

        let producer = thread::spawn(move || {
            for i in 0..2u64 {
                while !output.can_push().unwrap() {
                    thread::yield_now();
                }
                output.push(value(i)).unwrap();
            }
            output.finish().unwrap();
        });

        let mut received = Vec::new();
        loop {
            if input.has_data().unwrap() {
                received.push(input.pull(false).unwrap());
            } else if input.is_finished().unwrap() {
                break;
            } else {
                thread::yield_now();
            }
        }

        producer.join().unwrap();
        assert_eq!(received, vec![value(0), value(1)]);
    });
}

#[test]
fn close_races_push() {
    loom::model(|| {
        let (mut output, mut input) = pair();
        input.set_needed().unwrap();

        let producer = thread::spawn(move || output.push(value(7)).unwrap());

        input.close().unwrap();
        let outcome = producer.join().unwrap();

        // Either the push landed before the close, or it was swallowed.
        assert!(input.is_finished().unwrap());
        match outcome {
            PushOutcome::Stored => assert!(input.has_data().unwrap()),
            PushOutcome::Discarded => assert!(!input.has_data().unwrap()),
        }
    });
}

#[test]
fn flag_toggles_do_not_lose_payload() {
    loom::model(|| {
        let state = Arc::new(State::new());

        let writer_state = Arc::clone(&state);
        let writer = thread::spawn(move || {
            let mut slot = DataPtr::new();
            *slot.get_mut() = Data::from_chunk(Chunk::with_rows(3));
            slot.swap(&writer_state, HAS_DATA, HAS_DATA);
        });

        let toggler_state = Arc::clone(&state);
        let toggler = thread::spawn(move || {
            toggler_state.set_flags(IS_NEEDED, IS_NEEDED);
            toggler_state.set_flags(IS_FINISHED, IS_FINISHED);
            toggler_state.set_flags(0, IS_NEEDED);
        });

        writer.join().unwrap();
        toggler.join().unwrap();

        let flags = state.flags();
        assert!(flags.has_data());
        assert!(flags.is_finished());
        assert!(!flags.is_needed());

        let mut reader = DataPtr::new();
        reader.swap(&state, 0, HAS_DATA);
        assert_eq!(reader.get().chunk().num_rows(), 3);
    });
}

#[test]
fn update_racing_trigger_is_never_lost() {
    loom::model(|| {
        let list = UpdateList::new();
        let (output, _input) = pair();
        let info = Arc::new(UpdateInfo::new(output.id(), list.clone()));

        // One notification already handed to the scheduler.
        info.update();
        assert_eq!(list.drain(), vec![output.id()]);

        let stage_info = Arc::clone(&info);
        let stage = thread::spawn(move || stage_info.update());

        info.trigger();
        stage.join().unwrap();

        // Either the update was enqueued, or the detector is armed for the
        // next one. Never neither, never both.
        let enqueued = list.drain().len();
        assert!(enqueued <= 1);
        assert_ne!(enqueued == 1, info.is_armed());
        assert_eq!(info.version(), 2);
    });
}
