//! Push/pull exchange benchmarks.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use pipeport_chunk::{Chunk, ColumnSchema, DataType, Header};
use pipeport_core::{InputPort, OutputPort, PortInfo, UpdateList, connect};
use std::thread;

fn pair(columns: usize) -> (OutputPort, InputPort) {
    let header: Header = (0..columns)
        .map(|i| ColumnSchema::new(format!("c{i}"), DataType::UInt64))
        .collect();
    let mut output = OutputPort::new(header.clone());
    let mut input = InputPort::new(header);
    connect(&mut output, &mut input).unwrap();
    (output, input)
}

fn chunk(columns: usize) -> Chunk {
    Chunk::from_columns((0..columns as u64).map(|c| vec![c; 1024])).unwrap()
}

/// One thread alternating push and pull: the uncontended cost of two swaps.
fn round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip");

    let iterations = 10_000u64;
    group.throughput(Throughput::Elements(iterations));

    for columns in [1, 8, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(columns), &columns, |b, &columns| {
            let (mut output, mut input) = pair(columns);
            input.set_needed().unwrap();
            let payload = chunk(columns);
            b.iter(|| {
                for _ in 0..iterations {
                    output.push(payload.clone()).unwrap();
                    black_box(input.pull(false).unwrap());
                }
            })
        });
    }
    group.finish();
}

/// Same loop with both ports reporting into a scheduler list.
fn round_trip_tracked(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip_tracked");

    let iterations = 10_000u64;
    group.throughput(Throughput::Elements(iterations));

    group.bench_function("cols_8", |b| {
        let list = UpdateList::new();
        let (mut output, mut input) = pair(8);
        let out_info = output.track_updates(&list);
        let in_info = input.track_updates(&list);
        input.set_needed().unwrap();
        let payload = chunk(8);
        b.iter(|| {
            for _ in 0..iterations {
                output.push(payload.clone()).unwrap();
                black_box(input.pull(false).unwrap());
            }
            black_box(list.drain());
            out_info.trigger();
            in_info.trigger();
        })
    });

    group.finish();
}

fn cross_thread_run(iterations: u64) -> u64 {
    let (mut output, mut input) = pair(4);
    let payload = chunk(4);

    let producer = thread::spawn(move || {
        for _ in 0..iterations {
            while !output.can_push().unwrap() {
                std::hint::spin_loop();
            }
            output.push(payload.clone()).unwrap();
        }
        output.finish().unwrap();
    });

    let consumer = thread::spawn(move || {
        input.set_needed().unwrap();
        let mut count = 0u64;
        loop {
            if input.has_data().unwrap() {
                black_box(input.pull(false).unwrap());
                count += 1;
            } else if input.is_finished().unwrap() {
                break;
            } else {
                std::hint::spin_loop();
            }
        }
        count
    });

    producer.join().unwrap();
    consumer.join().unwrap()
}

/// Producer and consumer on separate threads, spinning on the flags.
fn cross_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_thread");

    let iterations = 50_000u64;
    group.throughput(Throughput::Elements(iterations));
    group.bench_function("cols_4", |b| b.iter(|| cross_thread_run(iterations)));

    group.finish();
}

criterion_group!(benches, round_trip, round_trip_tracked, cross_thread);
criterion_main!(benches);
