mod state;

use pipeport_chunk::{Chunk, ColumnSchema, DataType, Header};

use crate::{InputPort, OutputPort};

fn header(columns: usize) -> Header {
    (0..columns)
        .map(|i| ColumnSchema::new(format!("c{i}"), DataType::UInt64))
        .collect()
}

/// Chunk with `columns` columns of `rows` sequential values each.
fn chunk(columns: usize, rows: u64) -> Chunk {
    Chunk::from_columns((0..columns as u64).map(|c| (0..rows).map(|r| c * 100 + r).collect::<Vec<_>>()))
        .unwrap()
}

fn connected(columns: usize) -> (OutputPort, InputPort) {
    let mut output = OutputPort::new(header(columns));
    let mut input = InputPort::new(header(columns));
    crate::connect(&mut output, &mut input).unwrap();
    (output, input)
}
