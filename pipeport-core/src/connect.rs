//! Binding an output port to an input port.

use std::sync::Arc;

use crate::state::State;
use crate::{InputPort, OutputPort, PortError, PortInfo};

/// Options for binding two ports.
///
/// # Example
///
/// ```
/// use pipeport_chunk::{ColumnSchema, DataType, Header};
/// use pipeport_core::{Connector, InputPort, OutputPort};
///
/// let header = Header::new(vec![ColumnSchema::new("x", DataType::UInt64)]);
/// let mut output = OutputPort::new(header.clone());
/// let mut input = InputPort::new(header);
///
/// Connector::new().connect(&mut output, &mut input).unwrap();
///
/// // Move the input to a new producer.
/// let mut relocated = OutputPort::new(input.shared_header().clone());
/// Connector::new()
///     .reconnect()
///     .connect(&mut relocated, &mut input)
///     .unwrap();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connector {
    reconnect: bool,
    check_headers: bool,
}

impl Default for Connector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector {
    /// Strict binding: both ports unconnected, headers structurally equal.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reconnect: false,
            check_headers: true,
        }
    }

    /// Replace existing bindings instead of failing.
    ///
    /// Used when a pipeline fragment is moved into a larger graph.
    #[must_use]
    pub const fn reconnect(mut self) -> Self {
        self.reconnect = true;
        self
    }

    /// Accept headers whose column types differ.
    ///
    /// Column counts must still match: a pull cannot inspect a payload's
    /// arity without taking it out of the connection.
    #[must_use]
    pub const fn allow_incompatible_headers(mut self) -> Self {
        self.check_headers = false;
        self
    }

    /// Bind `output` to `input` through a fresh connection.
    ///
    /// The connection starts not finished, not needed and empty.
    ///
    /// # Errors
    /// - [`PortError::AlreadyConnected`] if either port is bound and
    ///   [`reconnect`](Self::reconnect) was not requested.
    /// - [`PortError::IncompatibleHeaders`] if the headers differ in column
    ///   count, or in types unless
    ///   [`allow_incompatible_headers`](Self::allow_incompatible_headers) was
    ///   requested.
    ///
    /// On error neither port is modified.
    pub fn connect(self, output: &mut OutputPort, input: &mut InputPort) -> Result<(), PortError> {
        if !self.reconnect {
            for port in [&*input as &dyn PortInfo, &*output as &dyn PortInfo] {
                if port.is_connected() {
                    return Err(PortError::AlreadyConnected {
                        port: port.id(),
                        header: port.header().dump_structure(),
                    });
                }
            }
        }

        let (out_header, in_header) = (output.header(), input.header());
        let compatible = if self.check_headers {
            out_header.has_equal_structure(in_header)
        } else {
            out_header.columns() == in_header.columns()
        };
        if !compatible {
            return Err(PortError::IncompatibleHeaders {
                output: out_header.dump_structure(),
                input: in_header.dump_structure(),
            });
        }

        let replaced = input.is_connected() || output.is_connected();
        let state = Arc::new(State::new());
        input.attach(Arc::clone(&state), output.id());
        output.attach(state, input.id());

        tracing::debug!(
            output = %output.id(),
            input = %input.id(),
            header = %input.header().dump_structure(),
            replaced,
            "ports connected"
        );
        Ok(())
    }
}

/// Bind `output` to `input` with the default [`Connector`].
///
/// # Errors
/// See [`Connector::connect`].
pub fn connect(output: &mut OutputPort, input: &mut InputPort) -> Result<(), PortError> {
    Connector::new().connect(output, input)
}
