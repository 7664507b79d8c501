//! Mock serial port implementation for testing.
//!
//! `MockSerialPort` stands in for the board's UART. Clones share state, so a
//! test can keep one clone for inspection while the runner owns another.

use super::error::PortError;
use super::traits::SerialPortAdapter;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Inner state of the mock port.
#[derive(Debug, Default)]
struct MockPortState {
    /// Bytes the "board" has sent and the host has not read yet.
    read_queue: VecDeque<u8>,
    /// Every accepted write call, in order.
    write_log: Vec<Vec<u8>>,
    /// Upper bound on bytes accepted per write call.
    max_write_chunk: Option<usize>,
    /// Upper bound on bytes returned per read call.
    max_read_chunk: Option<usize>,
    /// Accept nothing on write.
    stall_writes: bool,
    /// Echo every accepted write back into the read queue.
    loopback: bool,
    /// Reported in the timeout error of an empty read.
    timeout: Duration,
    flush_count: usize,
    input_clears: usize,
}

/// Mock serial port implementation for testing.
///
/// # Example
/// ```
/// use uart_conformance::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(b"bleh bleh bleh");
///
/// let mut buffer = [0u8; 14];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"bleh bleh bleh");
///
/// port.write_bytes(b"meow meow meow").unwrap();
/// assert_eq!(port.transmitted(), b"meow meow meow");
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState {
                timeout: Duration::from_millis(100),
                ..Default::default()
            })),
        }
    }

    /// Enqueue bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Get a copy of every accepted write call.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// All accepted bytes concatenated, as the board would see them.
    pub fn transmitted(&self) -> Vec<u8> {
        self.state.lock().write_log.concat()
    }

    /// Accept at most `chunk` bytes per write call.
    pub fn set_max_write_chunk(&mut self, chunk: usize) {
        self.state.lock().max_write_chunk = Some(chunk);
    }

    /// Return at most `chunk` bytes per read call.
    pub fn set_max_read_chunk(&mut self, chunk: usize) {
        self.state.lock().max_read_chunk = Some(chunk);
    }

    /// Make every write accept zero bytes.
    pub fn set_stall_writes(&mut self, stall: bool) {
        self.state.lock().stall_writes = stall;
    }

    /// Loop transmitted bytes back into the receive queue (TX wired to RX).
    pub fn set_loopback(&mut self, loopback: bool) {
        self.state.lock().loopback = loopback;
    }

    /// Number of flush calls seen.
    pub fn flush_count(&self) -> usize {
        self.state.lock().flush_count
    }

    /// Number of input-buffer resets seen.
    pub fn input_clears(&self) -> usize {
        self.state.lock().input_clears
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    /// Number of live clones sharing this port's state.
    ///
    /// Drops to one once every handle given to a runner has been released.
    pub fn live_handles(&self) -> usize {
        Arc::strong_count(&self.state)
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        if state.stall_writes || data.is_empty() {
            return Ok(0);
        }

        let accepted = state.max_write_chunk.map_or(data.len(), |c| c.min(data.len()));
        let chunk = data[..accepted].to_vec();

        if state.loopback {
            state.read_queue.extend(chunk.iter().copied());
        }
        state.write_log.push(chunk);

        Ok(accepted)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        let limit = state
            .max_read_chunk
            .map_or(buffer.len(), |c| c.min(buffer.len()));

        let mut bytes_read = 0;
        for byte in buffer[..limit].iter_mut() {
            match state.read_queue.pop_front() {
                Some(queued) => {
                    *byte = queued;
                    bytes_read += 1;
                }
                None => break,
            }
        }

        if bytes_read == 0 && !buffer.is_empty() {
            // Nothing arrived within the per-call timeout
            Err(PortError::timeout(state.timeout))
        } else {
            Ok(bytes_read)
        }
    }

    fn flush(&mut self) -> Result<(), PortError> {
        self.state.lock().flush_count += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn clear_input(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        state.read_queue.clear();
        state.input_clears += 1;
        Ok(())
    }

    fn bytes_to_read(&self) -> Option<usize> {
        Some(self.state.lock().read_queue.len())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}
