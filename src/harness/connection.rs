//! Scoped serial connection owned by a single test case.
//!
//! The transport is released when the `Connection` is dropped, whichever
//! way the case ends.

use crate::port::{PortConfiguration, PortError, PortOpener, SerialPortAdapter};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Open serial transport plus the read deadline applied to `read_exact`.
#[derive(Debug)]
pub struct Connection {
    port: Box<dyn SerialPortAdapter>,
    read_timeout: Duration,
}

impl Connection {
    /// Open `path` and wait `settle` before returning, giving the board time
    /// to finish its own initialization.
    pub fn open<O>(
        opener: &O,
        path: &str,
        config: &PortConfiguration,
        settle: Duration,
        read_timeout: Duration,
    ) -> Result<Self, PortError>
    where
        O: PortOpener + ?Sized,
    {
        let port = opener.open(path, config)?;
        debug!(path, baud = config.baud_rate, "opened device");

        if !settle.is_zero() {
            thread::sleep(settle);
        }

        Ok(Self::from_port(port, read_timeout))
    }

    /// Wrap an already-open transport.
    pub fn from_port(port: Box<dyn SerialPortAdapter>, read_timeout: Duration) -> Self {
        Self { port, read_timeout }
    }

    pub fn name(&self) -> &str {
        self.port.name()
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Write all of `bytes`, then flush.
    ///
    /// The transport may accept a prefix per call, so this loops on the
    /// remaining slice until everything is handed over.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize, PortError> {
        let mut offset = 0;
        while offset < bytes.len() {
            match self.port.write_bytes(&bytes[offset..]) {
                Ok(0) => {
                    return Err(PortError::WriteStalled {
                        written: offset,
                        total: bytes.len(),
                    })
                }
                Ok(n) => offset += n,
                Err(PortError::Io(e)) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }

        self.port.flush()?;
        trace!(bytes = offset, "write flushed");
        Ok(offset)
    }

    /// Read until `n` bytes arrived or the read deadline passed.
    ///
    /// Returns fewer than `n` bytes on timeout; never pads.
    pub fn read_exact(&mut self, n: usize) -> Result<Vec<u8>, PortError> {
        let mut buffer = vec![0u8; n];
        let mut filled = 0;
        let deadline = Instant::now() + self.read_timeout;

        while filled < n {
            match self.port.read_bytes(&mut buffer[filled..]) {
                Ok(read) => filled += read,
                Err(e) if e.is_timeout() => {}
                Err(PortError::Io(e)) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }

            if filled < n && Instant::now() >= deadline {
                debug!(wanted = n, got = filled, "read deadline passed");
                break;
            }
        }

        buffer.truncate(filled);
        Ok(buffer)
    }

    /// Write `bytes` in `unit`-sized pieces, sleeping `delay` before each
    /// piece and flushing after it.
    pub fn write_paced(
        &mut self,
        bytes: &[u8],
        unit: usize,
        delay: Duration,
    ) -> Result<usize, PortError> {
        let mut total = 0;
        for piece in bytes.chunks(unit.max(1)) {
            thread::sleep(delay);
            total += self.write(piece)?;
        }
        Ok(total)
    }

    /// Discard anything already received.
    pub fn reset_input_buffer(&mut self) -> Result<(), PortError> {
        if let Some(pending) = self.port.bytes_to_read().filter(|&n| n > 0) {
            debug!(discarded = pending, "dropping unread input");
        }
        self.port.clear_input()
    }

    /// Release the transport now instead of at end of scope.
    pub fn close(self) {}
}

impl Drop for Connection {
    fn drop(&mut self) {
        debug!(path = self.port.name(), "closing device");
    }
}
