use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to open {port}: {reason}")]
    OpenFailed { port: String, reason: String },
}

/// A byte stream to a serial device with an open/closed lifecycle.
///
/// Reads use the `std::io` error vocabulary so callers can tell an idle timeout apart
/// from a dead connection.
pub trait SerialTransport: Send {
    /// Number of bytes that can be read without blocking.
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Read into `buf`. Blocks for at most the timeout the transport was opened with.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn is_open(&self) -> bool;

    /// Close the connection. Closing an already closed transport is a no-op.
    fn close(&mut self) -> Result<(), TransportError>;
}

/// Opens serial transports by device path.
pub trait PortOpener {
    fn open(
        &self,
        path: &str,
        baud_rate: u32,
        read_timeout: Duration,
    ) -> Result<Box<dyn SerialTransport>, TransportError>;
}
