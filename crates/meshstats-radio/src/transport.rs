//! Byte-stream transport abstraction over the serial port.
//!
//! [`RadioLink`](crate::RadioLink) talks to a [`Transport`] rather than a
//! concrete serial handle so tests can script exchanges in memory. The only
//! production implementation wraps the `serialport` crate.

use std::io::{self, Read, Write};
use std::time::Duration;

use crate::error::LinkError;

/// Default per-read timeout on the serial port.
///
/// Synchronous responses arrive well inside this; remote pushes use the
/// wider deadline in `wait_for_push`.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// A blocking byte stream with an adjustable read timeout.
pub trait Transport: Read + Write + Send {
    /// Change the timeout applied to each blocking read.
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()>;
}

/// Opens fresh transports, both at startup and on reconnect.
pub trait Connector: Send + Sync {
    /// Open a new transport, discarding any previous one.
    fn connect(&self) -> Result<Box<dyn Transport>, LinkError>;
}

/// Connector for a real serial device.
#[derive(Debug, Clone)]
pub struct SerialConnector {
    /// Device path, e.g. `/dev/ttyACM0`.
    pub path: String,
    /// Baud rate, typically 115200.
    pub baud_rate: u32,
}

impl SerialConnector {
    /// Create a connector for the given device path and baud rate.
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
        }
    }
}

impl Connector for SerialConnector {
    fn connect(&self) -> Result<Box<dyn Transport>, LinkError> {
        let port = serialport::new(&self.path, self.baud_rate)
            .timeout(DEFAULT_READ_TIMEOUT)
            .open()
            .map_err(|e| LinkError::Io(serial_io_error(e)))?;
        tracing::info!(path = %self.path, baud = self.baud_rate, "serial port opened");
        Ok(Box::new(SerialTransport { port }))
    }
}

struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl Read for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl Transport for SerialTransport {
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.port.set_timeout(timeout).map_err(serial_io_error)
    }
}

/// Map a `serialport` error onto the `io::ErrorKind` taxonomy the session
/// layer classifies with.
fn serial_io_error(err: serialport::Error) -> io::Error {
    let kind = match err.kind {
        serialport::ErrorKind::NoDevice => io::ErrorKind::NotFound,
        serialport::ErrorKind::Io(kind) => kind,
        _ => io::ErrorKind::Other,
    };
    io::Error::new(kind, err.description)
}
