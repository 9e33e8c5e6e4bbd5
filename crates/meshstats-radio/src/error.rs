//! Transport-session error classification.

use std::io;

use thiserror::Error;

use meshstats_protocol::frame::FrameError;
use meshstats_protocol::ProtocolError;

/// Errors from exchanging frames with the companion radio.
///
/// Read timeouts are separated from genuine transport failures at
/// construction time so callers can match on [`LinkError::Timeout`] instead
/// of inspecting `io::ErrorKind` values.
#[derive(Error, Debug)]
pub enum LinkError {
    /// The serial port failed (device gone, I/O error, stream closed).
    #[error("serial transport: {0}")]
    Io(io::Error),

    /// The device answered, but with a malformed or unexpected payload.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// No qualifying frame arrived within the deadline.
    #[error("timed out waiting for a frame")]
    Timeout,
}

impl LinkError {
    /// True when the session cannot continue on this port handle and the
    /// caller should reconnect (and possibly reboot the radio).
    ///
    /// Timeouts are not fatal: a silent repeater is routine. A framing
    /// header mismatch is fatal because it means the byte stream has lost
    /// sync and every subsequent read would misparse.
    pub fn is_fatal(&self) -> bool {
        match self {
            LinkError::Io(_) => true,
            LinkError::Protocol(ProtocolError::BadHeader { .. }) => true,
            LinkError::Protocol(_) | LinkError::Timeout => false,
        }
    }
}

impl From<FrameError> for LinkError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Io(e)
                if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) =>
            {
                LinkError::Timeout
            }
            FrameError::Io(e) => LinkError::Io(e),
            FrameError::Protocol(e) => LinkError::Protocol(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_timeout_becomes_timeout() {
        let frame_err = FrameError::Io(io::Error::new(io::ErrorKind::TimedOut, "no data"));
        assert!(matches!(LinkError::from(frame_err), LinkError::Timeout));
    }

    #[test]
    fn test_fatal_classification() {
        let gone = LinkError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "pipe"));
        assert!(gone.is_fatal());

        let desync = LinkError::Protocol(ProtocolError::BadHeader { got: 0, want: b'>' });
        assert!(desync.is_fatal());

        let short = LinkError::Protocol(ProtocolError::FrameTooShort {
            expected: 8,
            actual: 2,
        });
        assert!(!short.is_fatal());

        assert!(!LinkError::Timeout.is_fatal());
    }
}
