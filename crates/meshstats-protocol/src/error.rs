//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when parsing protocol frames and payloads.
///
/// These are all "the device answered, but wrong" conditions. Transport
/// failures (read/write errors, timeouts) are classified separately by the
/// session layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame header byte did not match the device→host marker.
    #[error("invalid frame header: got 0x{got:02X}, expected 0x{want:02X}")]
    BadHeader {
        /// Byte actually received.
        got: u8,
        /// Expected marker byte.
        want: u8,
    },

    /// Declared frame length exceeds the protocol maximum.
    #[error("frame too large: {actual} bytes, maximum {max}")]
    FrameTooLarge {
        /// Maximum allowed payload length.
        max: usize,
        /// Declared payload length.
        actual: usize,
    },

    /// Frame is too short for the payload it claims to carry.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Leading opcode did not match the expected value.
    #[error("unexpected opcode: got 0x{got:02X}, expected 0x{want:02X}")]
    UnexpectedOpcode {
        /// Opcode actually received.
        got: u8,
        /// Opcode the caller was expecting.
        want: u8,
    },

    /// Opcode is not one this client understands.
    #[error("unknown response code: 0x{0:02X}")]
    UnknownResponse(u8),

    /// Unknown stats sub-type in a stats response.
    #[error("unknown stats type: {0}")]
    UnknownStatsType(u8),

    /// Firmware returned an error response.
    #[error("firmware error code {0}")]
    FirmwareError(u8),
}
