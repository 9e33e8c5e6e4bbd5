//! Frame encoding/decoding over a byte stream.
//!
//! Each frame on the serial link is a marker byte, a 2-byte little-endian
//! payload length, and the payload:
//!
//! ```text
//! +--------+--------+--------+-------------------+
//! | marker | len_lo | len_hi | payload[0..len]   |
//! +--------+--------+--------+-------------------+
//! ```
//!
//! Host→device frames use `<` as the marker, device→host frames use `>`.
//! The stream is half-duplex: the reader here is a plain blocking loop that
//! accumulates partial reads until the declared length is satisfied.

use std::io::{self, Read, Write};

use bytes::BufMut;
use thiserror::Error;

use crate::constants::*;
use crate::error::ProtocolError;

/// Which side of the link a frame travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Host → device.
    Tx,
    /// Device → host.
    Rx,
}

impl Direction {
    /// The marker byte for this direction.
    pub const fn marker(&self) -> u8 {
        match self {
            Direction::Tx => FRAME_HEADER_TX,
            Direction::Rx => FRAME_HEADER_RX,
        }
    }
}

/// Errors from reading or writing a frame.
#[derive(Error, Debug)]
pub enum FrameError {
    /// The underlying transport failed (including read timeouts).
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    /// The frame itself was malformed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Encode a frame for the given direction.
pub fn encode_frame(direction: Direction, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(3 + payload.len());
    buf.push(direction.marker());
    buf.put_u16_le(payload.len() as u16);
    buf.extend_from_slice(payload);
    buf
}

/// Write a host→device frame to the transport.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError> {
    writer.write_all(&encode_frame(Direction::Tx, payload))?;
    Ok(())
}

/// Read one device→host frame from the transport.
///
/// Fails with [`ProtocolError::BadHeader`] if the marker byte is wrong and
/// [`ProtocolError::FrameTooLarge`] before reading any payload if the declared
/// length exceeds [`MAX_FRAME_SIZE`]. Transport failures, including read
/// timeouts, propagate as [`FrameError::Io`].
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>, FrameError> {
    let mut header = [0u8; 3];
    reader.read_exact(&mut header)?;

    if header[0] != FRAME_HEADER_RX {
        return Err(ProtocolError::BadHeader {
            got: header[0],
            want: FRAME_HEADER_RX,
        }
        .into());
    }

    let len = u16::from_le_bytes([header[1], header[2]]) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            max: MAX_FRAME_SIZE,
            actual: len,
        }
        .into());
    }

    // The transport may deliver fewer bytes than requested per call;
    // accumulate until the declared length is satisfied.
    let mut payload = vec![0u8; len];
    let mut total = 0;
    while total < len {
        let n = reader.read(&mut payload[total..])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "transport closed mid-frame",
            )
            .into());
        }
        total += n;
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_frame_round_trip() {
        let payload: Vec<u8> = (0..200).map(|i| (i % 251) as u8).collect();
        let encoded = encode_frame(Direction::Rx, &payload);
        let mut cursor = Cursor::new(encoded);
        let decoded = read_frame(&mut cursor).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_frame_round_trip_max_payload() {
        let payload = vec![0x5A; MAX_FRAME_SIZE];
        let encoded = encode_frame(Direction::Rx, &payload);
        let decoded = read_frame(&mut Cursor::new(encoded)).unwrap();
        assert_eq!(decoded.len(), MAX_FRAME_SIZE);
    }

    #[test]
    fn test_tx_frame_layout() {
        let encoded = encode_frame(Direction::Tx, b"abc");
        assert_eq!(encoded[0], b'<');
        assert_eq!(encoded[1], 3);
        assert_eq!(encoded[2], 0);
        assert_eq!(&encoded[3..], b"abc");
    }

    #[test]
    fn test_bad_header_rejected() {
        // A host→device marker arriving on the read side is a header error,
        // regardless of the declared length.
        let encoded = encode_frame(Direction::Tx, b"abc");
        let err = read_frame(&mut Cursor::new(encoded)).unwrap_err();
        match err {
            FrameError::Protocol(ProtocolError::BadHeader { got, want }) => {
                assert_eq!(got, b'<');
                assert_eq!(want, b'>');
            }
            other => panic!("expected bad header, got {:?}", other),
        }
    }

    #[test]
    fn test_oversize_frame_rejected_before_payload_read() {
        // Header declares 600 bytes but none follow; the length check must
        // fire before any payload read is attempted.
        let bytes = vec![b'>', 0x58, 0x02];
        let err = read_frame(&mut Cursor::new(bytes)).unwrap_err();
        match err {
            FrameError::Protocol(ProtocolError::FrameTooLarge { actual, max }) => {
                assert_eq!(actual, 600);
                assert_eq!(max, MAX_FRAME_SIZE);
            }
            other => panic!("expected frame too large, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_reads_accumulate() {
        // A reader that returns one byte at a time still yields a full frame.
        struct OneByte(Cursor<Vec<u8>>);
        impl Read for OneByte {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                let mut one = [0u8; 1];
                let n = self.0.read(&mut one)?;
                if n == 1 {
                    buf[0] = one[0];
                }
                Ok(n)
            }
        }

        let payload = b"slow and steady".to_vec();
        let mut reader = OneByte(Cursor::new(encode_frame(Direction::Rx, &payload)));
        assert_eq!(read_frame(&mut reader).unwrap(), payload);
    }

    #[test]
    fn test_truncated_stream_is_transport_error() {
        let mut encoded = encode_frame(Direction::Rx, b"abcdef");
        encoded.truncate(6);
        let err = read_frame(&mut Cursor::new(encoded)).unwrap_err();
        assert!(matches!(err, FrameError::Io(_)));
    }
}
