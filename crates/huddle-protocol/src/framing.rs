//! Frame packing and the stateful stream unpacker.
//!
//! Frames are laid out as a fixed header followed by the payload:
//!
//! ```text
//! +------------+----------+----------------+-----------------+
//! | magic (2)  | kind (1) | length (4 BE)  |  JSON payload   |
//! +------------+----------+----------------+-----------------+
//! ```
//!
//! The same scheme is used in both directions. Keep-alive ping/pong frames
//! carry an empty payload and never reach the application layer; data
//! frames carry exactly one JSON document.

use serde::{Serialize, de::DeserializeOwned};

use crate::MAX_FRAME_SIZE;
use crate::error::{ProtocolError, ProtocolResult};

/// Two-byte marker opening every frame ("HU", big-endian).
pub const FRAME_MAGIC: u16 = 0x4855;

/// Bytes of header preceding the payload: magic + kind + length.
pub const FRAME_HEADER_LEN: usize = 7;

/// What a frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// One JSON document.
    Data,
    /// Keep-alive probe.
    Ping,
    /// Keep-alive answer.
    Pong,
}

impl FrameKind {
    /// Decodes the header kind byte.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Data),
            0x02 => Some(Self::Ping),
            0x03 => Some(Self::Pong),
            _ => None,
        }
    }

    /// The header byte for this kind.
    #[must_use]
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Data => 0x01,
            Self::Ping => 0x02,
            Self::Pong => 0x03,
        }
    }
}

/// One complete frame extracted from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// What the payload is.
    pub kind: FrameKind,
    /// Payload bytes; empty for keep-alive frames.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Wraps payload bytes in a data frame.
    pub fn data(payload: Vec<u8>) -> Self {
        Self {
            kind: FrameKind::Data,
            payload,
        }
    }

    /// A keep-alive probe.
    pub fn ping() -> Self {
        Self {
            kind: FrameKind::Ping,
            payload: Vec::new(),
        }
    }

    /// A keep-alive answer.
    pub fn pong() -> Self {
        Self {
            kind: FrameKind::Pong,
            payload: Vec::new(),
        }
    }

    /// True for ping/pong frames handled inside the connection.
    #[must_use]
    pub fn is_keep_alive(&self) -> bool {
        matches!(self.kind, FrameKind::Ping | FrameKind::Pong)
    }
}

/// Packs a payload into a complete frame ready for transmission.
pub fn pack_frame(kind: FrameKind, payload: &[u8]) -> ProtocolResult<Vec<u8>> {
    let len = payload.len() as u32;
    if len > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size: len,
            max: MAX_FRAME_SIZE,
        });
    }

    let mut buffer = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    buffer.extend_from_slice(&FRAME_MAGIC.to_be_bytes());
    buffer.push(kind.as_byte());
    buffer.extend_from_slice(&len.to_be_bytes());
    buffer.extend_from_slice(payload);
    Ok(buffer)
}

/// Serializes a message and packs it into a data frame.
///
/// # Example
///
/// ```rust
/// use huddle_protocol::{Envelope, Request, encode_message};
///
/// let envelope = Envelope::request(Request::GetMeetingInfo);
/// let frame = encode_message(&envelope).unwrap();
/// assert!(frame.len() > 7); // at least the header
/// ```
pub fn encode_message<T: Serialize>(message: &T) -> ProtocolResult<Vec<u8>> {
    let json = serde_json::to_vec(message)?;
    pack_frame(FrameKind::Data, &json)
}

/// Deserializes a message from an extracted data-frame payload.
pub fn decode_message<T: DeserializeOwned>(payload: &[u8]) -> ProtocolResult<T> {
    let message = serde_json::from_slice(payload)?;
    Ok(message)
}

/// Stateful stream unpacker.
///
/// Socket reads are appended with [`feed`](Self::feed); complete frames are
/// pulled out with [`try_extract`](Self::try_extract), which must be called
/// in a loop after every feed because one read may complete zero, one, or
/// several frames, or end mid-frame. No frame is returned twice; no byte is
/// dropped or duplicated across calls.
///
/// A framing error ([`ProtocolError::BadMagic`],
/// [`ProtocolError::FrameTooLarge`], [`ProtocolError::UnknownFrameKind`])
/// means the stream is desynchronized; the decoder makes no attempt to
/// resynchronize and the connection should be closed.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends bytes from a socket read to the internal buffer.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Number of bytes buffered but not yet extracted.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Removes and returns one complete frame, or `None` if the buffer does
    /// not yet hold one.
    pub fn try_extract(&mut self) -> ProtocolResult<Option<Frame>> {
        if self.buffer.len() < FRAME_HEADER_LEN {
            return Ok(None);
        }

        let magic = u16::from_be_bytes([self.buffer[0], self.buffer[1]]);
        if magic != FRAME_MAGIC {
            return Err(ProtocolError::BadMagic { found: magic });
        }

        let kind = FrameKind::from_byte(self.buffer[2])
            .ok_or(ProtocolError::UnknownFrameKind {
                found: self.buffer[2],
            })?;

        let len_bytes: [u8; 4] = [self.buffer[3], self.buffer[4], self.buffer[5], self.buffer[6]];
        let len = u32::from_be_bytes(len_bytes);
        if len > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: len,
                max: MAX_FRAME_SIZE,
            });
        }

        let total = FRAME_HEADER_LEN + len as usize;
        if self.buffer.len() < total {
            return Ok(None);
        }

        if kind == FrameKind::Data && len == 0 {
            return Err(ProtocolError::EmptyFrame);
        }

        let payload = self.buffer[FRAME_HEADER_LEN..total].to_vec();
        self.buffer.drain(..total);
        Ok(Some(Frame { kind, payload }))
    }
}
