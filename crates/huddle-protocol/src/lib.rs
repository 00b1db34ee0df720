//! IPC framing and request/response types for huddle.
//!
//! This crate defines the Protocol v1 spoken between the hosting (launcher)
//! process and the meeting-UI worker process over a loopback TCP socket.
//!
//! # Protocol Overview
//!
//! Messages travel as framed JSON:
//! - 2 bytes: frame magic (`0x4855`, big-endian)
//! - 1 byte: frame kind (data / ping / pong)
//! - 4 bytes: payload length (u32, big-endian)
//! - N bytes: JSON payload (data frames only; keep-alive frames are empty)
//!
//! # Envelope Structure
//!
//! Every data frame carries one [`Envelope`]:
//! - `protocol_version`: always "1" for this version
//! - `kind`/`body`: a [`Message`] — request, response, or notification
//!
//! There is no request-id field: at most one request of each kind is in
//! flight at a time, so responses correlate by message kind alone.
//!
//! # Example
//!
//! ```rust
//! use huddle_protocol::{Envelope, Request, decode_message, encode_message};
//!
//! let envelope = Envelope::request(Request::GetMeetingInfo);
//! let frame = encode_message(&envelope).unwrap();
//! // ... transmit, unframe on the peer ...
//! # let payload = &frame[7..];
//! let decoded: Envelope = decode_message(payload).unwrap();
//! assert_eq!(decoded, envelope);
//! ```

mod error;
mod framing;
mod types;

pub use error::{ProtocolError, ProtocolResult};
pub use framing::{
    FRAME_HEADER_LEN, FRAME_MAGIC, Frame, FrameDecoder, FrameKind, decode_message, encode_message,
    pack_frame,
};
pub use types::{
    AuthEventKind, Envelope, Message, Notification, Request, RequestKind, Response, RpcResult,
};

/// Protocol version constant.
pub const PROTOCOL_VERSION: &str = "1";

/// Maximum frame payload size (1 MB).
pub const MAX_FRAME_SIZE: u32 = 1024 * 1024;
