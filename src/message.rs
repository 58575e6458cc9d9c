//! Wire-format definitions for ALP messages.
//!
//! Every datagram exchanged between the coordinator and a node is a single
//! fixed-size [`Message`] frame.  This module is responsible for:
//! - Defining the on-wire binary layout (kind tag, node id, sequence number,
//!   payload length, payload buffer).
//! - Serialising a [`Message`] into a frame ready for transmission.
//! - Deserialising a raw byte slice back into a [`Message`], returning errors
//!   for truncated or oversized input.
//!
//! No I/O happens here.
//!
//! # Wire format
//!
//! Multi-byte integers use the configured [`ByteOrder`] (big-endian unless
//! both ends agree otherwise).
//!
//! ```text
//!  0               1               2               3
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     Kind      |    Node ID    |        Sequence Number        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |        Payload Length         |                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+                               +
//! |              Payload (256 bytes, NUL-terminated)              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Total frame size: [`FRAME_LEN`] = 262 bytes.
//! kind(1) + node_id(1) + sequence_num(2) + payload_len(2) + payload(256)

use thiserror::Error;

/// Byte length of the fixed header that precedes the payload buffer.
pub const HEADER_LEN: usize = 6;

/// Size of the payload buffer carried by every frame.
pub const PAYLOAD_CAPACITY: usize = 256;

/// Longest payload text that still leaves room for the terminator.
pub const MAX_PAYLOAD: usize = PAYLOAD_CAPACITY - 1;

/// Byte length of a complete encoded frame.
pub const FRAME_LEN: usize = HEADER_LEN + PAYLOAD_CAPACITY;

// Byte offsets of each field within the serialised header.
const OFF_KIND: usize = 0;
const OFF_NODE: usize = 1;
const OFF_SEQ: usize = 2;
const OFF_PAYLOAD_LEN: usize = 4;

/// Enumerated message kind carried in the first byte of every frame.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// One random symbol, coordinator → node.
    Bit = 1,
    /// Registration traffic ("Node Ready" and its "ACK").
    Status = 2,
    /// Acknowledgement of a phase message, node → coordinator.
    Ack = 3,
    /// Round start marker, coordinator → node.
    StartGame = 4,
    /// A node observed its pattern, node → coordinator.
    PatternDetected = 5,
    /// Round end marker, coordinator → node.
    GameOver = 6,
}

impl MessageKind {
    pub fn from_u8(tag: u8) -> Option<Self> {
        Some(match tag {
            1 => MessageKind::Bit,
            2 => MessageKind::Status,
            3 => MessageKind::Ack,
            4 => MessageKind::StartGame,
            5 => MessageKind::PatternDetected,
            6 => MessageKind::GameOver,
            _ => return None,
        })
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// Byte order used for the 16-bit header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Big,
    Little,
}

impl ByteOrder {
    fn write_u16(self, value: u16) -> [u8; 2] {
        match self {
            ByteOrder::Big => value.to_be_bytes(),
            ByteOrder::Little => value.to_le_bytes(),
        }
    }

    fn read_u16(self, bytes: [u8; 2]) -> u16 {
        match self {
            ByteOrder::Big => u16::from_be_bytes(bytes),
            ByteOrder::Little => u16::from_le_bytes(bytes),
        }
    }
}

impl std::str::FromStr for ByteOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "big" | "be" => Ok(ByteOrder::Big),
            "little" | "le" => Ok(ByteOrder::Little),
            _ => Err(format!("unknown byte order: {s}")),
        }
    }
}

/// Errors that can arise when parsing a raw datagram.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer shorter than the header, or than the payload it declares.
    #[error("frame truncated: need {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },
    /// Declared payload length does not fit in the payload buffer.
    #[error("declared payload length {0} exceeds maximum of {MAX_PAYLOAD}")]
    PayloadOverflow(u16),
    /// First byte is not a known [`MessageKind`].
    #[error("unknown message kind tag {0}")]
    UnknownKind(u8),
}

/// One ALP message: header fields plus payload text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    /// Sender or recipient id; 0 is the coordinator.
    pub node_id: u8,
    pub sequence_num: u16,
    /// Payload text.  Anything beyond [`MAX_PAYLOAD`] bytes is dropped on
    /// encode.
    pub payload: String,
}

impl Message {
    pub fn new(kind: MessageKind, node_id: u8, sequence_num: u16, payload: impl Into<String>) -> Self {
        Self {
            kind,
            node_id,
            sequence_num,
            payload: payload.into(),
        }
    }

    /// Serialise this message into a full [`FRAME_LEN`]-byte frame.
    ///
    /// Payloads longer than [`MAX_PAYLOAD`] are silently cut (on a UTF-8
    /// boundary) and the `payload_len` field reflects the cut length.
    pub fn encode(&self, order: ByteOrder) -> Vec<u8> {
        let text = truncate_payload(&self.payload).as_bytes();
        let mut buf = vec![0u8; FRAME_LEN];

        buf[OFF_KIND] = self.kind.tag();
        buf[OFF_NODE] = self.node_id;
        buf[OFF_SEQ..OFF_SEQ + 2].copy_from_slice(&order.write_u16(self.sequence_num));
        buf[OFF_PAYLOAD_LEN..OFF_PAYLOAD_LEN + 2]
            .copy_from_slice(&order.write_u16(text.len() as u16));
        // Remaining bytes stay zero, so the text is always terminated.
        buf[HEADER_LEN..HEADER_LEN + text.len()].copy_from_slice(text);

        buf
    }

    /// Parse a [`Message`] from a raw byte slice.
    ///
    /// Only the first `payload_len` payload bytes are read, and the text
    /// stops early at an embedded NUL.  Trailing bytes are ignored so both
    /// full frames and compact ones decode.
    pub fn decode(buf: &[u8], order: ByteOrder) -> Result<Self, DecodeError> {
        if buf.len() < HEADER_LEN {
            return Err(DecodeError::Truncated {
                needed: HEADER_LEN,
                got: buf.len(),
            });
        }

        let payload_len = order.read_u16([buf[OFF_PAYLOAD_LEN], buf[OFF_PAYLOAD_LEN + 1]]);
        if payload_len as usize > MAX_PAYLOAD {
            return Err(DecodeError::PayloadOverflow(payload_len));
        }
        let end = HEADER_LEN + payload_len as usize;
        if buf.len() < end {
            return Err(DecodeError::Truncated {
                needed: end,
                got: buf.len(),
            });
        }

        let kind =
            MessageKind::from_u8(buf[OFF_KIND]).ok_or(DecodeError::UnknownKind(buf[OFF_KIND]))?;
        let sequence_num = order.read_u16([buf[OFF_SEQ], buf[OFF_SEQ + 1]]);

        let raw = &buf[HEADER_LEN..end];
        let text = match raw.iter().position(|&b| b == 0) {
            Some(nul) => &raw[..nul],
            None => raw,
        };

        Ok(Message {
            kind,
            node_id: buf[OFF_NODE],
            sequence_num,
            payload: String::from_utf8_lossy(text).into_owned(),
        })
    }
}

/// Longest prefix of `payload` that fits in [`MAX_PAYLOAD`] bytes without
/// splitting a character.
fn truncate_payload(payload: &str) -> &str {
    if payload.len() <= MAX_PAYLOAD {
        return payload;
    }
    let mut end = MAX_PAYLOAD;
    while !payload.is_char_boundary(end) {
        end -= 1;
    }
    &payload[..end]
}
