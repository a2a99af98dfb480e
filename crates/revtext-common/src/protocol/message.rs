//! Message kinds and framing codec.
//!
//! Implements the 6-byte header format shared by all payload-carrying
//! messages:
//!
//! ```text
//! ┌──────────┬───────────────┬─────────────────┐
//! │ Tag      │ Count/Length  │ Payload         │
//! │ 2 bytes  │ 4 bytes       │ Length bytes    │
//! │ u16 BE   │ u32 BE        │ (Request/Answer)│
//! └──────────┴───────────────┴─────────────────┘
//! ```
//!
//! `Agree` is the one exception: it is the bare 2-byte tag. All multi-byte
//! integers are big-endian.
//!
//! Payloads are opaque byte sequences at this level. The printable-ASCII
//! rule is enforced by the endpoints (see [`is_printable_ascii`]), which
//! keeps the codec reusable if the payload encoding rules ever change.

use crate::protocol::error::{Result, RevtextError};

/// Tag for `Init` (client to server, announces the block count).
pub const TAG_INIT: u16 = 1;
/// Tag for `Agree` (server to client, accepts the exchange).
pub const TAG_AGREE: u16 = 2;
/// Tag for `Request` (client to server, one block to reverse).
pub const TAG_REQUEST: u16 = 3;
/// Tag for `Answer` (server to client, one reversed block).
pub const TAG_ANSWER: u16 = 4;

/// Size of the tag field in bytes.
pub const TAG_SIZE: usize = 2;
/// Size of the full header (tag + count/length) for every kind but `Agree`.
pub const HEADER_SIZE: usize = 6;
/// Maximum accepted payload size (100 MB). A header declaring more is
/// rejected before any allocation happens.
pub const MAX_PAYLOAD_SIZE: u32 = 100 * 1024 * 1024;

/// One protocol message.
///
/// The enum covers every tag the wire format defines, so encoding cannot
/// encounter an unsupported kind and [`Message::encode`] is infallible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Opens an exchange; the client will send exactly `block_count` requests.
    Init { block_count: u32 },
    /// The server's acceptance of an `Init`.
    Agree,
    /// One block of text to reverse.
    Request { payload: Vec<u8> },
    /// One reversed block.
    Answer { payload: Vec<u8> },
}

/// Outcome of [`Message::decode`] on a (possibly partial) buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A full message was parsed from the front of the buffer; `consumed`
    /// is how many bytes it occupied. Trailing bytes are untouched.
    Complete { message: Message, consumed: usize },
    /// The buffer holds a valid prefix of a message. At least `needed` more
    /// bytes are required before another decode attempt can make progress.
    Incomplete { needed: usize },
}

impl Message {
    /// The wire tag for this message.
    pub fn tag(&self) -> u16 {
        match self {
            Message::Init { .. } => TAG_INIT,
            Message::Agree => TAG_AGREE,
            Message::Request { .. } => TAG_REQUEST,
            Message::Answer { .. } => TAG_ANSWER,
        }
    }

    /// A short human-readable name, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Init { .. } => "init",
            Message::Agree => "agree",
            Message::Request { .. } => "request",
            Message::Answer { .. } => "answer",
        }
    }

    /// Encode this message to its wire representation.
    ///
    /// Deterministic and pure.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Message::Init { block_count } => {
                let mut buf = Vec::with_capacity(HEADER_SIZE);
                buf.extend_from_slice(&TAG_INIT.to_be_bytes());
                buf.extend_from_slice(&block_count.to_be_bytes());
                buf
            }
            Message::Agree => TAG_AGREE.to_be_bytes().to_vec(),
            Message::Request { payload } => encode_with_payload(TAG_REQUEST, payload),
            Message::Answer { payload } => encode_with_payload(TAG_ANSWER, payload),
        }
    }

    /// Decode one message from the front of `buf`.
    ///
    /// Handles partial buffers: a valid prefix of any message yields
    /// [`Decoded::Incomplete`] with the minimum number of additional bytes
    /// required, never an error. An unrecognized tag or a declared payload
    /// length above [`MAX_PAYLOAD_SIZE`] is a protocol error.
    pub fn decode(buf: &[u8]) -> Result<Decoded> {
        if buf.len() < TAG_SIZE {
            return Ok(Decoded::Incomplete {
                needed: TAG_SIZE - buf.len(),
            });
        }
        let tag = u16::from_be_bytes([buf[0], buf[1]]);
        match tag {
            TAG_AGREE => Ok(Decoded::Complete {
                message: Message::Agree,
                consumed: TAG_SIZE,
            }),
            TAG_INIT => {
                if buf.len() < HEADER_SIZE {
                    return Ok(Decoded::Incomplete {
                        needed: HEADER_SIZE - buf.len(),
                    });
                }
                let block_count = u32::from_be_bytes([buf[2], buf[3], buf[4], buf[5]]);
                Ok(Decoded::Complete {
                    message: Message::Init { block_count },
                    consumed: HEADER_SIZE,
                })
            }
            TAG_REQUEST | TAG_ANSWER => {
                if buf.len() < HEADER_SIZE {
                    return Ok(Decoded::Incomplete {
                        needed: HEADER_SIZE - buf.len(),
                    });
                }
                let length = u32::from_be_bytes([buf[2], buf[3], buf[4], buf[5]]);
                if length > MAX_PAYLOAD_SIZE {
                    return Err(RevtextError::Protocol(format!(
                        "Declared payload size {} exceeds maximum {}",
                        length, MAX_PAYLOAD_SIZE
                    )));
                }
                let total = HEADER_SIZE + length as usize;
                if buf.len() < total {
                    return Ok(Decoded::Incomplete {
                        needed: total - buf.len(),
                    });
                }
                let payload = buf[HEADER_SIZE..total].to_vec();
                let message = if tag == TAG_REQUEST {
                    Message::Request { payload }
                } else {
                    Message::Answer { payload }
                };
                Ok(Decoded::Complete {
                    message,
                    consumed: total,
                })
            }
            other => Err(RevtextError::Protocol(format!(
                "Unrecognized message tag {}",
                other
            ))),
        }
    }
}

fn encode_with_payload(tag: u16, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&tag.to_be_bytes());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Whether every byte is printable ASCII (0x20 space through 0x7E tilde).
///
/// The protocol carries nothing outside this range: the client checks its
/// input before connecting, the server checks every request payload. The
/// guarantee is what makes byte-for-byte reversal equal character reversal.
pub fn is_printable_ascii(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| (0x20..=0x7e).contains(&b))
}
