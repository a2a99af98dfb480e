//! Revtext Common Types and Transport
//!
//! This crate provides the protocol definitions and TCP transport layer for
//! the revtext chunked text reversal system.
//!
//! # Overview
//!
//! Revtext is a client/server pair that splits a text file into
//! randomly-sized chunks, ships each chunk to a server that reverses its
//! character order, and reassembles the reversed chunks in their original
//! order. This crate contains the infrastructure shared by both sides:
//!
//! - **Protocol Layer**: the four message kinds, the framing codec, and the
//!   error type
//! - **Transport Layer**: framed message I/O over TCP, in synchronous
//!   (client) and asynchronous (server) flavors
//!
//! # Wire Format
//!
//! All integers are unsigned big-endian. Every message starts with a 2-byte
//! kind tag; `Init`, `Request` and `Answer` follow it with a 4-byte field
//! (block count for `Init`, payload byte length for the other two), and
//! `Request`/`Answer` carry exactly that many payload bytes. `Agree` is the
//! bare tag.
//!
//! # Example
//!
//! ```
//! use revtext_common::{Decoded, Message};
//!
//! let message = Message::Request { payload: b"hello".to_vec() };
//! let encoded = message.encode();
//!
//! match Message::decode(&encoded).unwrap() {
//!     Decoded::Complete { message, consumed } => {
//!         assert_eq!(consumed, encoded.len());
//!         assert_eq!(message, Message::Request { payload: b"hello".to_vec() });
//!     }
//!     Decoded::Incomplete { .. } => unreachable!(),
//! }
//! ```

pub mod protocol;
pub mod transport;

pub use protocol::*;
