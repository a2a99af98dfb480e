//! Revtext Transport Layer
//!
//! Framed message I/O over TCP. Two flavors share the same framing
//! semantics:
//!
//! - **Synchronous** (`std::net`): used by the client, which performs all
//!   network operations sequentially on one thread.
//! - **Asynchronous** (`tokio::net`): used by the server, which runs one
//!   worker task per accepted connection.
//!
//! Both receive paths read the 2-byte tag, then keep issuing exact reads
//! for whatever [`Message::decode`](crate::protocol::Message::decode)
//! reports missing, so short reads accumulate until the full message has
//! arrived or the peer closes the connection.

pub mod tcp;

pub use tcp::{connect, recv_message, recv_message_async, send_message, send_message_async};
