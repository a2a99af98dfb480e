//! Revtext Client
//!
//! This crate provides the client half of the revtext system: splitting an
//! input text into randomly-sized chunks and running the sequential
//! reversal exchange against a server.
//!
//! The client is intentionally single-threaded and synchronous; it does not
//! send chunk N+1 until chunk N's answer has fully arrived.

pub mod chunker;
pub mod client;

pub use chunker::split_into_chunks;
pub use client::ReverseClient;
