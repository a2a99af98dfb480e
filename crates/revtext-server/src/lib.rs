//! Revtext Server
//!
//! This crate provides the server half of the revtext system: a dispatcher
//! that accepts connections and runs one independent session worker per
//! connection, reversing each received block and answering in place.
//!
//! Sessions share nothing but the shutdown signal and the worker registry
//! used for coordinated shutdown; each session's socket, chunk index, and
//! buffers are exclusively owned by its worker.

pub mod dispatcher;
pub mod session;

pub use dispatcher::{Dispatcher, ShutdownHandle, DEFAULT_PROCESSING_DELAY};
