//! Sequential reversal client.
//!
//! Drives one full exchange: validate input, split into chunks, handshake,
//! then request/answer per chunk strictly in order. The run either fully
//! succeeds and returns the reassembled text, or fails and returns nothing;
//! answers already received for earlier chunks are discarded as a set.

use std::time::Duration;

use revtext_common::protocol::{is_printable_ascii, Message, Result, RevtextError};
use revtext_common::transport::{connect, recv_message, send_message};

use crate::chunker::split_into_chunks;

/// Per-address connect timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Receive timeout for the handshake `Agree`.
const AGREE_TIMEOUT: Duration = Duration::from_secs(5);
/// Receive timeout for each `Answer`. Must exceed the server's per-chunk
/// processing delay plus transmission time, or a healthy exchange gets
/// misclassified as failed.
const ANSWER_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the chunk reversal exchange.
pub struct ReverseClient {
    server_addr: String,
}

impl ReverseClient {
    /// Create a client targeting `addr` (e.g. "127.0.0.1:9400").
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            server_addr: addr.into(),
        }
    }

    /// Run one full reversal exchange.
    ///
    /// `text` must be printable ASCII; this is checked before any network
    /// activity since the protocol cannot carry anything else. Chunk sizes
    /// are drawn from `[lmin, lmax]` (see [`split_into_chunks`]).
    ///
    /// All-or-nothing: any timeout, transport failure, or protocol
    /// violation aborts the remaining chunks and the whole run fails.
    pub fn run(&self, text: &[u8], lmin: usize, lmax: usize) -> Result<String> {
        if !is_printable_ascii(text) {
            return Err(RevtextError::InvalidInput(
                "input contains characters outside printable ASCII".to_string(),
            ));
        }

        let chunks = split_into_chunks(text, lmin, lmax);
        let block_count = chunks.len() as u32;
        tracing::info!(
            "Input is {} bytes, split into {} blocks of {}-{} bytes",
            text.len(),
            block_count,
            lmin,
            lmax
        );

        tracing::info!("Connecting to {}", self.server_addr);
        let mut stream = connect(&self.server_addr, CONNECT_TIMEOUT)?;
        stream.set_read_timeout(Some(AGREE_TIMEOUT))?;
        stream.set_write_timeout(Some(AGREE_TIMEOUT))?;

        send_message(&mut stream, &Message::Init { block_count })?;
        match recv_message(&mut stream)? {
            Message::Agree => tracing::info!("Server agreed to reverse {} blocks", block_count),
            other => {
                return Err(RevtextError::Protocol(format!(
                    "Expected agree, got {}",
                    other.kind()
                )))
            }
        }

        stream.set_read_timeout(Some(ANSWER_TIMEOUT))?;

        let mut results: Vec<Option<Vec<u8>>> = vec![None; chunks.len()];
        for (index, chunk) in chunks.iter().enumerate() {
            send_message(
                &mut stream,
                &Message::Request {
                    payload: chunk.clone(),
                },
            )?;
            match recv_message(&mut stream)? {
                Message::Answer { payload } => {
                    if !is_printable_ascii(&payload) {
                        return Err(RevtextError::Protocol(format!(
                            "Answer for block {} contains non-printable bytes",
                            index + 1
                        )));
                    }
                    tracing::info!(
                        "Block {}/{} reversed ({} bytes)",
                        index + 1,
                        block_count,
                        payload.len()
                    );
                    results[index] = Some(payload);
                }
                other => {
                    return Err(RevtextError::Protocol(format!(
                        "Expected answer for block {}, got {}",
                        index + 1,
                        other.kind()
                    )))
                }
            }
        }

        // Output is produced only when every index holds a result.
        let mut output = Vec::with_capacity(text.len());
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Some(payload) => output.extend_from_slice(&payload),
                None => {
                    return Err(RevtextError::Protocol(format!(
                        "Missing result for block {}",
                        index + 1
                    )))
                }
            }
        }
        String::from_utf8(output)
            .map_err(|_| RevtextError::Protocol("reassembled output is not UTF-8".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_ascii_input_rejected_before_connecting() {
        // The target address is unroutable; reaching it would hang or fail
        // differently, so an InvalidInput proves validation came first.
        let client = ReverseClient::new("192.0.2.1:9400");
        let result = client.run("caf\u{e9}".as_bytes(), 2, 4);
        match result {
            Err(RevtextError::InvalidInput(_)) => {}
            other => panic!("expected invalid input error, got {:?}", other),
        }
    }

    #[test]
    fn test_control_characters_rejected() {
        let client = ReverseClient::new("192.0.2.1:9400");
        let result = client.run(b"line one\nline two", 2, 4);
        assert!(matches!(result, Err(RevtextError::InvalidInput(_))));
    }
}
