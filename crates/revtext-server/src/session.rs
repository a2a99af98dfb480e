//! Per-connection session.
//!
//! Each accepted connection is driven through a fixed exchange: one `Init`
//! announcing the block count, an `Agree` back, then exactly that many
//! `Request`/`Answer` pairs, after which the server closes the connection.
//! Any malformed message, oversize declared length, non-ASCII payload, or
//! transport error abandons the session immediately; nothing is retried or
//! resumed, and no response is sent for the offending message.
//!
//! Every blocking read races the process-wide shutdown signal, and the
//! signal is re-checked at each chunk boundary, so an in-flight session
//! aborts promptly once shutdown begins even mid-exchange.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::timeout;

use revtext_common::protocol::{is_printable_ascii, Message, Result, RevtextError};
use revtext_common::transport::{recv_message_async, send_message_async};

/// Read timeout for the opening `Init`.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
/// Read timeout for each chunk `Request`. Longer than the handshake timeout
/// to tolerate client-side pauses between chunks.
const CHUNK_TIMEOUT: Duration = Duration::from_secs(30);

/// Drive one connection from accept to close.
pub(crate) async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    mut shutdown: watch::Receiver<bool>,
    processing_delay: Duration,
) -> Result<()> {
    let block_count = await_init(&mut stream, &mut shutdown).await?;
    tracing::info!("Client {} requested reversal of {} blocks", peer, block_count);
    send_message_async(&mut stream, &Message::Agree).await?;

    for index in 0..block_count {
        if *shutdown.borrow() {
            return Err(RevtextError::Connection(
                "server shutting down".to_string(),
            ));
        }

        let payload = await_request(&mut stream, &mut shutdown).await?;
        if !is_printable_ascii(&payload) {
            return Err(RevtextError::Protocol(format!(
                "Request for block {} contains non-printable bytes",
                index + 1
            )));
        }

        // Bounded per-chunk work; the exact duration is tunable but its
        // presence is part of the contract (clients size their answer
        // timeout against it).
        tokio::time::sleep(processing_delay).await;

        let mut reversed = payload;
        reversed.reverse();
        send_message_async(&mut stream, &Message::Answer { payload: reversed }).await?;
        tracing::info!("Processed block {}/{} for {}", index + 1, block_count, peer);
    }

    Ok(())
}

async fn await_init(
    stream: &mut TcpStream,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<u32> {
    match recv_or_shutdown(stream, shutdown, HANDSHAKE_TIMEOUT, "waiting for init").await? {
        Message::Init { block_count } => Ok(block_count),
        other => Err(RevtextError::Protocol(format!(
            "Expected init, got {}",
            other.kind()
        ))),
    }
}

async fn await_request(
    stream: &mut TcpStream,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<Vec<u8>> {
    match recv_or_shutdown(stream, shutdown, CHUNK_TIMEOUT, "waiting for request").await? {
        Message::Request { payload } => Ok(payload),
        other => Err(RevtextError::Protocol(format!(
            "Expected request, got {}",
            other.kind()
        ))),
    }
}

/// Read one message, bounded by `dur` and racing the shutdown signal so a
/// blocked read unblocks as soon as shutdown begins.
async fn recv_or_shutdown(
    stream: &mut TcpStream,
    shutdown: &mut watch::Receiver<bool>,
    dur: Duration,
    what: &str,
) -> Result<Message> {
    tokio::select! {
        res = timeout(dur, recv_message_async(stream)) => match res {
            Ok(inner) => inner,
            Err(_) => Err(RevtextError::Timeout(format!(
                "{} after {}ms",
                what,
                dur.as_millis()
            ))),
        },
        _ = shutdown.changed() => Err(RevtextError::Connection(
            "server shutting down".to_string(),
        )),
    }
}
