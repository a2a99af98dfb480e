use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::protocol::{Decoded, Message, Result, RevtextError, TAG_SIZE};

/// Connects to a remote endpoint (synchronous).
///
/// Resolves the address (which may yield several candidates) and attempts
/// each with the given per-attempt timeout until one succeeds.
///
/// Read/write timeouts are left unset; callers configure them per exchange
/// phase with [`TcpStream::set_read_timeout`].
pub fn connect(addr: &str, timeout: Duration) -> Result<TcpStream> {
    let socket_addrs = addr
        .to_socket_addrs()
        .map_err(|e| RevtextError::Connection(format!("Invalid address '{}': {}", addr, e)))?;

    let mut last_err = None;
    for socket_addr in socket_addrs {
        match TcpStream::connect_timeout(&socket_addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(RevtextError::Connection(format!(
        "Failed to connect to {}: {}",
        addr,
        last_err
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no addresses resolved".to_string())
    )))
}

/// Sends one message (synchronous).
pub fn send_message(stream: &mut TcpStream, message: &Message) -> Result<()> {
    let encoded = message.encode();
    stream
        .write_all(&encoded)
        .map_err(|e| map_io_error(e, "writing message"))?;
    stream
        .flush()
        .map_err(|e| map_io_error(e, "flushing stream"))?;
    Ok(())
}

/// Receives one message (synchronous).
///
/// Blocks until a full message is available. The stream's configured read
/// timeout bounds each underlying read; a peer close before the declared
/// length arrives is reported as a connection error.
pub fn recv_message(stream: &mut TcpStream) -> Result<Message> {
    let mut buf = vec![0u8; TAG_SIZE];
    stream
        .read_exact(&mut buf)
        .map_err(|e| map_io_error(e, "reading message tag"))?;

    loop {
        match Message::decode(&buf)? {
            Decoded::Complete { message, .. } => return Ok(message),
            Decoded::Incomplete { needed } => {
                let have = buf.len();
                buf.resize(have + needed, 0);
                stream
                    .read_exact(&mut buf[have..])
                    .map_err(|e| map_io_error(e, "reading message body"))?;
            }
        }
    }
}

/// Sends one message (asynchronous).
pub async fn send_message_async(
    stream: &mut tokio::net::TcpStream,
    message: &Message,
) -> Result<()> {
    let encoded = message.encode();
    stream
        .write_all(&encoded)
        .await
        .map_err(|e| map_io_error(e, "writing message"))?;
    stream
        .flush()
        .await
        .map_err(|e| map_io_error(e, "flushing stream"))?;
    Ok(())
}

/// Receives one message (asynchronous).
///
/// Same framing semantics as [`recv_message`]. Callers bound the wait with
/// `tokio::time::timeout`.
pub async fn recv_message_async(stream: &mut tokio::net::TcpStream) -> Result<Message> {
    let mut buf = vec![0u8; TAG_SIZE];
    stream
        .read_exact(&mut buf)
        .await
        .map_err(|e| map_io_error(e, "reading message tag"))?;

    loop {
        match Message::decode(&buf)? {
            Decoded::Complete { message, .. } => return Ok(message),
            Decoded::Incomplete { needed } => {
                let have = buf.len();
                buf.resize(have + needed, 0);
                stream
                    .read_exact(&mut buf[have..])
                    .await
                    .map_err(|e| map_io_error(e, "reading message body"))?;
            }
        }
    }
}

/// Map IO errors to the domain error.
///
/// Timeouts/would-block become `Timeout`; connection-shaped errors
/// (including a peer close mid-message, surfaced as `UnexpectedEof` by
/// `read_exact`) become `Connection`; everything else stays `Io`.
fn map_io_error(err: std::io::Error, context: &str) -> RevtextError {
    match err.kind() {
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
            RevtextError::Timeout(context.to_string())
        }
        std::io::ErrorKind::UnexpectedEof
        | std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::ConnectionAborted
        | std::io::ErrorKind::NotConnected => {
            RevtextError::Connection(format!("{}: connection lost", context))
        }
        _ => RevtextError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_sync_round_trip_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let message = recv_message(&mut stream).unwrap();
            send_message(&mut stream, &message).unwrap();
        });

        let mut stream = connect(&addr.to_string(), Duration::from_secs(1)).unwrap();
        let original = Message::Request {
            payload: b"round trip".to_vec(),
        };
        send_message(&mut stream, &original).unwrap();
        assert_eq!(recv_message(&mut stream).unwrap(), original);

        server.join().unwrap();
    }

    #[test]
    fn test_recv_accumulates_fragmented_writes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let encoded = Message::Answer {
            payload: b"pieces arrive late".to_vec(),
        }
        .encode();
        let fragments = encoded.clone();

        let writer = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            // One byte of the tag, the rest of the header, then the payload.
            stream.write_all(&fragments[..1]).unwrap();
            stream.flush().unwrap();
            thread::sleep(Duration::from_millis(20));
            stream.write_all(&fragments[1..6]).unwrap();
            stream.flush().unwrap();
            thread::sleep(Duration::from_millis(20));
            stream.write_all(&fragments[6..]).unwrap();
            stream.flush().unwrap();
        });

        let mut stream = connect(&addr.to_string(), Duration::from_secs(1)).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let message = recv_message(&mut stream).unwrap();
        assert_eq!(
            message,
            Message::Answer {
                payload: b"pieces arrive late".to_vec()
            }
        );

        writer.join().unwrap();
    }

    #[test]
    fn test_peer_close_mid_message_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let writer = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            // Header declares 50 payload bytes; deliver 10 and hang up.
            let mut partial = Message::Request {
                payload: vec![b'x'; 50],
            }
            .encode();
            partial.truncate(6 + 10);
            stream.write_all(&partial).unwrap();
            stream.flush().unwrap();
        });

        let mut stream = connect(&addr.to_string(), Duration::from_secs(1)).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let result = recv_message(&mut stream);
        match result {
            Err(RevtextError::Connection(_)) => {}
            other => panic!("expected connection error, got {:?}", other),
        }

        writer.join().unwrap();
    }
}
