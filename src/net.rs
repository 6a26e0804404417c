// Single-shot TCP transport for encoded messages.
//
// A client connects, writes one byte-framed stream and closes its side. The
// server accepts connections one at a time, reads at most
// `max_message_bytes`, decodes and hands the message to the caller. A peer
// that stops sending without closing is cut off after `read_timeout`; the
// bytes that arrived before then are decoded as the message.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::ops::ControlFlow;
use std::time::Duration;

use crate::huffman::{self, EncodeOptions, HeaderFormat};
use crate::io::IoError;

/// Address the server listens on by default.
pub const DEFAULT_ADDR: &str = "127.0.0.1:12345";

/// Largest payload the server accepts by default.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 1024;

/// How long the server waits for more bytes from an idle peer by default.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    pub max_message_bytes: usize,
    /// Must match the sender's `EncodeOptions::header`.
    pub header: HeaderFormat,
    /// Longest wait for the next bytes of a payload. `None` waits until the
    /// peer closes its side.
    pub read_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            header: HeaderFormat::default(),
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
        }
    }
}

/// One payload received by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub peer: SocketAddr,
    /// Size of the encoded payload in bytes.
    pub payload_bytes: usize,
    /// Decoded message, or `None` if the peer sent nothing.
    pub message: Option<Vec<u8>>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Encode `message`, send it to `addr` and close the connection.
/// Returns the number of bytes sent.
pub fn send_message<A: ToSocketAddrs>(
    addr: A,
    message: &[u8],
    opts: &EncodeOptions,
) -> Result<usize, IoError> {
    let payload = huffman::encode(message, opts)?.to_bytes();
    let mut stream = TcpStream::connect(addr)?;
    stream.write_all(&payload)?;
    stream.flush()?;
    stream.shutdown(Shutdown::Write)?;
    log::info!(
        "sent {} bytes ({} message bytes) to {}",
        payload.len(),
        message.len(),
        stream.peer_addr()?
    );
    Ok(payload.len())
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Sequential, one-message-per-connection server.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
}

impl Server {
    pub fn bind(config: ServerConfig) -> Result<Self, IoError> {
        let listener = TcpListener::bind(&config.addr)?;
        log::info!("listening on {}", listener.local_addr()?);
        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, IoError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Accept one connection and decode its payload.
    pub fn accept_one(&self) -> Result<Received, IoError> {
        let (stream, peer) = self.listener.accept()?;
        self.receive(stream, peer)
    }

    /// Accept connections until `handler` breaks. A connection that fails to
    /// decode is logged and skipped; a failing listener ends the loop.
    pub fn run<F>(&self, mut handler: F) -> Result<(), IoError>
    where
        F: FnMut(Received) -> ControlFlow<()>,
    {
        loop {
            let (stream, peer) = self.listener.accept()?;
            match self.receive(stream, peer) {
                Ok(received) => {
                    if handler(received).is_break() {
                        return Ok(());
                    }
                }
                Err(e) => log::warn!("dropping message from {peer}: {e}"),
            }
        }
    }

    fn receive(&self, stream: TcpStream, peer: SocketAddr) -> Result<Received, IoError> {
        log::info!("connection from {peer}");
        stream.set_read_timeout(self.config.read_timeout)?;
        let max = self.config.max_message_bytes;
        let payload = read_payload(&stream, max, peer)?;
        if payload.len() > max {
            return Err(IoError::MessageTooLarge {
                len: payload.len(),
                max,
            });
        }
        if payload.is_empty() {
            log::info!("{peer} sent an empty payload");
            return Ok(Received {
                peer,
                payload_bytes: 0,
                message: None,
            });
        }

        let message = huffman::decode_bytes_with(&payload, self.config.header)?;
        log::info!(
            "received {} bytes from {peer}, decoded {} bytes",
            payload.len(),
            message.len()
        );
        Ok(Received {
            peer,
            payload_bytes: payload.len(),
            message: Some(message),
        })
    }
}

/// Read until EOF, `max + 1` bytes, or a read timeout with data in hand.
fn read_payload(stream: &TcpStream, max: usize, peer: SocketAddr) -> Result<Vec<u8>, IoError> {
    let mut payload = Vec::with_capacity(max.min(64 * 1024));
    let mut limited = stream.take(max as u64 + 1);
    let mut chunk = [0u8; 4096];
    loop {
        match limited.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => payload.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e)
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
                    && !payload.is_empty() =>
            {
                log::info!("{peer} went idle after {} bytes without closing", payload.len());
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(payload)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn local_server(max_message_bytes: usize) -> Server {
        Server::bind(ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            max_message_bytes,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn send_and_receive_one_message() {
        let server = local_server(DEFAULT_MAX_MESSAGE_BYTES);
        let addr = server.local_addr().unwrap();
        let client = thread::spawn(move || {
            send_message(addr, b"hello over tcp", &EncodeOptions::byte_framed()).unwrap()
        });
        let received = server.accept_one().unwrap();
        let sent = client.join().unwrap();
        assert_eq!(received.payload_bytes, sent);
        assert_eq!(received.message.as_deref(), Some(&b"hello over tcp"[..]));
    }

    #[test]
    fn empty_payload_is_reported() {
        let server = local_server(DEFAULT_MAX_MESSAGE_BYTES);
        let addr = server.local_addr().unwrap();
        let client = thread::spawn(move || {
            drop(TcpStream::connect(addr).unwrap());
        });
        let received = server.accept_one().unwrap();
        client.join().unwrap();
        assert_eq!(received.message, None);
        assert_eq!(received.payload_bytes, 0);
    }

    #[test]
    fn idle_peer_is_cut_off_after_timeout() {
        let server = Server::bind(ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            read_timeout: Some(Duration::from_millis(200)),
            ..Default::default()
        })
        .unwrap();
        let addr = server.local_addr().unwrap();
        let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();
        let client = thread::spawn(move || {
            let payload = huffman::encode(b"still connected", &EncodeOptions::byte_framed())
                .unwrap()
                .to_bytes();
            let mut stream = TcpStream::connect(addr).unwrap();
            stream.write_all(&payload).unwrap();
            // Keep the connection open until the server has answered.
            let _ = done_rx.recv();
            drop(stream);
        });

        let received = server.accept_one().unwrap();
        done_tx.send(()).unwrap();
        client.join().unwrap();
        assert_eq!(received.message.as_deref(), Some(&b"still connected"[..]));
    }

    #[test]
    fn silent_peer_times_out() {
        let server = Server::bind(ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            read_timeout: Some(Duration::from_millis(100)),
            ..Default::default()
        })
        .unwrap();
        let addr = server.local_addr().unwrap();
        let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();
        let client = thread::spawn(move || {
            let stream = TcpStream::connect(addr).unwrap();
            let _ = done_rx.recv();
            drop(stream);
        });

        let err = server.accept_one().unwrap_err();
        done_tx.send(()).unwrap();
        client.join().unwrap();
        assert!(matches!(
            err,
            IoError::Io(ref e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
        ));
    }

    #[test]
    fn oversized_payload_rejected() {
        let server = local_server(16);
        let addr = server.local_addr().unwrap();
        let client = thread::spawn(move || {
            let msg: Vec<u8> = (0..64u8).collect();
            // The server may close early; the result does not matter.
            let _ = send_message(addr, &msg, &EncodeOptions::byte_framed());
        });
        let err = server.accept_one().unwrap_err();
        client.join().unwrap();
        assert!(matches!(err, IoError::MessageTooLarge { max: 16, .. }));
    }
}
