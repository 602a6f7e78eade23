//! Transport layer for FINS/TCP communication.
//!
//! The protocol engine talks to the network only through the [`Transport`]
//! trait: a reachability probe, open/close, and two byte-level primitives. The
//! transport knows nothing about FINS; the protocol layer knows nothing about
//! sockets.
//!
//! [`TcpTransport`] is the tokio implementation used by
//! [`Client::connect`](crate::Client::connect). Tests and embedders can supply
//! any other implementation.
//!
//! # Constants
//!
//! - [`DEFAULT_FINS_PORT`] - Default FINS/TCP port (9600)
//! - [`DEFAULT_PROBE_TIMEOUT`] - Default reachability probe timeout (2 seconds)

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{FinsError, Result};

/// Default FINS/TCP port.
pub const DEFAULT_FINS_PORT: u16 = 9600;

/// Default timeout for the reachability probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Byte transport consumed by the protocol engine.
///
/// Implementations must deliver bytes in order and must not buffer partial
/// frames across calls to [`receive_exact`](Transport::receive_exact).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Checks whether `host` answers within `timeout`.
    async fn probe_reachability(&self, host: &str, timeout: Duration) -> bool;

    /// Opens the connection.
    ///
    /// # Errors
    ///
    /// Returns `FinsError::Transport` if the peer cannot be reached.
    async fn open(&mut self, host: &str, port: u16) -> Result<()>;

    /// Sends all of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns `FinsError::Transport` on any write failure.
    async fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Reads exactly `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns `FinsError::ProtocolFraming` if the peer closes the stream before
    /// `len` bytes arrive, `FinsError::Transport` on other I/O failures.
    async fn receive_exact(&mut self, len: usize) -> Result<Vec<u8>>;

    /// Closes the connection. Closing a closed transport is a no-op.
    async fn close(&mut self);

    /// Whether the connection is open.
    fn is_open(&self) -> bool;
}

/// FINS/TCP transport over a tokio [`TcpStream`].
///
/// The reachability probe is a TCP connect attempt to the probe port bounded by
/// the probe timeout; ICMP echo would need raw socket privileges.
#[derive(Debug)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
    probe_port: u16,
}

impl TcpTransport {
    /// Creates a closed transport probing [`DEFAULT_FINS_PORT`].
    pub fn new() -> Self {
        Self {
            stream: None,
            probe_port: DEFAULT_FINS_PORT,
        }
    }

    /// Sets the port used by the reachability probe.
    pub fn with_probe_port(mut self, port: u16) -> Self {
        self.probe_port = port;
        self
    }

    fn stream(&mut self) -> Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| FinsError::transport("transport is not open"))
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn probe_reachability(&self, host: &str, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, TcpStream::connect((host, self.probe_port))).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!(host, port = self.probe_port, error = %e, "reachability probe refused");
                false
            }
            Err(_) => {
                debug!(host, port = self.probe_port, ?timeout, "reachability probe timed out");
                false
            }
        }
    }

    async fn open(&mut self, host: &str, port: u16) -> Result<()> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| {
                FinsError::transport_io(format!("connect to {}:{} failed", host, port), e)
            })?;
        stream
            .set_nodelay(true)
            .map_err(|e| FinsError::transport_io("cannot disable Nagle's algorithm", e))?;
        debug!(host, port, "transport open");
        self.stream = Some(stream);
        Ok(())
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let stream = self.stream()?;
        stream
            .write_all(bytes)
            .await
            .map_err(|e| FinsError::transport_io("send failed", e))?;
        stream
            .flush()
            .await
            .map_err(|e| FinsError::transport_io("send failed", e))
    }

    async fn receive_exact(&mut self, len: usize) -> Result<Vec<u8>> {
        let stream = self.stream()?;
        let mut buffer = vec![0u8; len];
        match stream.read_exact(&mut buffer).await {
            Ok(_) => Ok(buffer),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(FinsError::framing(
                format!("connection closed before {} bytes were received", len),
            )),
            Err(e) => Err(FinsError::transport_io("receive failed", e)),
        }
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            // the peer may already be gone
            let _ = stream.shutdown().await;
            debug!("transport closed");
        }
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}
