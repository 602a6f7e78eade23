//! High-level FINS/TCP client for communicating with Omron PLCs.
//!
//! This module provides the [`Client`] struct, which is the primary interface
//! for reading and writing PLC memory over FINS/TCP.
//!
//! # Overview
//!
//! The client handles:
//! - The node address handshake ([`Client::connect`])
//! - Command construction and serialization
//! - Response-length computation and full reads
//! - Head status and end code translation
//! - Payload decoding (bits, signed words, REALs)
//!
//! # Example
//!
//! ```no_run
//! use omron_fins_tcp::{Client, ClientConfig, MemoryArea};
//!
//! # async fn run() -> omron_fins_tcp::Result<()> {
//! let mut client = Client::new(ClientConfig::new("192.168.1.250"));
//! client.connect().await?;
//!
//! // Read data
//! let words = client.read_words(MemoryArea::DM, 100, 10).await?.value;
//!
//! // Write data
//! client.write_words(MemoryArea::DM, 200, &[0x1234, -1]).await?;
//!
//! // Read/write bits
//! let bit = client.read_bit(MemoryArea::CIO, "0.05").await?.value;
//! client.write_bit(MemoryArea::CIO, "0.05", true).await?;
//!
//! // Read/write REALs
//! let temp = client.read_real(MemoryArea::DM, 300).await?.value;
//! client.write_real(MemoryArea::DM, 300, 25.5).await?;
//!
//! client.disconnect().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Sequencing
//!
//! FINS/TCP frames carry a fixed service ID, so a response can only be matched
//! to its request by order. Every operation takes `&mut self`, which keeps one
//! request in flight per connection. If an operation future is dropped after
//! its request was sent, the response may still arrive later; the client then
//! reports [`FinsError::Desynchronized`] and drops the connection on the next
//! call.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::command::{
    check_word_count, Address, ReadBitCommand, ReadWordCommand, WriteBitCommand,
    WriteWordCommand, COMMAND_MEMORY_READ, COMMAND_MEMORY_WRITE, RESPONSE_HEADER_SIZE,
};
use crate::error::{FinsError, Result};
use crate::handshake::Handshake;
use crate::header::{format_frame, NodeIdentity, TcpHeader, TCP_HEADER_SIZE};
use crate::memory::MemoryArea;
use crate::response::{FinsResponse, Reply};
use crate::status::{check_head_status, FinsStatus};
use crate::transport::{TcpTransport, Transport, DEFAULT_FINS_PORT, DEFAULT_PROBE_TIMEOUT};
use crate::value::RealLayout;

/// Configuration for creating a FINS/TCP client.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientConfig {
    /// PLC IP address or hostname.
    pub host: String,
    /// FINS/TCP port.
    pub port: u16,
    /// Bound on the reachability probe run before connecting.
    pub probe_timeout: Duration,
    /// Word order used by [`Client::read_real`] and [`Client::write_real`].
    pub real_layout: RealLayout,
}

impl ClientConfig {
    /// Creates a configuration with the default port, probe timeout and REAL
    /// layout.
    ///
    /// # Example
    ///
    /// ```
    /// use omron_fins_tcp::ClientConfig;
    ///
    /// let config = ClientConfig::new("192.168.1.250");
    /// assert_eq!(config.port, 9600);
    /// ```
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_FINS_PORT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            real_layout: RealLayout::default(),
        }
    }

    /// Sets a custom PLC port (default is 9600).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the reachability probe timeout (default is 2 seconds).
    ///
    /// # Example
    ///
    /// ```
    /// use omron_fins_tcp::ClientConfig;
    /// use std::time::Duration;
    ///
    /// let config = ClientConfig::new("192.168.1.250")
    ///     .with_probe_timeout(Duration::from_millis(500));
    /// ```
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Sets the REAL word order.
    pub fn with_real_layout(mut self, layout: RealLayout) -> Self {
        self.real_layout = layout;
        self
    }
}

/// FINS/TCP client for communicating with Omron PLCs.
///
/// Each operation produces exactly one request and one response. There are no
/// automatic retries, no caching and no reconnection: after a fatal transport
/// or framing error the client is disconnected and [`connect`](Client::connect)
/// must be called again.
///
/// Operations return a [`Reply`]. Its `warning` is set when the PLC completed
/// the command but reported the continuable (0x00, 0x40) end code.
pub struct Client<T: Transport = TcpTransport> {
    transport: T,
    config: ClientConfig,
    identity: Option<NodeIdentity>,
    in_flight: bool,
}

impl Client<TcpTransport> {
    /// Creates a disconnected client using a tokio TCP transport.
    ///
    /// The reachability probe targets the configured FINS port.
    pub fn new(config: ClientConfig) -> Self {
        let transport = TcpTransport::new().with_probe_port(config.port);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> Client<T> {
    /// Creates a disconnected client over a custom transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            transport,
            config,
            identity: None,
            in_flight: false,
        }
    }

    /// Probes the PLC, opens the connection and negotiates node numbers.
    ///
    /// An existing connection is closed first.
    ///
    /// # Errors
    ///
    /// - `FinsError::Transport` if the probe fails or the connection cannot be
    ///   opened
    /// - `FinsError::ProtocolFraming` if the handshake response is short
    /// - `FinsError::Handshake` if the PLC refuses the node address request
    pub async fn connect(&mut self) -> Result<NodeIdentity> {
        if self.transport.is_open() {
            self.teardown().await;
        }

        let identity = Handshake::new(&mut self.transport)
            .run(&self.config.host, self.config.port, self.config.probe_timeout)
            .await?;
        self.identity = Some(identity);
        self.in_flight = false;
        Ok(identity)
    }

    /// Closes the connection and forgets the node identity.
    pub async fn disconnect(&mut self) {
        let was_connected = self.identity.is_some();
        self.teardown().await;
        if was_connected {
            info!(host = %self.config.host, "disconnected");
        }
    }

    /// Whether a handshake has completed and the connection is usable.
    pub fn is_connected(&self) -> bool {
        self.identity.is_some()
    }

    /// Node numbers negotiated by the last successful handshake.
    pub fn node_identity(&self) -> Option<NodeIdentity> {
        self.identity
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Reads a single bit.
    ///
    /// # Arguments
    ///
    /// * `area` - Memory area to read from
    /// * `address` - Bit address as `"word.bit"`, e.g. `"100.05"`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The address is not of the form `word.bit` (no request is sent)
    /// - The client is not connected
    /// - Communication fails
    /// - The PLC returns an error
    pub async fn read_bit(&mut self, area: MemoryArea, address: &str) -> Result<Reply<bool>> {
        let address = Address::parse_bit(address)?;
        let cmd = ReadBitCommand::new(self.identity()?, area, address)?;

        let (response, warning) = self
            .execute(&cmd.to_bytes(), cmd.response_len(), COMMAND_MEMORY_READ)
            .await?;
        Ok(Reply::new(response.to_bit()?, warning))
    }

    /// Writes a single bit.
    ///
    /// # Errors
    ///
    /// Same conditions as [`read_bit`](Client::read_bit).
    pub async fn write_bit(
        &mut self,
        area: MemoryArea,
        address: &str,
        value: bool,
    ) -> Result<Reply<()>> {
        let address = Address::parse_bit(address)?;
        let cmd = WriteBitCommand::new(self.identity()?, area, address, value)?;

        let (_, warning) = self
            .execute(&cmd.to_bytes(), cmd.response_len(), COMMAND_MEMORY_WRITE)
            .await?;
        Ok(Reply::new((), warning))
    }

    /// Reads `count` consecutive words starting at `address`.
    ///
    /// Words are returned in address order as signed 16-bit values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Count is 0 or greater than 999
    /// - The client is not connected
    /// - Communication fails
    /// - The PLC returns an error
    pub async fn read_words(
        &mut self,
        area: MemoryArea,
        address: u16,
        count: u16,
    ) -> Result<Reply<Vec<i16>>> {
        check_word_count("count", count as usize)?;
        let cmd = ReadWordCommand::new(self.identity()?, area, address, count)?;

        let (response, warning) = self
            .execute(&cmd.to_bytes(), cmd.response_len(), COMMAND_MEMORY_READ)
            .await?;
        Ok(Reply::new(response.to_words()?, warning))
    }

    /// Writes `values` to consecutive words starting at `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `values` is empty or longer than 999 words
    /// - The client is not connected
    /// - Communication fails
    /// - The PLC returns an error
    pub async fn write_words(
        &mut self,
        area: MemoryArea,
        address: u16,
        values: &[i16],
    ) -> Result<Reply<()>> {
        check_word_count("values", values.len())?;
        let cmd = WriteWordCommand::new(self.identity()?, area, address, values)?;

        let (_, warning) = self
            .execute(&cmd.to_bytes(), cmd.response_len(), COMMAND_MEMORY_WRITE)
            .await?;
        Ok(Reply::new((), warning))
    }

    /// Reads a single word.
    pub async fn read_word(&mut self, area: MemoryArea, address: u16) -> Result<Reply<i16>> {
        let reply = self.read_words(area, address, 1).await?;
        let warning = reply.warning;
        match reply.value.first() {
            Some(&word) => Ok(Reply::new(word, warning)),
            None => Err(FinsError::framing("word read returned no data")),
        }
    }

    /// Writes a single word.
    pub async fn write_word(
        &mut self,
        area: MemoryArea,
        address: u16,
        value: i16,
    ) -> Result<Reply<()>> {
        self.write_words(area, address, &[value]).await
    }

    /// Reads a REAL from `address` and `address + 1`.
    ///
    /// The two words are combined with the configured [`RealLayout`].
    ///
    /// # Example
    ///
    /// ```no_run
    /// use omron_fins_tcp::{Client, ClientConfig, MemoryArea};
    ///
    /// # async fn run() -> omron_fins_tcp::Result<()> {
    /// let mut client = Client::new(ClientConfig::new("192.168.1.250"));
    /// client.connect().await?;
    /// let temperature = client.read_real(MemoryArea::DM, 300).await?.value;
    /// println!("DM300 = {}", temperature);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn read_real(&mut self, area: MemoryArea, address: u16) -> Result<Reply<f32>> {
        let reply = self.read_words(area, address, 2).await?;
        let layout = self.config.real_layout;
        match reply.value.as_slice() {
            &[first, second] => Ok(Reply::new(layout.decode([first, second]), reply.warning)),
            other => Err(FinsError::framing(format!(
                "REAL read returned {} words, expected 2",
                other.len()
            ))),
        }
    }

    /// Writes a REAL to `address` and `address + 1`.
    pub async fn write_real(
        &mut self,
        area: MemoryArea,
        address: u16,
        value: f32,
    ) -> Result<Reply<()>> {
        let words = self.config.real_layout.encode(value);
        self.write_words(area, address, &words).await
    }

    fn identity(&self) -> Result<NodeIdentity> {
        self.identity.ok_or(FinsError::NotConnected)
    }

    /// Runs one request/response exchange and translates the status.
    ///
    /// Fatal transport, framing and head status errors close the connection.
    async fn execute(
        &mut self,
        frame: &[u8],
        response_len: usize,
        command_code: u16,
    ) -> Result<(FinsResponse, Option<FinsStatus>)> {
        if self.in_flight {
            self.teardown().await;
            return Err(FinsError::Desynchronized);
        }

        self.in_flight = true;
        let result = self.exchange(frame, response_len, command_code).await;
        self.in_flight = false;

        match result {
            Ok((response, Some(status))) => {
                warn!(
                    main_code = status.main_code,
                    sub_code = status.sub_code,
                    description = status.description,
                    "PLC reported a recoverable end code"
                );
                Ok((response, Some(status)))
            }
            Ok(ok) => Ok(ok),
            Err(err) => {
                if err.tears_down_connection() {
                    debug!(error = %err, "dropping connection");
                    self.teardown().await;
                }
                Err(err)
            }
        }
    }

    async fn exchange(
        &mut self,
        frame: &[u8],
        response_len: usize,
        command_code: u16,
    ) -> Result<(FinsResponse, Option<FinsStatus>)> {
        debug!(frame = %format_frame(frame), "sending FINS command");
        self.transport.send(frame).await?;

        // head status is checked before any end code bytes are read
        let mut bytes = self.transport.receive_exact(TCP_HEADER_SIZE).await?;
        let tcp_header = TcpHeader::from_bytes(&bytes)?;
        check_head_status(bytes[11], tcp_header.error_code)?;

        let remaining = body_len(&tcp_header, response_len)?;
        bytes.extend(self.transport.receive_exact(remaining).await?);
        debug!(frame = %format_frame(&bytes), "received FINS response");

        let response = FinsResponse::from_bytes(&bytes)?;
        response.check_echo(command_code)?;
        let warning = response.check_end_code()?;

        if bytes.len() != response_len {
            return Err(FinsError::framing(format!(
                "response length mismatch: expected {} bytes, got {}",
                response_len,
                bytes.len()
            )));
        }

        Ok((response, warning))
    }

    async fn teardown(&mut self) {
        self.transport.close().await;
        self.identity = None;
        self.in_flight = false;
    }
}

impl<T: Transport> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("identity", &self.identity)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

/// Number of bytes to read after the FINS/TCP header.
///
/// The computed response length is read in full. A frame whose header
/// declares less, but still at least an end code, is an error response without
/// data and is read as declared.
fn body_len(tcp_header: &TcpHeader, response_len: usize) -> Result<usize> {
    let declared = tcp_header.length as usize + 8;
    if declared < RESPONSE_HEADER_SIZE || declared > response_len {
        return Err(FinsError::framing(format!(
            "response declares {} bytes, expected {}",
            declared, response_len
        )));
    }
    Ok(declared - TCP_HEADER_SIZE)
}
