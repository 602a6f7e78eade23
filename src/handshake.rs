//! FINS/TCP node address handshake.
//!
//! A FINS/TCP session starts with the client asking the PLC to assign it a
//! node number. The exchange walks through these states:
//!
//! ```text
//! Idle → ReachabilityChecked → TransportOpen → HandshakeSent → NodesAssigned
//!   └──────────────┴──────────────────┴───────────────┴──────→ Failed
//! ```
//!
//! The 24-byte response carries the status at offset 15, the node assigned to
//! this client at offset 19 and the PLC's own node at offset 23.

use std::time::Duration;

use tracing::{debug, info};

use crate::command::{HandshakeCommand, HANDSHAKE_RESPONSE_SIZE};
use crate::error::{FinsError, Result};
use crate::header::{format_frame, NodeIdentity, FINS_MAGIC};
use crate::transport::Transport;

const STATUS_OFFSET: usize = 15;
const LOCAL_NODE_OFFSET: usize = 19;
const REMOTE_NODE_OFFSET: usize = 23;

/// Progress of a handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeState {
    /// Nothing attempted yet.
    Idle,
    /// The peer answered the reachability probe.
    ReachabilityChecked,
    /// The transport is open.
    TransportOpen,
    /// The node address request has been sent.
    HandshakeSent,
    /// The peer assigned node numbers.
    NodesAssigned(NodeIdentity),
    /// The handshake failed; the transport is closed.
    Failed(String),
}

/// Drives the handshake over a transport.
///
/// # Example
///
/// ```no_run
/// use omron_fins_tcp::{Handshake, HandshakeState, TcpTransport, DEFAULT_PROBE_TIMEOUT};
///
/// # async fn run() -> omron_fins_tcp::Result<()> {
/// let mut transport = TcpTransport::new();
/// let mut handshake = Handshake::new(&mut transport);
/// let identity = handshake.run("192.168.1.250", 9600, DEFAULT_PROBE_TIMEOUT).await?;
/// assert_eq!(handshake.state(), &HandshakeState::NodesAssigned(identity));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Handshake<'a, T: Transport> {
    transport: &'a mut T,
    state: HandshakeState,
}

impl<'a, T: Transport> Handshake<'a, T> {
    /// Creates an idle handshake over `transport`.
    pub fn new(transport: &'a mut T) -> Self {
        Self {
            transport,
            state: HandshakeState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> &HandshakeState {
        &self.state
    }

    /// Probes, opens the transport and negotiates node numbers.
    ///
    /// # Errors
    ///
    /// - `FinsError::Transport` if the probe fails (the transport is never
    ///   opened) or the connection cannot be opened or written
    /// - `FinsError::ProtocolFraming` if fewer than 24 bytes arrive
    /// - `FinsError::Handshake` if the peer refuses the request
    ///
    /// On any failure after the transport was opened, the transport is closed.
    pub async fn run(
        &mut self,
        host: &str,
        port: u16,
        probe_timeout: Duration,
    ) -> Result<NodeIdentity> {
        if !self.transport.probe_reachability(host, probe_timeout).await {
            let err = FinsError::transport(format!(
                "{} did not answer the reachability probe within {:?}",
                host, probe_timeout
            ));
            self.state = HandshakeState::Failed(err.to_string());
            return Err(err);
        }
        self.state = HandshakeState::ReachabilityChecked;

        if let Err(err) = self.transport.open(host, port).await {
            self.state = HandshakeState::Failed(err.to_string());
            return Err(err);
        }
        self.state = HandshakeState::TransportOpen;

        match self.exchange().await {
            Ok(identity) => {
                info!(
                    host,
                    port,
                    local = identity.local,
                    remote = identity.remote,
                    "FINS nodes assigned"
                );
                self.state = HandshakeState::NodesAssigned(identity);
                Ok(identity)
            }
            Err(err) => {
                self.transport.close().await;
                self.state = HandshakeState::Failed(err.to_string());
                Err(err)
            }
        }
    }

    async fn exchange(&mut self) -> Result<NodeIdentity> {
        let request = HandshakeCommand.to_bytes();
        debug!(frame = %format_frame(&request), "sending node address request");
        self.transport.send(&request).await?;
        self.state = HandshakeState::HandshakeSent;

        let response = self.transport.receive_exact(HANDSHAKE_RESPONSE_SIZE).await?;
        debug!(frame = %format_frame(&response), "received node address response");
        parse_handshake_response(&response)
    }
}

/// Extracts the assigned node numbers from a handshake response.
///
/// # Errors
///
/// - `FinsError::ProtocolFraming` if the response is shorter than 24 bytes or
///   lacks the `"FINS"` marker
/// - `FinsError::Handshake` if the status byte is non-zero
///
/// # Example
///
/// ```
/// use omron_fins_tcp::{parse_handshake_response, NodeIdentity};
///
/// let mut response = [0u8; 24];
/// response[..4].copy_from_slice(b"FINS");
/// response[19] = 0x01;
/// response[23] = 0x02;
/// assert_eq!(parse_handshake_response(&response).unwrap(), NodeIdentity::new(1, 2));
///
/// assert!(parse_handshake_response(&response[..20]).is_err());
/// ```
pub fn parse_handshake_response(bytes: &[u8]) -> Result<NodeIdentity> {
    if bytes.len() < HANDSHAKE_RESPONSE_SIZE {
        return Err(FinsError::framing(format!(
            "handshake response too short: expected {} bytes, got {}",
            HANDSHAKE_RESPONSE_SIZE,
            bytes.len()
        )));
    }
    if bytes[..4] != FINS_MAGIC {
        return Err(FinsError::framing("handshake response is missing the FINS marker"));
    }
    if bytes[STATUS_OFFSET] != 0 {
        return Err(FinsError::Handshake {
            main_code: bytes[STATUS_OFFSET],
            sub_code: bytes[STATUS_OFFSET - 1],
        });
    }

    Ok(NodeIdentity::new(
        bytes[LOCAL_NODE_OFFSET],
        bytes[REMOTE_NODE_OFFSET],
    ))
}
