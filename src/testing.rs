//! Scripted transport and frame builders shared by the unit tests.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;

use crate::command::{HANDSHAKE_RESPONSE_SIZE, RESPONSE_HEADER_SIZE};
use crate::error::{FinsError, Result};
use crate::transport::Transport;

/// In-memory transport replaying canned peer bytes.
///
/// Queued responses form one inbound byte stream, like a TCP socket: a read
/// asking for more bytes than are queued drains the queue and fails as if the
/// peer had closed the connection.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    unreachable: bool,
    hang: bool,
    fail_io: bool,
    open: bool,
    open_calls: usize,
    receive_calls: usize,
    sent: Vec<Vec<u8>>,
    inbound: VecDeque<u8>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queues bytes the peer will send.
    pub(crate) fn respond(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.inbound.extend(bytes.as_ref());
        self
    }

    /// Makes the reachability probe fail.
    pub(crate) fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Makes every receive wait forever.
    pub(crate) fn hang(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Makes every later send and receive fail as a broken socket would.
    pub(crate) fn fail_io(&mut self) {
        self.fail_io = true;
    }

    pub(crate) fn push_response(&mut self, bytes: impl AsRef<[u8]>) {
        self.inbound.extend(bytes.as_ref());
    }

    pub(crate) fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    pub(crate) fn open_calls(&self) -> usize {
        self.open_calls
    }

    pub(crate) fn receive_calls(&self) -> usize {
        self.receive_calls
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn probe_reachability(&self, _host: &str, _timeout: Duration) -> bool {
        !self.unreachable
    }

    async fn open(&mut self, _host: &str, _port: u16) -> Result<()> {
        self.open_calls += 1;
        self.open = true;
        Ok(())
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        if !self.open {
            return Err(FinsError::transport("transport is not open"));
        }
        if self.fail_io {
            return Err(FinsError::transport("connection reset by peer"));
        }
        self.sent.push(bytes.to_vec());
        Ok(())
    }

    async fn receive_exact(&mut self, len: usize) -> Result<Vec<u8>> {
        self.receive_calls += 1;
        if self.fail_io {
            return Err(FinsError::transport("connection reset by peer"));
        }
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.inbound.len() < len {
            let available = self.inbound.len();
            self.inbound.clear();
            return Err(FinsError::framing(format!(
                "connection closed after {} of {} bytes",
                available, len
            )));
        }
        Ok(self.inbound.drain(..len).collect())
    }

    async fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

/// A 24-byte node address response.
pub(crate) fn handshake_response(status: u8, local: u8, remote: u8) -> Vec<u8> {
    let mut bytes = vec![0u8; HANDSHAKE_RESPONSE_SIZE];
    bytes[..4].copy_from_slice(b"FINS");
    bytes[7] = 0x10;
    bytes[11] = 0x01;
    bytes[15] = status;
    bytes[19] = local;
    bytes[23] = remote;
    bytes
}

/// A memory command response for `command_code` with the given end code and data.
pub(crate) fn fins_response(
    command_code: u16,
    main_code: u8,
    sub_code: u8,
    data: &[u8],
) -> Vec<u8> {
    let length = (RESPONSE_HEADER_SIZE - 8 + data.len()) as u32;
    let mut bytes = b"FINS".to_vec();
    bytes.extend_from_slice(&length.to_be_bytes());
    bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00]);
    bytes.extend_from_slice(&[0xC0, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x0A, 0x00, 0xFF]);
    bytes.extend_from_slice(&command_code.to_be_bytes());
    bytes.push(main_code);
    bytes.push(sub_code);
    bytes.extend_from_slice(data);
    bytes
}
