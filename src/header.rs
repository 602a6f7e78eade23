//! FINS/TCP and FINS headers, and the node identity they carry.
//!
//! Every frame on a FINS/TCP connection starts with a 16-byte FINS/TCP header.
//! Command frames follow it with the 10-byte FINS header:
//!
//! | Offset | Field | Description |
//! |--------|-------|-------------|
//! | 0–3 | Magic | ASCII `"FINS"` |
//! | 4–7 | Length | Bytes following this field (big-endian) |
//! | 8–11 | Command | 0 = node address request, 2 = FINS frame |
//! | 12–15 | Error code | 0 on requests |
//! | 16 | ICF | Information Control Field |
//! | 17 | RSV | Reserved |
//! | 18 | GCT | Gateway Count |
//! | 19 | DNA | Destination Network Address |
//! | 20 | DA1 | Destination Node Address |
//! | 21 | DA2 | Destination Unit Address |
//! | 22 | SNA | Source Network Address |
//! | 23 | SA1 | Source Node Address |
//! | 24 | SA2 | Source Unit Address |
//! | 25 | SID | Service ID |
//!
//! # Example
//!
//! ```
//! use omron_fins_tcp::{FinsHeader, NodeIdentity};
//!
//! let identity = NodeIdentity::new(0x01, 0x0A);
//! let header = FinsHeader::new_command(identity);
//! assert_eq!(header.to_bytes(), [0x80, 0x00, 0x02, 0x00, 0x0A, 0x00, 0x00, 0x01, 0x00, 0xFF]);
//! ```

use crate::error::{FinsError, Result};

/// ASCII `"FINS"` marker opening every FINS/TCP frame.
pub const FINS_MAGIC: [u8; 4] = *b"FINS";

/// FINS/TCP header size in bytes.
pub const TCP_HEADER_SIZE: usize = 16;

/// FINS header size in bytes.
pub const FINS_HEADER_SIZE: usize = 10;

/// FINS/TCP command: client node address request.
pub const TCP_COMMAND_NODE_REQUEST: u32 = 0x0000_0000;

/// FINS/TCP command: FINS frame send.
pub const TCP_COMMAND_FINS_FRAME: u32 = 0x0000_0002;

/// Service ID used on every command; one request is in flight at a time.
pub const SERVICE_ID: u8 = 0xFF;

/// Node numbers assigned by the peer during the handshake.
///
/// `local` is this client's node, `remote` the PLC's node. Both are embedded in
/// every command frame built on the connection that negotiated them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIdentity {
    /// Node number assigned to this client.
    pub local: u8,
    /// Node number of the PLC.
    pub remote: u8,
}

impl NodeIdentity {
    /// Creates a node identity.
    pub fn new(local: u8, remote: u8) -> Self {
        Self { local, remote }
    }
}

impl std::fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "local node {}, remote node {}", self.local, self.remote)
    }
}

/// FINS/TCP frame header (16 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpHeader {
    /// Number of bytes following the length field.
    pub length: u32,
    /// FINS/TCP command.
    pub command: u32,
    /// FINS/TCP error code.
    pub error_code: u32,
}

impl TcpHeader {
    /// Creates a request header with a zero error code.
    pub fn new(command: u32, length: u32) -> Self {
        Self {
            length,
            command,
            error_code: 0,
        }
    }

    /// Serializes the header to bytes.
    pub fn to_bytes(self) -> [u8; TCP_HEADER_SIZE] {
        let mut bytes = [0u8; TCP_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&FINS_MAGIC);
        bytes[4..8].copy_from_slice(&self.length.to_be_bytes());
        bytes[8..12].copy_from_slice(&self.command.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.error_code.to_be_bytes());
        bytes
    }

    /// Parses a header from bytes.
    ///
    /// # Errors
    ///
    /// Returns `FinsError::ProtocolFraming` if the slice is too short or does
    /// not start with the `"FINS"` marker.
    ///
    /// # Example
    ///
    /// ```
    /// use omron_fins_tcp::TcpHeader;
    ///
    /// let bytes = [b'F', b'I', b'N', b'S', 0, 0, 0, 0x16, 0, 0, 0, 2, 0, 0, 0, 0];
    /// let header = TcpHeader::from_bytes(&bytes).unwrap();
    /// assert_eq!(header.length, 0x16);
    /// assert_eq!(header.command, 2);
    /// ```
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < TCP_HEADER_SIZE {
            return Err(FinsError::framing(format!(
                "FINS/TCP header too short: expected {} bytes, got {}",
                TCP_HEADER_SIZE,
                data.len()
            )));
        }
        if data[0..4] != FINS_MAGIC {
            return Err(FinsError::framing(format!(
                "missing FINS marker: {:02X?}",
                &data[0..4]
            )));
        }

        Ok(Self {
            length: read_u32(&data[4..8]),
            command: read_u32(&data[8..12]),
            error_code: read_u32(&data[12..16]),
        })
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// FINS command/response header (10 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinsHeader {
    /// Information Control Field (0x80 = command, response required).
    pub icf: u8,
    /// Reserved byte (always 0x00).
    pub rsv: u8,
    /// Gateway Count.
    pub gct: u8,
    /// Destination Network Address.
    pub dna: u8,
    /// Destination Node Address.
    pub da1: u8,
    /// Destination Unit Address.
    pub da2: u8,
    /// Source Network Address.
    pub sna: u8,
    /// Source Node Address.
    pub sa1: u8,
    /// Source Unit Address.
    pub sa2: u8,
    /// Service ID.
    pub sid: u8,
}

impl FinsHeader {
    /// Creates a command header addressed with the negotiated node identity.
    pub fn new_command(identity: NodeIdentity) -> Self {
        Self {
            icf: 0x80,
            rsv: 0x00,
            gct: 0x02,
            dna: 0x00,
            da1: identity.remote,
            da2: 0x00,
            sna: 0x00,
            sa1: identity.local,
            sa2: 0x00,
            sid: SERVICE_ID,
        }
    }

    /// Serializes the header to bytes.
    pub fn to_bytes(self) -> [u8; FINS_HEADER_SIZE] {
        [
            self.icf, self.rsv, self.gct, self.dna, self.da1, self.da2, self.sna, self.sa1,
            self.sa2, self.sid,
        ]
    }

    /// Parses a header from bytes.
    ///
    /// # Errors
    ///
    /// Returns `FinsError::ProtocolFraming` if the slice is too short.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < FINS_HEADER_SIZE {
            return Err(FinsError::framing(format!(
                "FINS header too short: expected {} bytes, got {}",
                FINS_HEADER_SIZE,
                data.len()
            )));
        }

        Ok(Self {
            icf: data[0],
            rsv: data[1],
            gct: data[2],
            dna: data[3],
            da1: data[4],
            da2: data[5],
            sna: data[6],
            sa1: data[7],
            sa2: data[8],
            sid: data[9],
        })
    }

    /// Returns whether this is a response header.
    pub fn is_response(self) -> bool {
        (self.icf & 0x40) != 0
    }
}

/// Formats a frame as space-separated hex bytes for logging.
pub(crate) fn format_frame(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
