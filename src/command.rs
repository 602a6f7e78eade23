//! FINS/TCP command frames and their serialization.
//!
//! Every frame is positional: each field sits at a fixed byte offset and all
//! multi-byte values are big-endian. The builders here reproduce those offsets
//! exactly.
//!
//! # Command Types
//!
//! - [`HandshakeCommand`] - Node address request opening a session
//! - [`ReadWordCommand`] - Read words from PLC memory
//! - [`WriteWordCommand`] - Write words to PLC memory
//! - [`ReadBitCommand`] - Read a single bit from PLC memory
//! - [`WriteBitCommand`] - Write a single bit to PLC memory
//!
//! # Example
//!
//! ```
//! use omron_fins_tcp::{MemoryArea, NodeIdentity, ReadWordCommand};
//!
//! let identity = NodeIdentity::new(0x01, 0x0A);
//! let cmd = ReadWordCommand::new(identity, MemoryArea::DM, 100, 10).unwrap();
//! let bytes = cmd.to_bytes();
//! assert_eq!(bytes.len(), 34);
//! assert_eq!(cmd.response_len(), 30 + 20);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{FinsError, Result};
use crate::header::{
    FinsHeader, NodeIdentity, TcpHeader, FINS_HEADER_SIZE, TCP_COMMAND_FINS_FRAME,
    TCP_COMMAND_NODE_REQUEST, TCP_HEADER_SIZE,
};
use crate::memory::{AccessGranularity, MemoryArea};

/// Memory Area Read command code.
pub(crate) const COMMAND_MEMORY_READ: u16 = 0x0101;
/// Memory Area Write command code.
pub(crate) const COMMAND_MEMORY_WRITE: u16 = 0x0102;

/// Size of a handshake request frame.
pub const HANDSHAKE_REQUEST_SIZE: usize = 20;

/// Size of a handshake response frame.
pub const HANDSHAKE_RESPONSE_SIZE: usize = 24;

/// Size of a memory command frame without payload.
pub const COMMAND_FRAME_SIZE: usize = TCP_HEADER_SIZE + FINS_HEADER_SIZE + 8;

/// Size of a memory command response up to (and including) the end code.
pub const RESPONSE_HEADER_SIZE: usize = 30;

/// Maximum number of words that can be read/written in a single command.
pub const MAX_WORDS_PER_COMMAND: u16 = 999;

/// Bytes counted by the FINS/TCP length field that precede the payload.
const LENGTH_BASE: u32 = (COMMAND_FRAME_SIZE - 8) as u32;

/// Address of a word, or of a bit within a word.
///
/// The textual form is `word` for word addresses and `word.bit` for bit
/// addresses, as written in Omron tooling (`"100.05"` is bit 5 of word 100).
///
/// # Example
///
/// ```
/// use omron_fins_tcp::Address;
///
/// let addr: Address = "100.5".parse().unwrap();
/// assert_eq!(addr.word, 100);
/// assert_eq!(addr.bit, Some(5));
/// assert_eq!(addr.to_string(), "100.05");
///
/// assert!(Address::parse_bit("100").is_err());
/// assert!(Address::parse_bit("abc.5").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    /// Word address in the memory area.
    pub word: u16,
    /// Bit position (0-15) for bit access.
    pub bit: Option<u8>,
}

impl Address {
    /// Creates a word address.
    pub fn word(word: u16) -> Self {
        Self { word, bit: None }
    }

    /// Creates a bit address.
    ///
    /// # Errors
    ///
    /// Returns `FinsError::InvalidParameter` if bit > 15.
    pub fn bit(word: u16, bit: u8) -> Result<Self> {
        if bit > 15 {
            return Err(FinsError::invalid_parameter("bit", "must be 0-15"));
        }
        Ok(Self {
            word,
            bit: Some(bit),
        })
    }

    /// Parses a `word.bit` string, rejecting plain word addresses.
    ///
    /// # Errors
    ///
    /// Returns `FinsError::AddressFormat` if the string is not two integers
    /// separated by a dot, or the bit part is outside 0–15.
    pub fn parse_bit(s: &str) -> Result<Self> {
        let addr: Address = s.parse()?;
        if addr.bit.is_none() {
            return Err(FinsError::address_format(s, "missing bit part, expected word.bit"));
        }
        Ok(addr)
    }

    /// Granularity this address designates.
    pub fn granularity(self) -> AccessGranularity {
        match self.bit {
            Some(_) => AccessGranularity::Bit,
            None => AccessGranularity::Word,
        }
    }

    /// Serializes address to 3 bytes (word high, word low, bit).
    pub(crate) fn to_bytes(self) -> [u8; 3] {
        let [high, low] = self.word.to_be_bytes();
        [high, low, self.bit.unwrap_or(0)]
    }
}

impl FromStr for Address {
    type Err = FinsError;

    fn from_str(s: &str) -> Result<Self> {
        let (word_part, bit_part) = match s.split_once('.') {
            Some((word, bit)) => (word, Some(bit)),
            None => (s, None),
        };

        let word: u16 = parse_digits(word_part).ok_or_else(|| {
            FinsError::address_format(s, "word part is not an integer in 0-65535")
        })?;

        match bit_part {
            None => Ok(Address::word(word)),
            Some(bit) => {
                let bit: u8 = parse_digits(bit)
                    .ok_or_else(|| FinsError::address_format(s, "bit part is not an integer"))?;
                if bit > 15 {
                    return Err(FinsError::address_format(s, "bit part must be 0-15"));
                }
                Ok(Address {
                    word,
                    bit: Some(bit),
                })
            }
        }
    }
}

/// Parses an unsigned decimal made of ASCII digits only; signs are rejected.
fn parse_digits<T: FromStr>(part: &str) -> Option<T> {
    let part = part.trim();
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bit {
            Some(bit) => write!(f, "{}.{:02}", self.word, bit),
            None => write!(f, "{}", self.word),
        }
    }
}

/// Node address request sent right after the connection opens.
///
/// The frame is always the same 20 bytes: the client asks the peer to assign
/// it a node number (client node 0).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandshakeCommand;

impl HandshakeCommand {
    /// Serializes the command to bytes for transmission.
    ///
    /// # Example
    ///
    /// ```
    /// use omron_fins_tcp::HandshakeCommand;
    ///
    /// let bytes = HandshakeCommand.to_bytes();
    /// assert_eq!(&bytes[0..4], b"FINS");
    /// assert_eq!(bytes[7], 0x0C);
    /// ```
    pub fn to_bytes(self) -> [u8; HANDSHAKE_REQUEST_SIZE] {
        let mut bytes = [0u8; HANDSHAKE_REQUEST_SIZE];
        bytes[..TCP_HEADER_SIZE]
            .copy_from_slice(&TcpHeader::new(TCP_COMMAND_NODE_REQUEST, 0x0C).to_bytes());
        bytes
    }
}

/// Serializes a memory area read/write frame.
fn memory_frame(
    identity: NodeIdentity,
    command_code: u16,
    area_code: u8,
    address: Address,
    count: u16,
    payload: &[u8],
) -> Vec<u8> {
    let length = LENGTH_BASE + payload.len() as u32;
    let mut bytes = Vec::with_capacity(COMMAND_FRAME_SIZE + payload.len());
    bytes.extend_from_slice(&TcpHeader::new(TCP_COMMAND_FINS_FRAME, length).to_bytes());
    bytes.extend_from_slice(&FinsHeader::new_command(identity).to_bytes());
    bytes.extend_from_slice(&command_code.to_be_bytes());
    bytes.push(area_code);
    bytes.extend_from_slice(&address.to_bytes());
    bytes.extend_from_slice(&count.to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

pub(crate) fn check_word_count(parameter: &str, count: usize) -> Result<u16> {
    if count == 0 {
        return Err(FinsError::invalid_parameter(
            parameter,
            "must be greater than 0",
        ));
    }
    if count > MAX_WORDS_PER_COMMAND as usize {
        return Err(FinsError::invalid_parameter(
            parameter,
            format!("must not exceed {} words", MAX_WORDS_PER_COMMAND),
        ));
    }
    Ok(count as u16)
}

/// Command for reading words from PLC memory.
#[derive(Debug, Clone)]
pub struct ReadWordCommand {
    identity: NodeIdentity,
    area: MemoryArea,
    address: Address,
    count: u16,
}

impl ReadWordCommand {
    /// Creates a new read word command.
    ///
    /// # Errors
    ///
    /// Returns an error if count is 0 or exceeds [`MAX_WORDS_PER_COMMAND`].
    pub fn new(
        identity: NodeIdentity,
        area: MemoryArea,
        word_address: u16,
        count: u16,
    ) -> Result<Self> {
        Ok(Self {
            identity,
            area,
            address: Address::word(word_address),
            count: check_word_count("count", count as usize)?,
        })
    }

    /// Number of words requested.
    pub fn count(&self) -> u16 {
        self.count
    }

    /// Length of the response this command expects.
    pub fn response_len(&self) -> usize {
        RESPONSE_HEADER_SIZE + 2 * self.count as usize
    }

    /// Serializes the command to bytes for transmission.
    pub fn to_bytes(&self) -> Vec<u8> {
        memory_frame(
            self.identity,
            COMMAND_MEMORY_READ,
            self.area.code(AccessGranularity::Word),
            self.address,
            self.count,
            &[],
        )
    }
}

/// Command for writing words to PLC memory.
#[derive(Debug, Clone)]
pub struct WriteWordCommand {
    identity: NodeIdentity,
    area: MemoryArea,
    address: Address,
    data: Vec<i16>,
}

impl WriteWordCommand {
    /// Creates a new write word command.
    ///
    /// # Errors
    ///
    /// Returns an error if data is empty or exceeds [`MAX_WORDS_PER_COMMAND`].
    ///
    /// # Example
    ///
    /// ```
    /// use omron_fins_tcp::{MemoryArea, NodeIdentity, WriteWordCommand};
    ///
    /// let cmd = WriteWordCommand::new(
    ///     NodeIdentity::new(1, 10),
    ///     MemoryArea::DM,
    ///     100,
    ///     &[0x1234, -1],
    /// ).unwrap();
    /// let bytes = cmd.to_bytes();
    /// assert_eq!(&bytes[34..], &[0x12, 0x34, 0xFF, 0xFF]);
    /// ```
    pub fn new(
        identity: NodeIdentity,
        area: MemoryArea,
        word_address: u16,
        data: &[i16],
    ) -> Result<Self> {
        check_word_count("data", data.len())?;
        Ok(Self {
            identity,
            area,
            address: Address::word(word_address),
            data: data.to_vec(),
        })
    }

    /// Length of the response this command expects.
    pub fn response_len(&self) -> usize {
        RESPONSE_HEADER_SIZE
    }

    /// Serializes the command to bytes for transmission.
    pub fn to_bytes(&self) -> Vec<u8> {
        let payload: Vec<u8> = self.data.iter().flat_map(|w| w.to_be_bytes()).collect();
        memory_frame(
            self.identity,
            COMMAND_MEMORY_WRITE,
            self.area.code(AccessGranularity::Word),
            self.address,
            self.data.len() as u16,
            &payload,
        )
    }
}

/// Command for reading a single bit from PLC memory.
#[derive(Debug, Clone)]
pub struct ReadBitCommand {
    identity: NodeIdentity,
    area: MemoryArea,
    address: Address,
}

impl ReadBitCommand {
    /// Creates a new read bit command.
    ///
    /// # Errors
    ///
    /// Returns an error if the address carries no bit index.
    pub fn new(identity: NodeIdentity, area: MemoryArea, address: Address) -> Result<Self> {
        require_bit(address)?;
        Ok(Self {
            identity,
            area,
            address,
        })
    }

    /// Length of the response this command expects.
    pub fn response_len(&self) -> usize {
        RESPONSE_HEADER_SIZE + 1
    }

    /// Serializes the command to bytes for transmission.
    pub fn to_bytes(&self) -> Vec<u8> {
        memory_frame(
            self.identity,
            COMMAND_MEMORY_READ,
            self.area.code(AccessGranularity::Bit),
            self.address,
            1,
            &[],
        )
    }
}

/// Command for writing a single bit to PLC memory.
#[derive(Debug, Clone)]
pub struct WriteBitCommand {
    identity: NodeIdentity,
    area: MemoryArea,
    address: Address,
    value: bool,
}

impl WriteBitCommand {
    /// Creates a new write bit command.
    ///
    /// # Errors
    ///
    /// Returns an error if the address carries no bit index.
    ///
    /// # Example
    ///
    /// ```
    /// use omron_fins_tcp::{Address, MemoryArea, NodeIdentity, WriteBitCommand};
    ///
    /// let cmd = WriteBitCommand::new(
    ///     NodeIdentity::new(1, 10),
    ///     MemoryArea::WR,
    ///     Address::bit(50, 10).unwrap(),
    ///     true,
    /// ).unwrap();
    /// let bytes = cmd.to_bytes();
    /// assert_eq!(bytes.len(), 35);
    /// assert_eq!(bytes[7], 0x1B);
    /// assert_eq!(bytes[34], 0x01);
    /// ```
    pub fn new(
        identity: NodeIdentity,
        area: MemoryArea,
        address: Address,
        value: bool,
    ) -> Result<Self> {
        require_bit(address)?;
        Ok(Self {
            identity,
            area,
            address,
            value,
        })
    }

    /// Length of the response this command expects.
    pub fn response_len(&self) -> usize {
        RESPONSE_HEADER_SIZE
    }

    /// Serializes the command to bytes for transmission.
    pub fn to_bytes(&self) -> Vec<u8> {
        memory_frame(
            self.identity,
            COMMAND_MEMORY_WRITE,
            self.area.code(AccessGranularity::Bit),
            self.address,
            1,
            &[u8::from(self.value)],
        )
    }
}

fn require_bit(address: Address) -> Result<()> {
    match address.bit {
        Some(bit) if bit <= 15 => Ok(()),
        Some(_) => Err(FinsError::invalid_parameter("bit", "must be 0-15")),
        None => Err(FinsError::invalid_addressing(format!(
            "bit access requires a bit index, got word address {}",
            address
        ))),
    }
}
