//! FINS/TCP response parsing and validation.
//!
//! # Response Structure
//!
//! | Offset | Size | Description |
//! |--------|------|-------------|
//! | 0 | 16 bytes | FINS/TCP header; byte 11 is the head status, 12–15 the error code |
//! | 16 | 10 bytes | FINS header (ICF 0xC0 for responses) |
//! | 26 | 2 bytes | Echoed command code |
//! | 28 | 2 bytes | End code (main, sub) |
//! | 30 | Variable | Response data |
//!
//! # Example
//!
//! ```
//! use omron_fins_tcp::FinsResponse;
//!
//! let mut bytes = vec![
//!     b'F', b'I', b'N', b'S', 0x00, 0x00, 0x00, 0x1A, // magic, length
//!     0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, // command, error code
//!     0xC0, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x0A, 0x00, 0xFF, // FINS header
//!     0x01, 0x01, // command code
//!     0x00, 0x00, // end code
//! ];
//! bytes.extend_from_slice(&[0x12, 0x34, 0xFF, 0xFE]);
//!
//! let response = FinsResponse::from_bytes(&bytes).unwrap();
//! assert!(response.check_end_code().unwrap().is_none());
//! assert_eq!(response.to_words().unwrap(), vec![0x1234, -2]);
//! ```

use crate::command::RESPONSE_HEADER_SIZE;
use crate::error::{FinsError, Result};
use crate::header::{FinsHeader, TcpHeader, SERVICE_ID, TCP_HEADER_SIZE};
use crate::status::{check_head_status, classify_end_code, Classification, FinsStatus};

/// Parsed FINS/TCP response.
#[derive(Debug, Clone)]
pub struct FinsResponse {
    /// FINS/TCP header.
    pub tcp_header: TcpHeader,
    /// FINS header.
    pub header: FinsHeader,
    /// Command code echoed by the PLC.
    pub command_code: u16,
    /// End code main byte.
    pub main_code: u8,
    /// End code sub byte.
    pub sub_code: u8,
    /// Response data (if any).
    pub data: Vec<u8>,
}

impl FinsResponse {
    /// Parses a FINS/TCP response from raw bytes.
    ///
    /// The head status is checked as soon as the FINS/TCP header is available,
    /// so a rejected frame never has its end code inspected.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The frame is shorter than its fixed header (`ProtocolFraming`)
    /// - The `"FINS"` marker is missing (`ProtocolFraming`)
    /// - The peer rejected the frame (`HeadStatus`)
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let tcp_header = TcpHeader::from_bytes(data)?;
        check_head_status(data[11], tcp_header.error_code)?;

        if data.len() < RESPONSE_HEADER_SIZE {
            return Err(FinsError::framing(format!(
                "response too short: expected at least {} bytes, got {}",
                RESPONSE_HEADER_SIZE,
                data.len()
            )));
        }

        let header = FinsHeader::from_bytes(&data[TCP_HEADER_SIZE..])?;

        Ok(Self {
            tcp_header,
            header,
            command_code: u16::from_be_bytes([data[26], data[27]]),
            main_code: data[28],
            sub_code: data[29],
            data: data[RESPONSE_HEADER_SIZE..].to_vec(),
        })
    }

    /// Translates the end code.
    ///
    /// Returns `Ok(None)` on normal completion and `Ok(Some(status))` for the
    /// continuable (0x00, 0x40) alarm.
    ///
    /// # Errors
    ///
    /// Returns `FinsError::EndCode` for every other non-zero end code.
    pub fn check_end_code(&self) -> Result<Option<FinsStatus>> {
        match classify_end_code(self.main_code, self.sub_code) {
            Classification::Success => Ok(None),
            Classification::Warning(status) => Ok(Some(status)),
            Classification::Fatal(status) => Err(FinsError::EndCode(status)),
        }
    }

    /// Checks that the response answers the command that was sent.
    ///
    /// # Errors
    ///
    /// Returns `FinsError::ProtocolFraming` if the echoed command code or the
    /// service ID differ from the request.
    pub fn check_echo(&self, command_code: u16) -> Result<()> {
        if self.command_code != command_code {
            return Err(FinsError::framing(format!(
                "command code mismatch: expected 0x{:04X}, received 0x{:04X}",
                command_code, self.command_code
            )));
        }
        if self.header.sid != SERVICE_ID {
            return Err(FinsError::framing(format!(
                "service ID mismatch: expected 0x{:02X}, received 0x{:02X}",
                SERVICE_ID, self.header.sid
            )));
        }
        Ok(())
    }

    /// Converts response data to words (big-endian i16 values).
    ///
    /// # Errors
    ///
    /// Returns an error if the data length is not even.
    pub fn to_words(&self) -> Result<Vec<i16>> {
        if self.data.len() % 2 != 0 {
            return Err(FinsError::framing(
                "data length must be even for word conversion",
            ));
        }

        Ok(self
            .data
            .chunks_exact(2)
            .map(|chunk| i16::from_be_bytes([chunk[0], chunk[1]]))
            .collect())
    }

    /// Converts response data to a single bit value.
    ///
    /// # Errors
    ///
    /// Returns an error if there's no data or the byte is neither 0 nor 1.
    pub fn to_bit(&self) -> Result<bool> {
        match self.data.first() {
            Some(0x00) => Ok(false),
            Some(0x01) => Ok(true),
            Some(other) => Err(FinsError::framing(format!(
                "bit value must be 0 or 1, got 0x{:02X}",
                other
            ))),
            None => Err(FinsError::framing("no data for bit conversion")),
        }
    }
}

/// Result of a successful operation.
///
/// `warning` is set when the PLC completed the command but reported the
/// continuable (0x00, 0x40) end code.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply<T> {
    /// Decoded value.
    pub value: T,
    /// Recoverable end code reported alongside the value, if any.
    pub warning: Option<FinsStatus>,
}

impl<T> Reply<T> {
    pub(crate) fn new(value: T, warning: Option<FinsStatus>) -> Self {
        Self { value, warning }
    }

    /// Whether the PLC reported a recoverable warning.
    pub fn has_warning(&self) -> bool {
        self.warning.is_some()
    }

    /// Discards the warning and returns the value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Maps the value, keeping the warning.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        Reply {
            value: f(self.value),
            warning: self.warning,
        }
    }
}
