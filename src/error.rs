//! Error types for the FINS/TCP client.
//!
//! Every failure surfaces as a [`FinsError`]. Whatever the variant, callers can
//! branch on the same four facts: [`FinsError::main_code`],
//! [`FinsError::sub_code`], [`FinsError::description`] and
//! [`FinsError::is_recoverable`].

use std::io;
use thiserror::Error;

use crate::status::{head_status_description, FinsStatus};

/// Result type alias for FINS operations.
pub type Result<T> = std::result::Result<T, FinsError>;

/// Errors that can occur during FINS communication.
#[derive(Debug, Error)]
pub enum FinsError {
    /// Reachability probe, connect, send or receive failure at the socket level.
    #[error("Transport error: {reason}")]
    Transport {
        /// Description of the transport failure.
        reason: String,
        /// Underlying I/O error, if any.
        #[source]
        source: Option<io::Error>,
    },

    /// Short or malformed frame received from the peer.
    #[error("Protocol framing error: {reason}")]
    ProtocolFraming {
        /// Description of the framing problem.
        reason: String,
    },

    /// The peer rejected the frame at the FINS/TCP header level.
    #[error("Head status error 0x{code:02X}: {description}")]
    HeadStatus {
        /// Raw head status code.
        code: u8,
        /// Human-readable description of the code.
        description: &'static str,
    },

    /// The PLC returned a non-success end code.
    #[error("{0}")]
    EndCode(FinsStatus),

    /// The node handshake was refused by the peer.
    #[error("Handshake refused: main code 0x{main_code:02X}, sub code 0x{sub_code:02X}")]
    Handshake {
        /// Status byte of the handshake response.
        main_code: u8,
        /// Byte adjacent to the status byte.
        sub_code: u8,
    },

    /// A bit address string was not of the form `word.bit`.
    #[error("Invalid address '{input}': {reason}")]
    AddressFormat {
        /// The offending input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Invalid memory addressing.
    #[error("Invalid addressing: {reason}")]
    InvalidAddressing {
        /// Description of the addressing error.
        reason: String,
    },

    /// Invalid parameter provided.
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the invalid parameter.
        parameter: String,
        /// Description of why the parameter is invalid.
        reason: String,
    },

    /// An operation was attempted before a successful handshake.
    #[error("Not connected: no node identity has been negotiated")]
    NotConnected,

    /// A previous exchange was interrupted; request/response alignment is lost.
    #[error("Connection desynchronized: reconnect before issuing further requests")]
    Desynchronized,
}

impl FinsError {
    /// Creates a new `Transport` error without an underlying I/O cause.
    ///
    /// # Example
    ///
    /// ```
    /// use omron_fins_tcp::FinsError;
    ///
    /// let err = FinsError::transport("host unreachable");
    /// assert!(!err.is_recoverable());
    /// ```
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
            source: None,
        }
    }

    /// Creates a new `Transport` error wrapping an I/O error.
    pub fn transport_io(reason: impl Into<String>, source: io::Error) -> Self {
        Self::Transport {
            reason: reason.into(),
            source: Some(source),
        }
    }

    /// Creates a new `ProtocolFraming` error.
    ///
    /// # Example
    ///
    /// ```
    /// use omron_fins_tcp::FinsError;
    ///
    /// let err = FinsError::framing("expected 24 bytes, got 20");
    /// assert_eq!(err.to_string(), "Protocol framing error: expected 24 bytes, got 20");
    /// ```
    pub fn framing(reason: impl Into<String>) -> Self {
        Self::ProtocolFraming {
            reason: reason.into(),
        }
    }

    /// Creates a new `AddressFormat` error.
    pub fn address_format(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AddressFormat {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `InvalidAddressing` error.
    pub fn invalid_addressing(reason: impl Into<String>) -> Self {
        Self::InvalidAddressing {
            reason: reason.into(),
        }
    }

    /// Creates a new `InvalidParameter` error.
    ///
    /// # Example
    ///
    /// ```
    /// use omron_fins_tcp::FinsError;
    ///
    /// let err = FinsError::invalid_parameter("count", "must be greater than 0");
    /// ```
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Main code of the error.
    ///
    /// For end-code and handshake errors this is the byte reported by the peer,
    /// for head status errors the head status code. Locally detected errors
    /// report `0`.
    pub fn main_code(&self) -> u8 {
        match self {
            Self::EndCode(status) => status.main_code,
            Self::Handshake { main_code, .. } => *main_code,
            Self::HeadStatus { code, .. } => *code,
            _ => 0,
        }
    }

    /// Sub code of the error, `0` when the peer did not report one.
    pub fn sub_code(&self) -> u8 {
        match self {
            Self::EndCode(status) => status.sub_code,
            Self::Handshake { sub_code, .. } => *sub_code,
            _ => 0,
        }
    }

    /// Human-readable description of the error.
    pub fn description(&self) -> String {
        match self {
            Self::EndCode(status) => status.description.to_string(),
            Self::HeadStatus { description, .. } => (*description).to_string(),
            Self::Handshake { main_code, .. } => head_status_description(*main_code).to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the connection can keep being used after this error.
    ///
    /// Only the (0x00, 0x40) end code is recoverable, and that code is reported
    /// as a warning on [`Reply`](crate::Reply) rather than as an error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::EndCode(status) if status.recoverable)
    }

    /// Whether the error leaves the connection unusable.
    pub(crate) fn tears_down_connection(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::ProtocolFraming { .. }
                | Self::HeadStatus { .. }
                | Self::Desynchronized
        )
    }
}
