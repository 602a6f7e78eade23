//! Translation of the two status fields carried by every FINS/TCP response.
//!
//! A response can be rejected at two independent levels:
//!
//! | Field | Offset | Level | Outcome when non-zero |
//! |-------|--------|-------|-----------------------|
//! | Head status | 8–15 | FINS/TCP framing | always fatal |
//! | End code | 28–29 | FINS command execution | fatal, except (0x00, 0x40) |
//!
//! The head status is checked first; the end code is only inspected once the
//! frame itself has been accepted by the peer.
//!
//! Both checks are pure: they never perform I/O and always give the same
//! answer for the same bytes.
//!
//! # Example
//!
//! ```
//! use omron_fins_tcp::status::{classify_end_code, Classification};
//!
//! assert_eq!(classify_end_code(0x00, 0x00), Classification::Success);
//! assert!(matches!(classify_end_code(0x00, 0x40), Classification::Warning(_)));
//!
//! match classify_end_code(0x11, 0x04) {
//!     Classification::Fatal(status) => {
//!         assert_eq!(status.description, "parameter error: address range designation error");
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

use std::fmt;

use crate::error::{FinsError, Result};

/// FINS/TCP frame command carrying a FINS frame.
pub const FRAME_COMMAND_FINS: u8 = 0x02;

/// The only end code that does not abort an operation.
pub const RECOVERABLE_END_CODE: (u8, u8) = (0x00, 0x40);

const RELAY_ERROR_FLAG: u8 = 0x80;
const FATAL_CPU_ERROR_FLAG: u8 = 0x80;
const NON_FATAL_CPU_ERROR_FLAG: u8 = 0x40;

/// A translated end code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FinsStatus {
    /// Main response code as received (flags included).
    pub main_code: u8,
    /// Sub response code as received (flags included).
    pub sub_code: u8,
    /// Human-readable description from the end code table.
    pub description: &'static str,
    /// Whether the operation result is still usable.
    pub recoverable: bool,
}

impl fmt::Display for FinsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "End code 0x{:02X}/0x{:02X}: {}",
            self.main_code, self.sub_code, self.description
        )
    }
}

/// Outcome of inspecting an end code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Normal completion.
    Success,
    /// Non-fatal alarm; the response payload is still valid.
    Warning(FinsStatus),
    /// The command was not executed.
    Fatal(FinsStatus),
}

/// Checks the FINS/TCP header fields of a response.
///
/// `frame_command` is the byte at offset 11 and `error_code` the big-endian
/// field at offsets 12–15.
///
/// # Errors
///
/// Returns `FinsError::HeadStatus` if the peer reported a header level error or
/// answered with anything other than a FINS frame.
///
/// # Example
///
/// ```
/// use omron_fins_tcp::status::check_head_status;
///
/// assert!(check_head_status(0x02, 0).is_ok());
/// assert!(check_head_status(0x02, 0x03).is_err());
/// assert!(check_head_status(0x01, 0).is_err());
/// ```
pub fn check_head_status(frame_command: u8, error_code: u32) -> Result<()> {
    if error_code != 0 {
        let code = error_code.to_be_bytes()[3];
        let description = match u8::try_from(error_code) {
            Ok(known) => head_status_description(known),
            Err(_) => "unknown head status",
        };
        return Err(FinsError::HeadStatus { code, description });
    }
    if frame_command != FRAME_COMMAND_FINS {
        return Err(FinsError::HeadStatus {
            code: frame_command,
            description: "unexpected FINS/TCP frame command",
        });
    }
    Ok(())
}

/// Describes a FINS/TCP header error code.
pub fn head_status_description(code: u8) -> &'static str {
    match code {
        0x00 => "normal",
        0x01 => "header is not 'FINS'",
        0x02 => "data length too long",
        0x03 => "command not supported",
        0x20 => "all connections are in use",
        0x21 => "the specified node is already connected",
        0x22 => "attempt to access a protected node from an unspecified IP address",
        0x23 => "the client FINS node address is out of range",
        0x24 => "the same FINS node address is used by the client and server",
        0x25 => "all the node addresses available for allocation have been used",
        _ => "unknown head status",
    }
}

/// Classifies an end code pair.
pub fn classify_end_code(main_code: u8, sub_code: u8) -> Classification {
    if (main_code, sub_code) == (0x00, 0x00) {
        return Classification::Success;
    }
    let status = translate_end_code(main_code, sub_code);
    if status.recoverable {
        Classification::Warning(status)
    } else {
        Classification::Fatal(status)
    }
}

/// Translates an end code pair into a [`FinsStatus`].
///
/// The relay error flag (bit 7 of the main code) and the PLC error flags
/// (bits 6–7 of the sub code) are masked off before the table lookup.
pub fn translate_end_code(main_code: u8, sub_code: u8) -> FinsStatus {
    let main = main_code & !RELAY_ERROR_FLAG;
    let sub = sub_code & !(FATAL_CPU_ERROR_FLAG | NON_FATAL_CPU_ERROR_FLAG);

    let description = if (main, sub) == (0x00, 0x00) {
        if sub_code & FATAL_CPU_ERROR_FLAG != 0 {
            "fatal CPU unit error"
        } else if sub_code & NON_FATAL_CPU_ERROR_FLAG != 0 {
            "non-fatal CPU unit error (continuable)"
        } else if main_code & RELAY_ERROR_FLAG != 0 {
            "relay error"
        } else {
            "normal completion"
        }
    } else {
        end_code_description(main, sub)
    };

    FinsStatus {
        main_code,
        sub_code,
        description,
        recoverable: (main_code, sub_code) == RECOVERABLE_END_CODE,
    }
}

fn end_code_description(main: u8, sub: u8) -> &'static str {
    match (main, sub) {
        (0x00, 0x01) => "service canceled",

        (0x01, 0x01) => "local node error: local node not in network",
        (0x01, 0x02) => "local node error: token timeout",
        (0x01, 0x03) => "local node error: retries failed",
        (0x01, 0x04) => "local node error: too many send frames",
        (0x01, 0x05) => "local node error: node address range error",
        (0x01, 0x06) => "local node error: node address duplication",
        (0x01, _) => "local node error",

        (0x02, 0x01) => "destination node error: destination node not in network",
        (0x02, 0x02) => "destination node error: unit missing",
        (0x02, 0x03) => "destination node error: third node missing",
        (0x02, 0x04) => "destination node error: destination node busy",
        (0x02, 0x05) => "destination node error: response timeout",
        (0x02, _) => "destination node error",

        (0x03, 0x01) => "communications controller error: communications controller error",
        (0x03, 0x02) => "communications controller error: CPU unit error",
        (0x03, 0x03) => "communications controller error: controller error",
        (0x03, 0x04) => "communications controller error: unit number error",
        (0x03, _) => "communications controller error",

        (0x04, 0x01) => "not executable: undefined command",
        (0x04, 0x02) => "not executable: not supported by model/version",
        (0x04, _) => "not executable",

        (0x05, 0x01) => "routing error: destination address setting error",
        (0x05, 0x02) => "routing error: no routing tables",
        (0x05, 0x03) => "routing error: routing table error",
        (0x05, 0x04) => "routing error: too many relays",
        (0x05, _) => "routing error",

        (0x10, 0x01) => "command format error: command too long",
        (0x10, 0x02) => "command format error: command too short",
        (0x10, 0x03) => "command format error: elements/data don't match",
        (0x10, 0x04) => "command format error: command format error",
        (0x10, 0x05) => "command format error: header error",
        (0x10, _) => "command format error",

        (0x11, 0x01) => "parameter error: area classification missing",
        (0x11, 0x02) => "parameter error: access size error",
        (0x11, 0x03) => "parameter error: address range exceeded",
        (0x11, 0x04) => "parameter error: address range designation error",
        (0x11, 0x06) => "parameter error: program missing",
        (0x11, 0x09) => "parameter error: relational error",
        (0x11, 0x0A) => "parameter error: duplicate data access",
        (0x11, 0x0B) => "parameter error: response too long",
        (0x11, 0x0C) => "parameter error: parameter error",
        (0x11, _) => "parameter error",

        (0x20, 0x02) => "read not possible: protected",
        (0x20, 0x03) => "read not possible: table missing",
        (0x20, 0x04) => "read not possible: data missing",
        (0x20, 0x05) => "read not possible: program missing",
        (0x20, 0x06) => "read not possible: file missing",
        (0x20, 0x07) => "read not possible: data mismatch",
        (0x20, _) => "read not possible",

        (0x21, 0x01) => "write not possible: read-only",
        (0x21, 0x02) => "write not possible: protected",
        (0x21, 0x03) => "write not possible: cannot register",
        (0x21, 0x05) => "write not possible: program missing",
        (0x21, 0x06) => "write not possible: file missing",
        (0x21, 0x07) => "write not possible: file name already exists",
        (0x21, 0x08) => "write not possible: cannot change",
        (0x21, _) => "write not possible",

        (0x22, 0x01) => "mode error: not possible during execution",
        (0x22, 0x02) => "mode error: not possible while running",
        (0x22, 0x03) => "mode error: wrong PLC mode (program)",
        (0x22, 0x04) => "mode error: wrong PLC mode (debug)",
        (0x22, 0x05) => "mode error: wrong PLC mode (monitor)",
        (0x22, 0x06) => "mode error: wrong PLC mode (run)",
        (0x22, 0x07) => "mode error: specified node not polling node",
        (0x22, 0x08) => "mode error: step cannot be executed",
        (0x22, _) => "mode error",

        (0x23, 0x01) => "unit error: file device missing",
        (0x23, 0x02) => "unit error: memory missing",
        (0x23, 0x03) => "unit error: clock missing",
        (0x23, _) => "unit error",

        (0x24, 0x01) => "start/stop not possible: table missing",
        (0x24, _) => "start/stop not possible",

        (0x25, 0x02) => "unit error: memory error",
        (0x25, 0x03) => "unit error: I/O setting error",
        (0x25, 0x04) => "unit error: too many I/O points",
        (0x25, 0x05) => "unit error: CPU bus error",
        (0x25, 0x06) => "unit error: I/O duplication",
        (0x25, 0x07) => "unit error: I/O bus error",
        (0x25, 0x09) => "unit error: SYSMAC BUS/2 error",
        (0x25, 0x0A) => "unit error: CPU bus unit error",
        (0x25, 0x0D) => "unit error: SYSMAC BUS number duplication",
        (0x25, 0x0F) => "unit error: memory error",
        (0x25, 0x10) => "unit error: SYSMAC BUS terminator missing",
        (0x25, _) => "unit error",

        (0x26, 0x01) => "command error: no protection",
        (0x26, 0x02) => "command error: incorrect password",
        (0x26, 0x04) => "command error: protected",
        (0x26, 0x05) => "command error: service already executing",
        (0x26, 0x06) => "command error: service stopped",
        (0x26, 0x07) => "command error: no execution right",
        (0x26, 0x08) => "command error: settings not complete",
        (0x26, 0x09) => "command error: necessary items not set",
        (0x26, 0x0A) => "command error: number already defined",
        (0x26, 0x0B) => "command error: error will not clear",
        (0x26, _) => "command error",

        (0x30, 0x01) => "access right error: no access right",
        (0x30, _) => "access right error",

        (0x40, 0x01) => "abort: service aborted",
        (0x40, _) => "abort",

        _ => "unknown error",
    }
}
