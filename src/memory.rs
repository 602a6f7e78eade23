//! Memory area definitions for the FINS protocol.
//!
//! This module defines the [`MemoryArea`] enum, which names the PLC memory
//! regions reachable by this client, and [`AccessGranularity`], which selects
//! between bit and word access. Together they select exactly one FINS area
//! code from the table below.
//!
//! | Area | Description | Bit code | Word code |
//! |------|-------------|:--------:|:---------:|
//! | CIO | Core I/O - inputs, outputs, internal relays | 0x30 | 0xB0 |
//! | WR | Work area - temporary work bits/words | 0x31 | 0xB1 |
//! | HR | Holding area - retentive bits/words | 0x32 | 0xB2 |
//! | AR | Auxiliary Relay - system status/control | 0x33 | 0xB3 |
//! | DM | Data Memory - numeric data storage | 0x02 | 0x82 |
//!
//! # Example
//!
//! ```
//! use omron_fins_tcp::{AccessGranularity, MemoryArea};
//!
//! assert_eq!(MemoryArea::DM.code(AccessGranularity::Word), 0x82);
//! assert_eq!(MemoryArea::CIO.code(AccessGranularity::Bit), 0x30);
//!
//! let area: MemoryArea = "hr".parse().unwrap();
//! assert_eq!(area, MemoryArea::HR);
//! assert!("XX".parse::<MemoryArea>().is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{FinsError, Result};

/// Memory areas available in Omron PLCs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemoryArea {
    /// CIO (Core I/O) area - general purpose I/O and internal relays.
    CIO,
    /// WR (Work) area - work bits/words.
    WR,
    /// HR (Holding) area - holding bits/words that retain values.
    HR,
    /// AR (Auxiliary Relay) area - system status and control bits/words.
    AR,
    /// DM (Data Memory) area - numeric data storage.
    DM,
}

/// Whether a command addresses single bits or whole words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessGranularity {
    /// Single bit access; the address carries a bit index.
    Bit,
    /// 16-bit word access.
    Word,
}

impl MemoryArea {
    /// All memory areas, in table order.
    pub const ALL: [MemoryArea; 5] = [
        MemoryArea::CIO,
        MemoryArea::WR,
        MemoryArea::HR,
        MemoryArea::AR,
        MemoryArea::DM,
    ];

    /// Returns the FINS area code for this area at the given granularity.
    pub fn code(self, granularity: AccessGranularity) -> u8 {
        match (self, granularity) {
            (MemoryArea::CIO, AccessGranularity::Bit) => 0x30,
            (MemoryArea::WR, AccessGranularity::Bit) => 0x31,
            (MemoryArea::HR, AccessGranularity::Bit) => 0x32,
            (MemoryArea::AR, AccessGranularity::Bit) => 0x33,
            (MemoryArea::DM, AccessGranularity::Bit) => 0x02,
            (MemoryArea::CIO, AccessGranularity::Word) => 0xB0,
            (MemoryArea::WR, AccessGranularity::Word) => 0xB1,
            (MemoryArea::HR, AccessGranularity::Word) => 0xB2,
            (MemoryArea::AR, AccessGranularity::Word) => 0xB3,
            (MemoryArea::DM, AccessGranularity::Word) => 0x82,
        }
    }

    /// Looks up the area and granularity a raw FINS area code stands for.
    ///
    /// # Errors
    ///
    /// Returns `FinsError::InvalidAddressing` for codes outside the table.
    ///
    /// # Example
    ///
    /// ```
    /// use omron_fins_tcp::{AccessGranularity, MemoryArea};
    ///
    /// let (area, granularity) = MemoryArea::from_code(0xB2).unwrap();
    /// assert_eq!(area, MemoryArea::HR);
    /// assert_eq!(granularity, AccessGranularity::Word);
    /// assert!(MemoryArea::from_code(0x99).is_err());
    /// ```
    pub fn from_code(code: u8) -> Result<(MemoryArea, AccessGranularity)> {
        for area in Self::ALL {
            for granularity in [AccessGranularity::Bit, AccessGranularity::Word] {
                if area.code(granularity) == code {
                    return Ok((area, granularity));
                }
            }
        }
        Err(FinsError::invalid_addressing(format!(
            "unknown memory area code 0x{:02X}",
            code
        )))
    }
}

impl FromStr for MemoryArea {
    type Err = FinsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CIO" => Ok(MemoryArea::CIO),
            "WR" | "W" => Ok(MemoryArea::WR),
            "HR" | "H" => Ok(MemoryArea::HR),
            "AR" | "A" => Ok(MemoryArea::AR),
            "DM" | "D" => Ok(MemoryArea::DM),
            _ => Err(FinsError::invalid_addressing(format!(
                "unknown memory area '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for MemoryArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryArea::CIO => write!(f, "CIO"),
            MemoryArea::WR => write!(f, "WR"),
            MemoryArea::HR => write!(f, "HR"),
            MemoryArea::AR => write!(f, "AR"),
            MemoryArea::DM => write!(f, "DM"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_codes() {
        assert_eq!(MemoryArea::CIO.code(AccessGranularity::Word), 0xB0);
        assert_eq!(MemoryArea::WR.code(AccessGranularity::Word), 0xB1);
        assert_eq!(MemoryArea::HR.code(AccessGranularity::Word), 0xB2);
        assert_eq!(MemoryArea::AR.code(AccessGranularity::Word), 0xB3);
        assert_eq!(MemoryArea::DM.code(AccessGranularity::Word), 0x82);
    }

    #[test]
    fn test_bit_codes() {
        assert_eq!(MemoryArea::CIO.code(AccessGranularity::Bit), 0x30);
        assert_eq!(MemoryArea::WR.code(AccessGranularity::Bit), 0x31);
        assert_eq!(MemoryArea::HR.code(AccessGranularity::Bit), 0x32);
        assert_eq!(MemoryArea::AR.code(AccessGranularity::Bit), 0x33);
        assert_eq!(MemoryArea::DM.code(AccessGranularity::Bit), 0x02);
    }

    #[test]
    fn test_codes_are_distinct() {
        let mut codes: Vec<u8> = MemoryArea::ALL
            .iter()
            .flat_map(|a| [a.code(AccessGranularity::Bit), a.code(AccessGranularity::Word)])
            .collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 10);
    }

    #[test]
    fn test_from_code_inverts_table() {
        for area in MemoryArea::ALL {
            for granularity in [AccessGranularity::Bit, AccessGranularity::Word] {
                assert_eq!(
                    MemoryArea::from_code(area.code(granularity)).unwrap(),
                    (area, granularity)
                );
            }
        }
        assert!(MemoryArea::from_code(0x00).is_err());
        assert!(MemoryArea::from_code(0xB4).is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_area() {
        assert_eq!("DM".parse::<MemoryArea>().unwrap(), MemoryArea::DM);
        assert_eq!(" cio ".parse::<MemoryArea>().unwrap(), MemoryArea::CIO);
        assert!("EM".parse::<MemoryArea>().is_err());
        assert!("".parse::<MemoryArea>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(MemoryArea::CIO.to_string(), "CIO");
        assert_eq!(MemoryArea::WR.to_string(), "WR");
        assert_eq!(MemoryArea::HR.to_string(), "HR");
        assert_eq!(MemoryArea::AR.to_string(), "AR");
        assert_eq!(MemoryArea::DM.to_string(), "DM");
    }
}
