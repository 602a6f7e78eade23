//! REAL (IEEE-754 single precision) values stored in two PLC words.
//!
//! The two words of a REAL are not stored in network order. Omron CPUs keep
//! the low-order word at the lower address; some gateways instead present the
//! four bytes fully reversed. [`RealLayout`] selects how the pair is read and
//! written, and every layout round-trips exactly.
//!
//! # Example
//!
//! ```
//! use omron_fins_tcp::RealLayout;
//!
//! let words = RealLayout::WordSwapped.encode(3.14159);
//! assert_eq!(words, [0x0FD0, 0x4049]);
//! assert_eq!(RealLayout::WordSwapped.decode(words), 3.14159);
//! ```

/// Word and byte order of a REAL held in two consecutive words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RealLayout {
    /// Low-order word first, each word big-endian (Omron CJ/CS/NJ memory layout).
    #[default]
    WordSwapped,
    /// Bytes reversed within each word, then the two words swapped: the four
    /// wire bytes are the value's little-endian representation.
    ByteReversed,
}

impl RealLayout {
    /// Splits a value into the two words written at the start address and the
    /// one after it.
    pub fn encode(self, value: f32) -> [i16; 2] {
        match self {
            RealLayout::WordSwapped => {
                let [a, b, c, d] = value.to_be_bytes();
                [i16::from_be_bytes([c, d]), i16::from_be_bytes([a, b])]
            }
            RealLayout::ByteReversed => {
                let [a, b, c, d] = value.to_le_bytes();
                [i16::from_be_bytes([a, b]), i16::from_be_bytes([c, d])]
            }
        }
    }

    /// Rebuilds a value from the words at the start address and the one after it.
    pub fn decode(self, words: [i16; 2]) -> f32 {
        let [w0_high, w0_low] = words[0].to_be_bytes();
        let [w1_high, w1_low] = words[1].to_be_bytes();
        match self {
            RealLayout::WordSwapped => f32::from_be_bytes([w1_high, w1_low, w0_high, w0_low]),
            RealLayout::ByteReversed => {
                // swap bytes within each word, then swap the words
                f32::from_be_bytes([w1_low, w1_high, w0_low, w0_high])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_swapped_layout() {
        // 3.14159f32 = 0x40490FD0
        assert_eq!(RealLayout::WordSwapped.encode(3.14159), [0x0FD0, 0x4049]);
        assert_eq!(RealLayout::WordSwapped.decode([0x0FD0, 0x4049]), 3.14159);
    }

    #[test]
    fn test_byte_reversed_layout() {
        // wire bytes D0 0F 49 40
        let words = RealLayout::ByteReversed.encode(3.14159);
        assert_eq!(words, [i16::from_be_bytes([0xD0, 0x0F]), 0x4940]);
        assert_eq!(RealLayout::ByteReversed.decode(words), 3.14159);
    }

    #[test]
    fn test_layouts_round_trip() {
        for layout in [RealLayout::WordSwapped, RealLayout::ByteReversed] {
            for value in [3.14f32, 0.0, -1.5, f32::MAX, f32::MIN_POSITIVE, -273.15] {
                assert_eq!(layout.decode(layout.encode(value)), value, "{:?}", layout);
            }
        }
    }

    #[test]
    fn test_layouts_differ() {
        assert_ne!(
            RealLayout::WordSwapped.encode(3.14),
            RealLayout::ByteReversed.encode(3.14)
        );
    }

    #[test]
    fn test_default_layout() {
        assert_eq!(RealLayout::default(), RealLayout::WordSwapped);
    }
}
