/// Conversion resolution, 9 to 12 bits.
///
/// Discriminants are the configuration register encodings. The ordering
/// follows bit depth, so `max` picks the slowest resolution of a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Resolution {
    Bits9 = 0x1F,
    Bits10 = 0x3F,
    Bits11 = 0x5F,
    Bits12 = 0x7F,
}

impl Resolution {
    pub const fn bits(self) -> u8 {
        match self {
            Resolution::Bits9 => 9,
            Resolution::Bits10 => 10,
            Resolution::Bits11 => 11,
            Resolution::Bits12 => 12,
        }
    }

    /// Configuration register encoding
    pub const fn config_byte(self) -> u8 {
        self as u8
    }

    pub fn from_config(byte: u8) -> Option<Self> {
        match byte {
            0x1F => Some(Resolution::Bits9),
            0x3F => Some(Resolution::Bits10),
            0x5F => Some(Resolution::Bits11),
            0x7F => Some(Resolution::Bits12),
            _ => None,
        }
    }

    /// Requested bit count clamped into the supported 9..=12 range
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            0..=9 => Resolution::Bits9,
            10 => Resolution::Bits10,
            11 => Resolution::Bits11,
            _ => Resolution::Bits12,
        }
    }

    /// Number of undefined low bits in the raw reading at this resolution
    pub const fn shift(self) -> u8 {
        12 - self.bits()
    }

    /// Worst-case conversion time from the datasheet
    pub const fn time_ms(self) -> u16 {
        match self {
            Resolution::Bits9 => 94,
            Resolution::Bits10 => 188,
            Resolution::Bits11 => 375,
            Resolution::Bits12 => 750,
        }
    }
}
