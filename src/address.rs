use core::{
    fmt::{Display, Formatter, Result as FmtResult},
    ops::{Deref, DerefMut},
    str::FromStr,
};

/// The three recognized sensor models, keyed by the address family code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Model {
    Ds18s20,
    Ds1822,
    Ds18b20,
}

impl Model {
    pub fn from_family_code(code: u8) -> Option<Self> {
        match code {
            0x10 => Some(Model::Ds18s20),
            0x22 => Some(Model::Ds1822),
            0x28 => Some(Model::Ds18b20),
            _ => None,
        }
    }

    pub const fn family_code(self) -> u8 {
        match self {
            Model::Ds18s20 => 0x10,
            Model::Ds1822 => 0x22,
            Model::Ds18b20 => 0x28,
        }
    }

    /// The DS18S20 is hard-wired to 9 bits and has no configuration register
    pub const fn fixed_resolution(self) -> bool {
        matches!(self, Model::Ds18s20)
    }

    pub const fn has_configuration_register(self) -> bool {
        !self.fixed_resolution()
    }
}

#[derive(Debug, Clone, Copy, PartialOrd, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct Address {
    raw: [u8; Self::BYTES as usize],
}

impl Default for Address {
    fn default() -> Self {
        Self::from([0; Self::BYTES as usize])
    }
}

impl From<[u8; Self::BYTES as usize]> for Address {
    fn from(raw: [u8; Self::BYTES as usize]) -> Self {
        Address { raw }
    }
}

impl From<Address> for [u8; Address::BYTES as usize] {
    fn from(addr: Address) -> [u8; Address::BYTES as usize] {
        addr.raw
    }
}

impl Deref for Address {
    type Target = [u8; Self::BYTES as usize];

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

impl DerefMut for Address {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.raw
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        self.deref() as _
    }
}

impl AsMut<[u8]> for Address {
    fn as_mut(&mut self) -> &mut [u8] {
        self.deref_mut() as _
    }
}

impl Address {
    /// The length of device address in bytes
    pub const BYTES: u8 = 8;

    pub fn family_code(&self) -> u8 {
        self[0]
    }

    /// Model behind the family code, `None` for codes this crate does not manage
    pub fn model(&self) -> Option<Model> {
        Model::from_family_code(self.family_code())
    }

    /// Whether byte 7 matches the CRC over bytes 0..=6.
    ///
    /// Addresses failing this are phantoms born of line noise during the
    /// search and are rejected at discovery.
    pub fn is_valid(&self) -> bool {
        super::compute_partial_crc8(0, &self[..7]) == self[7]
    }
}

/// Error type
#[derive(Debug)]
pub enum AddressError {
    NotEnough,
    Invalid,
}

fn hex_to_u8(c: char) -> Option<u8> {
    if c.is_ascii_digit() {
        Some((c as u32 - '0' as u32) as _)
    } else if ('a'..='f').contains(&c) {
        Some((c as u32 - 'a' as u32 + 10) as _)
    } else if ('A'..='F').contains(&c) {
        Some((c as u32 - 'A' as u32 + 10) as _)
    } else {
        None
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut addr = Address::default();
        let mut chars = s.chars().filter(|c| !c.is_whitespace() && *c != ':');

        for i in 0..Self::BYTES as usize {
            match (chars.next(), chars.next()) {
                (Some(h), Some(l)) => match (hex_to_u8(h), hex_to_u8(l)) {
                    (Some(h), Some(l)) => {
                        addr[i] = (h << 4) | l;
                    }
                    _ => return Err(AddressError::Invalid),
                },
                _ => return Err(AddressError::NotEnough),
            }
        }

        Ok(addr)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self[0], self[1], self[2], self[3], self[4], self[5], self[6], self[7],
        )
    }
}
