use byteorder::{ByteOrder, LittleEndian};

use crate::{Model, Resolution, Temperature};

/// The 9-byte in-device register image.
///
/// Always read fresh off the line; never cached between operations.
///
/// Field layout:
///
/// | byte | DS18B20 / DS1822       | DS18S20            |
/// |------|------------------------|--------------------|
/// | 0    | temperature LSB        | temperature LSB    |
/// | 1    | temperature MSB        | temperature MSB    |
/// | 2    | high alarm threshold   | high alarm         |
/// | 3    | low alarm threshold    | low alarm          |
/// | 4    | configuration register | reserved           |
/// | 5    | internal               | internal           |
/// | 6    | reserved               | count remain       |
/// | 7    | reserved               | count per degree C |
/// | 8    | CRC over bytes 0..=7   | CRC                |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Scratchpad {
    raw: [u8; Self::BYTES],
}

const TEMP_LSB: usize = 0;
const TEMP_MSB: usize = 1;
const ALARM_HIGH: usize = 2;
const ALARM_LOW: usize = 3;
const CONFIGURATION: usize = 4;
const COUNT_REMAIN: usize = 6;
const COUNT_PER_C: usize = 7;
const CRC: usize = 8;

impl From<[u8; Self::BYTES]> for Scratchpad {
    fn from(raw: [u8; Self::BYTES]) -> Self {
        Scratchpad { raw }
    }
}

impl Scratchpad {
    pub const BYTES: usize = 9;

    pub fn as_bytes(&self) -> &[u8; Self::BYTES] {
        &self.raw
    }

    pub fn alarm_high(&self) -> u8 {
        self.raw[ALARM_HIGH]
    }

    pub fn alarm_low(&self) -> u8 {
        self.raw[ALARM_LOW]
    }

    pub fn configuration(&self) -> u8 {
        self.raw[CONFIGURATION]
    }

    pub fn count_remain(&self) -> u8 {
        self.raw[COUNT_REMAIN]
    }

    pub fn count_per_c(&self) -> u8 {
        self.raw[COUNT_PER_C]
    }

    pub fn crc(&self) -> u8 {
        self.raw[CRC]
    }

    pub fn set_alarm_high(&mut self, value: u8) {
        self.raw[ALARM_HIGH] = value;
    }

    pub fn set_alarm_low(&mut self, value: u8) {
        self.raw[ALARM_LOW] = value;
    }

    pub fn set_configuration(&mut self, value: u8) {
        self.raw[CONFIGURATION] = value;
    }

    /// Whether the trailing CRC matches bytes 0..=7.
    ///
    /// A mismatch means the transfer was corrupted or nothing answered the
    /// read; the device is treated as disconnected for that call.
    pub fn crc_valid(&self) -> bool {
        crate::compute_partial_crc8(0, &self.raw[..CRC]) == self.crc()
    }

    /// Signed raw reading, temperature MSB:LSB
    pub fn raw_temperature(&self) -> i16 {
        LittleEndian::read_i16(&self.raw[TEMP_LSB..=TEMP_MSB])
    }

    /// Resolution encoded in the configuration register.
    ///
    /// The DS18S20 overloads that byte position for calibration and is
    /// always 9 bits.
    pub fn resolution(&self, model: Model) -> Option<Resolution> {
        if model.fixed_resolution() {
            Some(Resolution::Bits9)
        } else {
            Resolution::from_config(self.configuration())
        }
    }

    /// Decodes the raw reading into hundredths of a degree Celsius.
    ///
    /// DS18B20/DS1822 count 1/16 °C per LSB; at reduced resolution the low
    /// bits are undefined and get masked off before scaling, so each dropped
    /// bit doubles the unit step. The DS18S20 counts 1/2 °C per LSB and
    /// carries calibration counters for the manufacturer's extended
    /// resolution formula:
    ///
    /// ```text
    /// temperature = temp_read - 0.25 + (count_per_c - count_remain) / count_per_c
    /// ```
    ///
    /// where `temp_read` is the raw value with the half-degree bit dropped.
    pub fn temperature(&self, model: Model) -> Temperature {
        let raw = self.raw_temperature() as i32;
        let centi = match model {
            Model::Ds18b20 | Model::Ds1822 => {
                let shift = self
                    .resolution(model)
                    .unwrap_or(Resolution::Bits12)
                    .shift();
                (((raw >> shift) << shift) * 100) >> 4
            }
            Model::Ds18s20 => {
                let per_c = self.count_per_c() as i32;
                if per_c == 0 {
                    // corrupt calibration byte; fall back to half-degree steps
                    raw * 50
                } else {
                    let remain = self.count_remain() as i32;
                    (raw >> 1) * 100 - 25 + (per_c - remain) * 100 / per_c
                }
            }
        };
        Temperature::from_centi_saturating(centi)
    }
}
