/// A temperature in hundredths of a degree Celsius.
///
/// Fixed point keeps statistics arithmetic exact on targets without an FPU;
/// float views are derived on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature(i16);

impl Temperature {
    /// Sentinel reported when a device is absent or a read fails its CRC.
    ///
    /// -127 °C sits outside the -55..=125 °C range of every supported model,
    /// so it can never collide with a genuine reading.
    pub const DISCONNECTED: Temperature = Temperature(-12700);

    pub const fn from_centi_celsius(centi: i16) -> Self {
        Temperature(centi)
    }

    pub(crate) fn from_centi_saturating(centi: i32) -> Self {
        Temperature(centi.clamp(i16::MIN as i32, i16::MAX as i32) as i16)
    }

    pub const fn centi_celsius(self) -> i16 {
        self.0
    }

    /// Hundredths of a degree Fahrenheit, truncating
    pub fn centi_fahrenheit(self) -> i16 {
        Self::from_centi_saturating(self.0 as i32 * 9 / 5 + 3200).0
    }

    pub fn degrees_c(self) -> f32 {
        self.0 as f32 / 100.0
    }

    pub fn degrees_f(self) -> f32 {
        to_fahrenheit(self.degrees_c())
    }

    pub const fn is_disconnected(self) -> bool {
        self.0 == Self::DISCONNECTED.0
    }
}

pub fn to_fahrenheit(celsius: f32) -> f32 {
    celsius * 1.8 + 32.0
}

pub fn to_celsius(fahrenheit: f32) -> f32 {
    (fahrenheit - 32.0) / 1.8
}
