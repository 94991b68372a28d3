#![no_std]
#![doc = include_str!("../README.md")]

mod address;
mod command;
mod driver;
mod registry;
mod resolution;
mod result;
mod scratchpad;
mod sensor;
mod temperature;
mod transport;

#[cfg(test)]
pub(crate) mod fake;

pub use address::{Address, AddressError, Model};
pub use command::{Command, OpCode};
pub use driver::Driver;
pub use registry::{Registry, MAX_DEVICES};
pub use resolution::Resolution;
pub use result::Error;
pub use scratchpad::Scratchpad;
pub use sensor::{SensorRecord, AVG_READINGS_CEILING};
pub use temperature::{to_celsius, to_fahrenheit, Temperature};
pub use transport::BusTransport;

/// Maxim 8-bit CRC (polynomial 0x8C), continued from a previous partial value
pub fn compute_partial_crc8(crc: u8, data: &[u8]) -> u8 {
    let mut crc = crc;
    for byte in data.iter() {
        let mut byte = *byte;
        for _ in 0..8 {
            let mix = (crc ^ byte) & 0x01;
            crc >>= 1;
            if mix != 0x00 {
                crc ^= 0x8C;
            }
            byte >>= 1;
        }
    }
    crc
}
