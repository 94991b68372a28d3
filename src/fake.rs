//! Simulated bus transport for the unit tests: a handful of scripted
//! devices behind the [`BusTransport`] contract, plus a delay spy that
//! records requested time instead of sleeping.

use core::convert::Infallible;

use embedded_hal::delay::DelayUs;
use heapless::Vec;

use crate::{compute_partial_crc8, Address, BusTransport, Scratchpad};

/// Well-formed address: `family`, a serial containing `serial`, CRC in byte 7
pub fn address(family: u8, serial: u8) -> Address {
    let mut raw = [family, serial, 0x8F, 0xF9, 0x08, 0x00, 0x01, 0x00];
    raw[7] = compute_partial_crc8(0, &raw[..7]);
    Address::from(raw)
}

/// Address with a deliberately wrong CRC byte
pub fn bogus_address(family: u8, serial: u8) -> Address {
    let mut addr = address(family, serial);
    addr[7] ^= 0x5A;
    addr
}

#[derive(Clone, Debug)]
pub struct FakeDevice {
    pub address: Address,
    pub scratchpad: [u8; Scratchpad::BYTES],
    pub parasite: bool,
    pub present: bool,
    /// Serve a flipped CRC byte on scratchpad reads
    pub corrupt_crc: bool,
}

impl FakeDevice {
    /// Present, externally powered device with the power-on scratchpad
    /// (85 °C, 12-bit configuration)
    pub fn new(family: u8, serial: u8) -> Self {
        let mut device = FakeDevice {
            address: address(family, serial),
            scratchpad: [0x50, 0x05, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0x00],
            parasite: false,
            present: true,
            corrupt_crc: false,
        };
        device.seal();
        device
    }

    pub fn set_temperature_raw(&mut self, raw: i16) {
        let [lsb, msb] = raw.to_le_bytes();
        self.scratchpad[0] = lsb;
        self.scratchpad[1] = msb;
        self.seal();
    }

    pub fn set_configuration(&mut self, byte: u8) {
        self.scratchpad[4] = byte;
        self.seal();
    }

    pub fn set_s20_calibration(&mut self, count_per_c: u8, count_remain: u8) {
        self.scratchpad[6] = count_remain;
        self.scratchpad[7] = count_per_c;
        self.seal();
    }

    fn seal(&mut self) {
        self.scratchpad[8] = compute_partial_crc8(0, &self.scratchpad[..8]);
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Selection {
    None,
    One(usize),
    All,
    Missing,
}

#[derive(Clone, Copy, PartialEq)]
enum Pending {
    None,
    ReadScratchpad,
    /// Payload bytes received so far
    WriteScratchpad(usize),
    PowerSupply,
}

pub struct FakeBus {
    pub devices: Vec<FakeDevice, 8>,
    /// Phantom addresses surfaced by the search before any real device
    ghosts: Vec<Address, 4>,
    search_pos: usize,
    selection: Selection,
    pending: Pending,
    read_pos: usize,
    /// CONVERT T commands observed
    pub conversions: usize,
    /// Writes that requested a strong pullup
    pub strong_pullups: usize,
    /// How many completion polls read busy before the line goes high
    pub conversion_busy_polls: usize,
}

impl FakeBus {
    pub fn new() -> Self {
        FakeBus {
            devices: Vec::new(),
            ghosts: Vec::new(),
            search_pos: 0,
            selection: Selection::None,
            pending: Pending::None,
            read_pos: 0,
            conversions: 0,
            strong_pullups: 0,
            conversion_busy_polls: 0,
        }
    }

    pub fn attach(&mut self, device: FakeDevice) {
        self.devices.push(device).ok().unwrap();
    }

    /// Makes the search also surface `address` without any device behind it
    pub fn haunt(&mut self, address: Address) {
        self.ghosts.push(address).ok().unwrap();
    }

    fn selected_mut(&mut self) -> Option<&mut FakeDevice> {
        match self.selection {
            Selection::One(index) => self.devices.get_mut(index),
            _ => None,
        }
    }
}

impl BusTransport for FakeBus {
    type Error = Infallible;

    fn reset(&mut self) -> Result<bool, Self::Error> {
        self.selection = Selection::None;
        self.pending = Pending::None;
        self.read_pos = 0;
        Ok(self.devices.iter().any(|device| device.present))
    }

    fn reset_search(&mut self) {
        self.search_pos = 0;
    }

    fn search_next(&mut self) -> Result<Option<Address>, Self::Error> {
        let position = self.search_pos;
        self.search_pos += 1;
        if position < self.ghosts.len() {
            return Ok(Some(self.ghosts[position]));
        }
        Ok(self
            .devices
            .get(position - self.ghosts.len())
            .map(|device| device.address))
    }

    fn select(&mut self, address: &Address) -> Result<(), Self::Error> {
        self.selection = self
            .devices
            .iter()
            .position(|device| device.present && device.address == *address)
            .map(Selection::One)
            .unwrap_or(Selection::Missing);
        self.pending = Pending::None;
        Ok(())
    }

    fn skip(&mut self) -> Result<(), Self::Error> {
        self.selection = Selection::All;
        self.pending = Pending::None;
        Ok(())
    }

    fn write_byte(&mut self, byte: u8, strong_pullup: bool) -> Result<(), Self::Error> {
        if strong_pullup {
            self.strong_pullups += 1;
        }
        match self.pending {
            Pending::WriteScratchpad(received) if received < 3 => {
                if let Some(device) = self.selected_mut() {
                    device.scratchpad[2 + received] = byte;
                    device.seal();
                }
                self.pending = Pending::WriteScratchpad(received + 1);
            }
            _ => match byte {
                0xBE => {
                    self.pending = Pending::ReadScratchpad;
                    self.read_pos = 0;
                }
                0x4E => self.pending = Pending::WriteScratchpad(0),
                0xB4 => self.pending = Pending::PowerSupply,
                0x44 => {
                    self.conversions += 1;
                    self.pending = Pending::None;
                }
                _ => self.pending = Pending::None,
            },
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        if self.pending != Pending::ReadScratchpad {
            return Ok(0xFF);
        }
        let position = self.read_pos;
        self.read_pos = (position + 1).min(Scratchpad::BYTES - 1);
        Ok(match self.selection {
            Selection::One(index) => {
                let device = &self.devices[index];
                let byte = device.scratchpad[position];
                if position == Scratchpad::BYTES - 1 && device.corrupt_crc {
                    !byte
                } else {
                    byte
                }
            }
            // nothing driving the line
            _ => 0xFF,
        })
    }

    fn read_bit(&mut self) -> Result<bool, Self::Error> {
        match self.pending {
            Pending::PowerSupply => Ok(match self.selection {
                // parasite powered devices pull the slot low
                Selection::One(index) => !self.devices[index].parasite,
                _ => true,
            }),
            _ => {
                if self.conversion_busy_polls > 0 {
                    self.conversion_busy_polls -= 1;
                    Ok(false)
                } else {
                    Ok(true)
                }
            }
        }
    }
}

/// Counts requested delay time instead of sleeping
pub struct SpyDelay {
    total_us: u64,
}

impl SpyDelay {
    pub fn new() -> Self {
        SpyDelay { total_us: 0 }
    }

    pub fn total_us(&self) -> u64 {
        self.total_us
    }

    pub fn total_ms(&self) -> u64 {
        self.total_us / 1000
    }
}

impl DelayUs for SpyDelay {
    fn delay_us(&mut self, us: u32) {
        self.total_us += us as u64;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_us += ms as u64 * 1000;
    }
}
