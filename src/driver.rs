use embedded_hal::delay::DelayUs;

use crate::{
    BusTransport, Command, Error, OpCode, Registry, Resolution, Scratchpad, SensorRecord,
    Temperature,
};

/// Poll step while listening for conversion completion
const CONVERSION_POLL_MS: u16 = 10;

/// Settle time after COPY SCRATCHPAD under parasite power
const COPY_SETTLE_MS: u16 = 10;

/// Temperature sensor management over a [`BusTransport`].
///
/// Owns the transport exclusively and serializes every transaction as
/// reset, select (or skip), command, data. Blocking throughout: conversion
/// waits and settle delays run on the calling thread via the `DelayUs`
/// handed into each timed operation.
pub struct Driver<T: BusTransport> {
    transport: T,
    registry: Registry,
    wait_for_conversion: bool,
    check_for_conversion: bool,
}

impl<T: BusTransport> Driver<T> {
    pub fn new(transport: T) -> Self {
        Driver {
            transport,
            registry: Registry::new(),
            wait_for_conversion: true,
            check_for_conversion: true,
        }
    }

    pub fn release(self) -> T {
        self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Rebuilds the registry from the devices answering the ROM search.
    ///
    /// Candidates with a bad address CRC or an unrecognized family code are
    /// silently skipped; devices beyond [`MAX_DEVICES`](crate::MAX_DEVICES)
    /// are dropped and latch [`device_limit_reached`](Self::device_limit_reached).
    /// Each accepted device gets its power mode probed and one seeding
    /// scratchpad read for its resolution (which also primes statistics); a
    /// failed read leaves the record at its defaults. Returns the device
    /// count.
    pub fn discover(&mut self) -> Result<usize, Error<T::Error>> {
        self.registry.clear();
        self.transport.reset_search();

        while let Some(address) = self.transport.search_next()? {
            if !address.is_valid() {
                continue;
            }
            let Some(model) = address.model() else {
                continue;
            };
            if !self.registry.push(SensorRecord::new(address, model)) {
                continue;
            }
            let index = self.registry.len() - 1;

            if !self.registry.parasite() && self.read_power_supply(index)? {
                self.registry.set_parasite(true);
            }

            if let Some(scratchpad) = self.read_sensor(index)? {
                if let Some(resolution) = scratchpad.resolution(model) {
                    self.record_mut(index)?.set_resolution(resolution);
                }
            }
            let resolution = self.record(index)?.resolution();
            self.registry.fold_resolution(resolution);
        }

        Ok(self.registry.len())
    }

    pub fn device_count(&self) -> usize {
        self.registry.len()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn sensor(&self, index: usize) -> Result<&SensorRecord, Error<T::Error>> {
        self.record(index)
    }

    /// True when any device on the bus draws parasite power
    pub fn is_parasite_power(&self) -> bool {
        self.registry.parasite()
    }

    /// Whether the last discovery dropped devices beyond capacity
    pub fn device_limit_reached(&self) -> bool {
        self.registry.limit_reached()
    }

    /// Slowest resolution across known devices, used for broadcast waits
    pub fn global_resolution(&self) -> Resolution {
        self.registry.max_resolution()
    }

    pub fn wait_for_conversion(&self) -> bool {
        self.wait_for_conversion
    }

    /// When false, conversion requests return immediately and the caller is
    /// responsible for not reading results early
    pub fn set_wait_for_conversion(&mut self, flag: bool) {
        self.wait_for_conversion = flag;
    }

    pub fn check_for_conversion(&self) -> bool {
        self.check_for_conversion
    }

    /// When true, conversion waits poll the line instead of sleeping for the
    /// full worst-case time
    pub fn set_check_for_conversion(&mut self, flag: bool) {
        self.check_for_conversion = flag;
    }

    fn record(&self, index: usize) -> Result<&SensorRecord, Error<T::Error>> {
        self.registry.get(index).ok_or(Error::IndexOutOfRange(index))
    }

    fn record_mut(&mut self, index: usize) -> Result<&mut SensorRecord, Error<T::Error>> {
        self.registry
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange(index))
    }

    /// Probes the device's power mode; true means parasite powered
    pub fn read_power_supply(&mut self, index: usize) -> Result<bool, Error<T::Error>> {
        let address = *self.record(index)?.address();
        if !self.transport.reset()? {
            return Ok(false);
        }
        self.transport.select(&address)?;
        self.transport
            .write_byte(Command::ReadPowerSupply.op_code(), false)?;
        // parasite powered devices pull the next time slot low
        let parasite = !self.transport.read_bit()?;
        self.transport.reset()?;
        Ok(parasite)
    }

    /// Raw 9-byte register read, no validation.
    ///
    /// When nothing answers the line floats high and every byte comes back
    /// 0xFF, which the CRC then rejects.
    pub fn read_scratchpad(&mut self, index: usize) -> Result<Scratchpad, Error<T::Error>> {
        let address = *self.record(index)?.address();
        let mut raw = [0xFF; Scratchpad::BYTES];
        if self.transport.reset()? {
            self.transport.select(&address)?;
            self.transport
                .write_byte(Command::ReadScratchpad.op_code(), false)?;
            for byte in raw.iter_mut() {
                *byte = self.transport.read_byte()?;
            }
            self.transport.reset()?;
        }
        Ok(Scratchpad::from(raw))
    }

    /// Validated scratchpad read.
    ///
    /// `None` when the device is absent or the transfer fails its CRC. On
    /// success the decoded temperature is folded into the device's
    /// statistics, so any connectivity probe also keeps them fresh.
    pub fn read_sensor(&mut self, index: usize) -> Result<Option<Scratchpad>, Error<T::Error>> {
        let model = self.record(index)?.model();
        let scratchpad = self.read_scratchpad(index)?;
        if !scratchpad.crc_valid() {
            return Ok(None);
        }
        let value = scratchpad.temperature(model);
        self.record_mut(index)?.record(value);
        Ok(Some(scratchpad))
    }

    /// Whether the device answers with an intact scratchpad
    pub fn is_connected(&mut self, index: usize) -> Result<bool, Error<T::Error>> {
        Ok(self.read_sensor(index)?.is_some())
    }

    /// Fresh reading in hundredths of a degree Celsius.
    ///
    /// Returns [`Temperature::DISCONNECTED`] when the device is absent or
    /// the read is corrupted; callers must check before trusting the value.
    pub fn temperature(&mut self, index: usize) -> Result<Temperature, Error<T::Error>> {
        match self.read_sensor(index)? {
            Some(_) => Ok(self.record(index)?.current()),
            None => Ok(Temperature::DISCONNECTED),
        }
    }

    /// Last stored reading, no bus traffic
    pub fn current_temperature(&self, index: usize) -> Result<Temperature, Error<T::Error>> {
        Ok(self.record(index)?.current())
    }

    pub fn min_temperature(&self, index: usize) -> Result<Temperature, Error<T::Error>> {
        Ok(self.record(index)?.min())
    }

    pub fn max_temperature(&self, index: usize) -> Result<Temperature, Error<T::Error>> {
        Ok(self.record(index)?.max())
    }

    pub fn average_temperature(&self, index: usize) -> Result<Temperature, Error<T::Error>> {
        Ok(self.record(index)?.average())
    }

    /// Writes the alarm thresholds (and, for models that have one, the
    /// configuration register) and commits them to EEPROM.
    ///
    /// False when the device did not answer. Parasite power needs a strong
    /// pullup through the copy plus a settle delay.
    pub fn write_scratchpad(
        &mut self,
        index: usize,
        scratchpad: &Scratchpad,
        delay: &mut impl DelayUs,
    ) -> Result<bool, Error<T::Error>> {
        let record = self.record(index)?;
        let address = *record.address();
        let model = record.model();
        let parasite = self.registry.parasite();

        if !self.transport.reset()? {
            return Ok(false);
        }
        self.transport.select(&address)?;
        self.transport
            .write_byte(Command::WriteScratchpad.op_code(), false)?;
        self.transport.write_byte(scratchpad.alarm_high(), false)?;
        self.transport.write_byte(scratchpad.alarm_low(), false)?;
        if model.has_configuration_register() {
            self.transport
                .write_byte(scratchpad.configuration(), false)?;
        }

        self.transport.reset()?;
        self.transport.select(&address)?;
        self.transport
            .write_byte(Command::CopyScratchpad.op_code(), parasite)?;
        if parasite {
            delay.delay_ms(COPY_SETTLE_MS as u32);
        }
        self.transport.reset()?;
        Ok(true)
    }

    /// Broadcasts CONVERT T to every device at once.
    ///
    /// With `wait_for_conversion` set this blocks until the slowest known
    /// resolution has had its worst-case time; a heterogeneous bus therefore
    /// waits for its slowest member. Per-device failures only show up on the
    /// subsequent reads.
    pub fn request_temperatures(&mut self, delay: &mut impl DelayUs) -> Result<(), Error<T::Error>> {
        if !self.transport.reset()? {
            return Ok(());
        }
        self.transport.skip()?;
        let parasite = self.registry.parasite();
        self.transport
            .write_byte(Command::ConvertT.op_code(), parasite)?;

        if self.wait_for_conversion {
            let resolution = self.registry.max_resolution();
            self.wait_for_completion(resolution, delay)?;
        }
        Ok(())
    }

    /// Starts a conversion on one device.
    ///
    /// Confirms the target answers first; an absent device yields
    /// `Ok(false)` immediately, with no wait elapsed. The wait is sized to
    /// that device's own resolution.
    pub fn request_temperature(
        &mut self,
        index: usize,
        delay: &mut impl DelayUs,
    ) -> Result<bool, Error<T::Error>> {
        if self.read_sensor(index)?.is_none() {
            return Ok(false);
        }
        let record = self.record(index)?;
        let address = *record.address();
        let resolution = record.resolution();
        let parasite = self.registry.parasite();

        if !self.transport.reset()? {
            return Ok(false);
        }
        self.transport.select(&address)?;
        self.transport
            .write_byte(Command::ConvertT.op_code(), parasite)?;

        if self.wait_for_conversion {
            self.wait_for_completion(resolution, delay)?;
        }
        Ok(true)
    }

    /// One read time slot; the line reads low while any device is still
    /// converting
    pub fn is_conversion_complete(&mut self) -> Result<bool, Error<T::Error>> {
        Ok(self.transport.read_bit()?)
    }

    /// Applies the configured wait policy for one conversion.
    ///
    /// Polling is only possible when no device holds a strong pullup, so
    /// parasite buses always take the fixed worst-case delay. The poll loop
    /// falls through silently once the worst-case budget has elapsed; by
    /// then the conversion is done regardless of what the line said.
    fn wait_for_completion(
        &mut self,
        resolution: Resolution,
        delay: &mut impl DelayUs,
    ) -> Result<(), Error<T::Error>> {
        let budget = resolution.time_ms();
        if self.check_for_conversion && !self.registry.parasite() {
            let mut waited = 0;
            while waited < budget {
                if self.transport.read_bit()? {
                    return Ok(());
                }
                delay.delay_ms(CONVERSION_POLL_MS as u32);
                waited += CONVERSION_POLL_MS;
            }
        } else {
            delay.delay_ms(budget as u32);
        }
        Ok(())
    }

    /// Device resolution: fixed 9 bits for the DS18S20, otherwise decoded
    /// from a fresh scratchpad read. `None` when the device is unreachable.
    pub fn resolution(&mut self, index: usize) -> Result<Option<Resolution>, Error<T::Error>> {
        let model = self.record(index)?.model();
        if model.fixed_resolution() {
            return Ok(Some(Resolution::Bits9));
        }
        match self.read_sensor(index)? {
            Some(scratchpad) => Ok(scratchpad.resolution(model)),
            None => Ok(None),
        }
    }

    /// Requests `bits` of resolution (clamped to 9..=12) on one device.
    ///
    /// The DS18S20 ignores the value but still reports success when
    /// connected. False when the device did not answer.
    pub fn set_resolution(
        &mut self,
        index: usize,
        bits: u8,
        delay: &mut impl DelayUs,
    ) -> Result<bool, Error<T::Error>> {
        let resolution = Resolution::from_bits(bits);
        let model = self.record(index)?.model();

        let Some(mut scratchpad) = self.read_sensor(index)? else {
            return Ok(false);
        };
        if model.has_configuration_register() {
            scratchpad.set_configuration(resolution.config_byte());
            if !self.write_scratchpad(index, &scratchpad, delay)? {
                return Ok(false);
            }
            self.record_mut(index)?.set_resolution(resolution);
        }
        Ok(true)
    }

    /// Requests `bits` of resolution (clamped) on every device in registry
    /// order, and makes it the bus-wide value broadcast waits are sized to
    pub fn set_all_resolutions(
        &mut self,
        bits: u8,
        delay: &mut impl DelayUs,
    ) -> Result<(), Error<T::Error>> {
        let resolution = Resolution::from_bits(bits);
        self.registry.set_max_resolution(resolution);
        for index in 0..self.registry.len() {
            self.set_resolution(index, bits, delay)?;
        }
        Ok(())
    }

    pub fn set_offset(&mut self, index: usize, centi: i16) -> Result<(), Error<T::Error>> {
        self.record_mut(index)?.set_offset(centi);
        Ok(())
    }

    pub fn reset_stats(&mut self, index: usize) -> Result<(), Error<T::Error>> {
        self.record_mut(index)?.reset_stats();
        Ok(())
    }

    pub fn reset_all_stats(&mut self) {
        for record in self.registry.iter_mut() {
            record.reset_stats();
        }
    }
}
