use crate::{Address, Model, Resolution, Temperature};

/// Reading count above which the averaging accumulator is halved.
///
/// Count and accumulator are halved together, preserving their ratio while
/// bounding magnitude. Integer halving makes the average drift slightly over
/// very long runs; that behavior is kept bit-exact for compatibility.
pub const AVG_READINGS_CEILING: u16 = 10_000;

/// One discovered sensor: its identity plus running statistics.
///
/// Created at discovery, mutated on every successful read, and only ever
/// removed by re-running discovery.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorRecord {
    address: Address,
    model: Model,
    current: Temperature,
    min: Temperature,
    max: Temperature,
    average: Temperature,
    accumulator: i32,
    readings: u16,
    offset: i16,
    resolution: Resolution,
}

impl SensorRecord {
    pub(crate) fn new(address: Address, model: Model) -> Self {
        let mut record = SensorRecord {
            address,
            model,
            current: Temperature::default(),
            min: Temperature::default(),
            max: Temperature::default(),
            average: Temperature::default(),
            accumulator: 0,
            readings: 0,
            offset: 0,
            // worst case until the first scratchpad read seeds the real value
            resolution: if model.fixed_resolution() {
                Resolution::Bits9
            } else {
                Resolution::Bits12
            },
        };
        record.reset_stats();
        record
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn model(&self) -> Model {
        self.model
    }

    /// Most recently decoded reading
    pub fn current(&self) -> Temperature {
        self.current
    }

    pub fn min(&self) -> Temperature {
        self.min
    }

    pub fn max(&self) -> Temperature {
        self.max
    }

    pub fn average(&self) -> Temperature {
        self.average
    }

    pub fn readings(&self) -> u16 {
        self.readings
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub(crate) fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
    }

    /// Fixed calibration offset in hundredths of a degree, added to every
    /// decoded reading
    pub fn offset(&self) -> i16 {
        self.offset
    }

    pub fn set_offset(&mut self, centi: i16) {
        self.offset = centi;
    }

    /// Folds one decoded reading into the statistics
    pub(crate) fn record(&mut self, reading: Temperature) {
        let value =
            Temperature::from_centi_saturating(reading.centi_celsius() as i32 + self.offset as i32);
        self.current = value;
        if value > self.max {
            self.max = value;
        }
        if value < self.min {
            self.min = value;
        }
        self.accumulator += value.centi_celsius() as i32;
        self.readings += 1;
        self.average = Temperature::from_centi_saturating(self.accumulator / self.readings as i32);
        if self.readings > AVG_READINGS_CEILING {
            self.readings /= 2;
            self.accumulator /= 2;
        }
    }

    /// Restores the post-discovery sentinel state
    pub(crate) fn reset_stats(&mut self) {
        self.current = Temperature::default();
        self.min = Temperature::from_centi_celsius(i16::MAX);
        self.max = Temperature::from_centi_celsius(i16::MIN);
        self.average = Temperature::default();
        self.accumulator = 0;
        self.readings = 0;
    }
}
