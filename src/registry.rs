use heapless::Vec;

use crate::{Resolution, SensorRecord};

/// Capacity of the sensor arena
pub const MAX_DEVICES: usize = 6;

/// The set of sensors found by the last discovery, plus the bus-wide state
/// that discovery derives from them.
///
/// Records are indexed by discovery order, 0..len. The registry is only ever
/// rebuilt wholesale; individual records are never removed.
#[derive(Debug, Default)]
pub struct Registry {
    sensors: Vec<SensorRecord, MAX_DEVICES>,
    parasite: bool,
    max_resolution: Option<Resolution>,
    overflowed: bool,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Registry::default()
    }

    pub(crate) fn clear(&mut self) {
        self.sensors.clear();
        self.parasite = false;
        self.max_resolution = None;
        self.overflowed = false;
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SensorRecord> {
        self.sensors.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut SensorRecord> {
        self.sensors.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SensorRecord> {
        self.sensors.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut SensorRecord> {
        self.sensors.iter_mut()
    }

    /// False when the arena is full; the candidate is dropped and the
    /// overflow condition latched
    pub(crate) fn push(&mut self, record: SensorRecord) -> bool {
        if self.sensors.push(record).is_err() {
            self.overflowed = true;
            false
        } else {
            true
        }
    }

    /// Whether the last discovery found more devices than [`MAX_DEVICES`]
    pub fn limit_reached(&self) -> bool {
        self.overflowed
    }

    /// True when any device on the bus draws parasite power
    pub fn parasite(&self) -> bool {
        self.parasite
    }

    pub(crate) fn set_parasite(&mut self, parasite: bool) {
        self.parasite = parasite;
    }

    /// The slowest resolution across known devices; broadcast conversions
    /// wait this long
    pub fn max_resolution(&self) -> Resolution {
        self.max_resolution.unwrap_or(Resolution::Bits9)
    }

    pub(crate) fn fold_resolution(&mut self, resolution: Resolution) {
        self.max_resolution = Some(match self.max_resolution {
            Some(current) => current.max(resolution),
            None => resolution,
        });
    }

    pub(crate) fn set_max_resolution(&mut self, resolution: Resolution) {
        self.max_resolution = Some(resolution);
    }
}
