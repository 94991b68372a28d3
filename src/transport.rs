use crate::Address;
use core::fmt::Debug;

/// Contract presented by the physical 1-Wire bus master.
///
/// Implementations own line timing, bit-level signalling and the ROM search
/// state machine; a bit-banged GPIO pair and a DS2480B/DS2484 bridge are both
/// valid backends. All calls are synchronous and block the caller. The
/// driver serializes every transaction as reset, then select or skip, then
/// command and data, so implementations never see interleaved operations.
pub trait BusTransport {
    type Error: Sized + Debug;

    /// Resets the line and listens for a presence pulse.
    /// `Ok(true)` when at least one device answered.
    fn reset(&mut self) -> Result<bool, Self::Error>;

    /// Restarts ROM enumeration from the first device on the line
    fn reset_search(&mut self);

    /// Next address found by the ROM search, `None` once exhausted.
    ///
    /// Returned addresses are raw line data; the caller validates the CRC.
    fn search_next(&mut self) -> Result<Option<Address>, Self::Error>;

    /// Addresses a single device (MATCH ROM)
    fn select(&mut self, address: &Address) -> Result<(), Self::Error>;

    /// Addresses every device at once (SKIP ROM)
    fn skip(&mut self) -> Result<(), Self::Error>;

    /// Writes one byte. With `strong_pullup` the line stays actively driven
    /// high after the last bit so parasite powered devices can execute the
    /// command just written.
    fn write_byte(&mut self, byte: u8, strong_pullup: bool) -> Result<(), Self::Error>;

    fn read_byte(&mut self) -> Result<u8, Self::Error>;

    /// Reads a single time slot
    fn read_bit(&mut self) -> Result<bool, Self::Error>;

    /// Maxim 8-bit CRC as used for addresses and scratchpads
    fn checksum8(&self, data: &[u8]) -> u8 {
        crate::compute_partial_crc8(0, data)
    }
}
