use core::fmt::Debug;

/// Error type
///
/// Ordinary absence-of-device conditions (no presence pulse, corrupted
/// scratchpad) are not errors; they surface as boolean outcomes or as the
/// [`Temperature::DISCONNECTED`](crate::Temperature::DISCONNECTED) sentinel.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E: Sized + Debug> {
    /// Device index outside the discovered registry
    IndexOutOfRange(usize),
    PortError(E),
}

impl<E: Sized + Debug> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::PortError(e)
    }
}
