use core::fmt;

/// The raw pressure code held the power-up sentinel: no conversion has
/// completed yet, or the device is asleep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NotReady;

impl fmt::Display for NotReady {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("sensor conversion not ready")
    }
}

/// Errors returned by the drivers.
///
/// `E` is the error type of the underlying I2C implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// A register read or write did not complete.
    Bus(E),
    /// See [`NotReady`]. Retrying after a short delay is usually enough.
    NotReady,
}

impl<E> From<NotReady> for Error<E> {
    fn from(_: NotReady) -> Self {
        Error::NotReady
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bus(e) => write!(f, "bus transfer failed: {:?}", e),
            Error::NotReady => fmt::Display::fmt(&NotReady, f),
        }
    }
}
