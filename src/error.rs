//! Error definitions for LM51772 driver.

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error<I2cError> {
    /// Underlying I2C transaction failed.
    I2c(I2cError),
    /// Provided parameter was outside the field's conversion range. Nothing was written.
    OutOfRange,
    /// Device profile failed validation, or a burst exceeded the transfer buffer.
    InvalidConfig,
}

impl<I2cError: core::fmt::Debug> core::fmt::Display for Error<I2cError> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "I2C error: {:?}", e),
            Error::OutOfRange => write!(f, "parameter out of range"),
            Error::InvalidConfig => write!(f, "invalid device configuration"),
        }
    }
}
