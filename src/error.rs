//! Unified error type for lampctl.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (with the `defmt` feature) for on-target logging.

/// Top-level error type used across the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Keys
    /// The key registry is at capacity.
    RegistryFull,

    /// Key id does not fit in a 32-bit key mask.
    InvalidKeyId(u8),

    /// A key with this id is already registered.
    DuplicateKeyId(u8),

    // Gesture sensor
    /// The part id register did not identify a PAJ7620.
    SensorNotFound { part_id: u8 },

    /// I²C transaction to the sensor failed.
    Bus,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::RegistryFull => f.write_str("key registry full"),
            Error::InvalidKeyId(id) => write!(f, "key id {} out of range", id),
            Error::DuplicateKeyId(id) => write!(f, "key id {} already registered", id),
            Error::SensorNotFound { part_id } => {
                write!(f, "unexpected gesture sensor part id {:#04x}", part_id)
            }
            Error::Bus => f.write_str("gesture sensor bus error"),
        }
    }
}
