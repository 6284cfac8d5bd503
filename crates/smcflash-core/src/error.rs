//! Error types for smcflash-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Erase errors
    /// Sector range is empty, negative or runs past the end of the bank
    InvalidSectorRange {
        /// First sector requested
        first: i32,
        /// Last sector requested (inclusive)
        last: i32,
    },

    // Chip errors
    /// JEDEC ID is not in the part table
    UnknownPart {
        /// The 24-bit JEDEC ID read from the part
        id: u32,
    },
    /// Bank index is not in the board configuration
    BankNotPresent,
    /// No bank maps the requested address
    NoBankAtAddress {
        /// The address that was looked up
        addr: u32,
    },

    // Address/protection errors
    /// Address range is beyond the end of the bank
    AddressOutOfBounds,
    /// Range touches a sector that is marked protected
    RegionProtected {
        /// Index of the first protected sector hit
        sector: usize,
    },

    // Bus errors
    /// Status polling ran out of iterations (only with a poll limit set)
    Timeout,
}

impl Error {
    /// Legacy bootloader status code for this error
    ///
    /// `flash_erase` answers `1` for an invalid range and `write_buff`
    /// documents `1` for a write timeout. The remaining codes follow the
    /// bootloader's generic flash layer (`4` protected, `8` invalid
    /// address, `64` unknown flash type).
    pub const fn status_code(&self) -> i32 {
        match self {
            Self::InvalidSectorRange { .. } => 1,
            Self::Timeout => 1,
            Self::RegionProtected { .. } => 4,
            Self::AddressOutOfBounds | Self::NoBankAtAddress { .. } => 8,
            Self::UnknownPart { .. } | Self::BankNotPresent => 64,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSectorRange { first, last } => {
                write!(f, "no sectors to erase (range {}..={})", first, last)
            }
            Self::UnknownPart { id } => write!(f, "unsupported SPI flash (ID {:06x})", id),
            Self::BankNotPresent => write!(f, "no such flash bank"),
            Self::NoBankAtAddress { addr } => {
                write!(f, "no flash bank at address 0x{:08X}", addr)
            }
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::RegionProtected { sector } => {
                write!(f, "sector {} is protected", sector)
            }
            Self::Timeout => write!(f, "flash status polling timed out"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::InvalidSectorRange { first: 3, last: 1 }.status_code(), 1);
        assert_eq!(Error::Timeout.status_code(), 1);
    }

    #[test]
    fn test_display() {
        let e = Error::UnknownPart { id: 0x1530ef };
        assert_eq!(e.to_string(), "unsupported SPI flash (ID 1530ef)");
    }
}
