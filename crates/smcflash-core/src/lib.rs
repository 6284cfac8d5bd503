//! smcflash-core - SPI NOR driver for the ASPEED static memory controller
//!
//! This crate drives an SPI NOR part hanging off the AST2050 static memory
//! controller (SMC) in "user mode": every SPI command byte is pushed by hand
//! through the controller's data window while a single control register
//! selects chip-select level, bus mode and clock divisor. On top of that
//! sits a bank/sector abstraction (erase, program, read) of the kind a
//! bootloader's generic flash layer expects.
//!
//! It is `no_std` compatible. All hardware access goes through the [`Mmio`]
//! trait so the same code runs against real registers or a simulated
//! register file.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`) and the
//!   TOML board configuration loader
//! - `alloc` - Enable heap allocation
//!
//! # Example
//!
//! ```ignore
//! use smcflash_core::board::BoardConfig;
//! use smcflash_core::flash::{FlashBanks, NoProgress};
//! use smcflash_core::smc::SmcController;
//!
//! fn erase_all<M: smcflash_core::Mmio>(mmio: M) -> smcflash_core::Result<()> {
//!     let config = BoardConfig::default();
//!     let mut banks = FlashBanks::init(SmcController::new(mmio), &config)?;
//!     println!("Flash: {} bytes", banks.total_size());
//!     let last = banks.bank(0).unwrap().sector_count() as i32 - 1;
//!     banks.erase(0, 0, last, &mut NoProgress)?;
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(feature = "alloc", test))]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod board;
pub mod chip;
pub mod error;
pub mod flash;
pub mod mmio;
pub mod opcodes;
pub mod regs;
pub mod smc;

pub use error::{Error, Result};
pub use mmio::Mmio;
