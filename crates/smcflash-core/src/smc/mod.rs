//! ASPEED static memory controller (SMC) SPI user mode
//!
//! - [`control`]: the SPI control register word
//! - [`clock`]: core clock decoding and divisor calibration
//! - [`SmcController`]: the command sequencer

pub mod clock;
pub mod control;
mod controller;

pub use clock::Timing;
pub use control::{BusMode, ChipSelect, ControlWord};
pub use controller::{PollLimit, SmcController};
