//! Memory-mapped I/O capability
//!
//! The driver never dereferences raw pointers itself. Every register or
//! flash window access goes through an [`Mmio`] implementation handed to
//! [`SmcController`](crate::smc::SmcController), which lets the same
//! sequencing code run on a real BMC (`/dev/mem`), on bare metal, or
//! against a simulated register file in tests.

/// Typed access to the physical address space
///
/// Addresses are absolute physical addresses (register block bases from
/// [`regs`](crate::regs) plus offsets, or flash window addresses).
/// Implementations must perform each access exactly once and in program
/// order, the way a volatile load/store would.
pub trait Mmio {
    /// Read an 8-bit value
    fn read8(&mut self, addr: u32) -> u8;

    /// Read a 32-bit value
    ///
    /// `addr` must be 4-byte aligned.
    fn read32(&mut self, addr: u32) -> u32;

    /// Write an 8-bit value
    fn write8(&mut self, addr: u32, value: u8);

    /// Write a 32-bit value
    ///
    /// `addr` must be 4-byte aligned.
    fn write32(&mut self, addr: u32, value: u32);

    /// Busy-wait for the specified number of microseconds
    fn delay_us(&mut self, us: u32);
}

impl<T: Mmio + ?Sized> Mmio for &mut T {
    fn read8(&mut self, addr: u32) -> u8 {
        (**self).read8(addr)
    }

    fn read32(&mut self, addr: u32) -> u32 {
        (**self).read32(addr)
    }

    fn write8(&mut self, addr: u32, value: u8) {
        (**self).write8(addr, value)
    }

    fn write32(&mut self, addr: u32, value: u32) {
        (**self).write32(addr, value)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

#[cfg(feature = "alloc")]
impl Mmio for alloc::boxed::Box<dyn Mmio + Send> {
    fn read8(&mut self, addr: u32) -> u8 {
        (**self).read8(addr)
    }

    fn read32(&mut self, addr: u32) -> u32 {
        (**self).read32(addr)
    }

    fn write8(&mut self, addr: u32, value: u8) {
        (**self).write8(addr, value)
    }

    fn write32(&mut self, addr: u32, value: u32) {
        (**self).write32(addr, value)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}
