//! User-mode command sequencer
//!
//! Every SPI transaction is built the same way: write a control word
//! (chip select low, user mode, divisor), wait for it to settle, push the
//! command bytes one at a time through the flash data window, then raise
//! chip select again. Status polls read the data window repeatedly while
//! chip select is still low after an RDSR opcode.

use crate::chip::JedecId;
use crate::error::{Error, Result};
use crate::mmio::Mmio;
use crate::opcodes::{self, Status};
use crate::regs::*;

use super::clock;
use super::control::{BusMode, ChipSelect, ControlWord};

/// Upper bound on status polling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollLimit {
    /// Poll until the part answers, however long that takes
    #[default]
    Unbounded,
    /// Give up with [`Error::Timeout`] after this many status reads
    Iterations(u32),
}

impl PollLimit {
    /// `None` means unbounded
    pub const fn from_option(limit: Option<u32>) -> Self {
        match limit {
            Some(n) => Self::Iterations(n),
            None => Self::Unbounded,
        }
    }
}

/// Owner of the SMC SPI control register and the flash data windows
pub struct SmcController<M: Mmio> {
    mmio: M,
    poll_limit: PollLimit,
}

impl<M: Mmio> SmcController<M> {
    /// Create a controller with unbounded status polling
    pub fn new(mmio: M) -> Self {
        Self {
            mmio,
            poll_limit: PollLimit::Unbounded,
        }
    }

    /// Builder-style poll limit
    pub fn with_poll_limit(mut self, limit: PollLimit) -> Self {
        self.poll_limit = limit;
        self
    }

    /// Change the poll limit
    pub fn set_poll_limit(&mut self, limit: PollLimit) {
        self.poll_limit = limit;
    }

    /// Current poll limit
    pub fn poll_limit(&self) -> PollLimit {
        self.poll_limit
    }

    /// Borrow the underlying MMIO capability
    pub fn mmio(&self) -> &M {
        &self.mmio
    }

    /// Mutably borrow the underlying MMIO capability
    pub fn mmio_mut(&mut self) -> &mut M {
        &mut self.mmio
    }

    /// Release the MMIO capability
    pub fn into_inner(self) -> M {
        self.mmio
    }

    /// Current raw value of the SPI control register
    pub fn read_control(&mut self) -> u32 {
        self.mmio.read32(SMC_SPI_CTRL)
    }

    /// Raw SCU hardware strapping register
    pub fn read_strap(&mut self) -> u32 {
        self.mmio.read32(SCU_HW_STRAPPING)
    }

    /// Effective core clock in MHz, decoded from the strapping register
    pub fn core_clock_mhz(&mut self) -> u32 {
        let strap = self.read_strap();
        let mhz = clock::core_clock_mhz(strap);
        log::debug!("SCU strap 0x{:08X}: core clock {} MHz", strap, mhz);
        mhz
    }

    /// Read the JEDEC ID of the part behind `window`
    ///
    /// The chip-select transitions are read-modify-write on the control
    /// register so the divisor left by the previous reset stays in effect.
    pub fn read_jedec_id(&mut self, window: u32) -> JedecId {
        let ctrl = self.read_control();
        self.set_control(ControlWord::modify(ctrl, BusMode::User, ChipSelect::Low));
        self.send(window, opcodes::RDID);
        let id = JedecId::from_word(self.mmio.read32(window));
        let ctrl = self.read_control();
        self.set_control(ControlWord::modify(ctrl, BusMode::User, ChipSelect::High));
        log::trace!("RDID @ 0x{:08X}: {}", window, id);
        id
    }

    /// Send WREN and wait for the write enable latch
    pub fn write_enable(&mut self, window: u32, divisor: u8) -> Result<()> {
        self.select(divisor);
        self.send(window, opcodes::WREN);
        self.deselect(divisor);
        self.wait_status(window, divisor, |s| s.contains(Status::WEL))
    }

    /// Write the status register and wait for completion
    ///
    /// The completion poll always runs at divisor code 0.
    pub fn write_status(&mut self, window: u32, divisor: u8, value: u8) -> Result<()> {
        log::trace!("WRSR 0x{:02X}", value);
        self.write_enable(window, divisor)?;
        self.select(divisor);
        self.send(window, opcodes::WRSR);
        self.mmio.write8(window, value);
        self.deselect(divisor);
        self.wait_status(window, 0, |s| !s.contains(Status::WIP))
    }

    /// Program up to one page at `offset` (relative to the bank base)
    ///
    /// The caller must keep `data` within a single page.
    pub fn page_program(
        &mut self,
        window: u32,
        divisor: u8,
        offset: u32,
        data: &[u8],
    ) -> Result<()> {
        log::trace!("PP 0x{:06X} len {}", offset, data.len());
        self.write_enable(window, divisor)?;
        self.select(divisor);
        self.send(window, opcodes::PP);
        self.send_address(window, offset);
        for &byte in data {
            self.send(window, byte);
        }
        self.deselect(divisor);
        self.wait_status(window, divisor, |s| !s.contains(Status::WIP))
    }

    /// Erase the sector at `offset` (relative to the bank base)
    pub fn sector_erase(&mut self, window: u32, divisor: u8, offset: u32) -> Result<()> {
        log::trace!("SE 0x{:06X}", offset);
        self.write_enable(window, divisor)?;
        self.select(divisor);
        self.send(window, opcodes::SE_D8);
        self.send_address(window, offset);
        self.deselect(divisor);
        self.wait_status(window, divisor, |s| !s.contains(Status::WIP))
    }

    /// Return the controller to fast-read idle with chip select released
    pub fn reset(&mut self, read_divisor: u8, dummy_bytes: u8) {
        self.set_control(ControlWord::fast_read_idle(read_divisor, dummy_bytes));
    }

    fn set_control(&mut self, word: ControlWord) {
        log::trace!("ctrl <- 0x{:08X}", word.bits());
        self.mmio.write32(SMC_SPI_CTRL, word.bits());
        self.mmio.delay_us(CTRL_SETTLE_US);
    }

    fn select(&mut self, divisor: u8) {
        self.set_control(ControlWord::user(divisor, ChipSelect::Low));
    }

    fn deselect(&mut self, divisor: u8) {
        self.set_control(ControlWord::user(divisor, ChipSelect::High));
    }

    fn send(&mut self, window: u32, byte: u8) {
        self.mmio.write8(window, byte);
        self.mmio.delay_us(BYTE_SETTLE_US);
    }

    fn send_address(&mut self, window: u32, offset: u32) {
        self.send(window, (offset >> 16) as u8);
        self.send(window, (offset >> 8) as u8);
        self.send(window, offset as u8);
    }

    /// RDSR and poll until `done` holds, chip select is raised either way
    fn wait_status(
        &mut self,
        window: u32,
        divisor: u8,
        done: impl Fn(Status) -> bool,
    ) -> Result<()> {
        self.select(divisor);
        self.send(window, opcodes::RDSR);

        let mut polls: u32 = 0;
        let result = loop {
            let status = Status::from_bits_retain(self.mmio.read8(window));
            if done(status) {
                break Ok(());
            }
            polls = polls.saturating_add(1);
            if let PollLimit::Iterations(max) = self.poll_limit {
                if polls >= max {
                    log::warn!("flash still busy after {} status polls", polls);
                    break Err(Error::Timeout);
                }
            }
        };

        self.deselect(divisor);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::VecDeque;
    use alloc::vec;
    use alloc::vec::Vec;

    const WINDOW: u32 = 0x1400_0000;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Ev {
        Ctrl(u32),
        Byte(u8),
        Poll,
        Word,
        Delay(u32),
    }
    use Ev::*;

    /// Records every bus access, answers status reads from a script
    struct Recorder {
        ctrl: u32,
        strap: u32,
        id_word: u32,
        status: VecDeque<u8>,
        idle_status: u8,
        events: Vec<Ev>,
    }

    impl Recorder {
        fn new(status: &[u8]) -> Self {
            Self {
                ctrl: 0x000B_0605,
                strap: 0,
                id_word: 0xFF15_30EF,
                status: status.iter().copied().collect(),
                idle_status: 0x02,
                events: Vec::new(),
            }
        }
    }

    impl Mmio for Recorder {
        fn read8(&mut self, addr: u32) -> u8 {
            assert_eq!(addr, WINDOW);
            self.events.push(Poll);
            self.status.pop_front().unwrap_or(self.idle_status)
        }

        fn read32(&mut self, addr: u32) -> u32 {
            match addr {
                SMC_SPI_CTRL => self.ctrl,
                SCU_HW_STRAPPING => self.strap,
                WINDOW => {
                    self.events.push(Word);
                    self.id_word
                }
                _ => panic!("unexpected read32 at {:#x}", addr),
            }
        }

        fn write8(&mut self, addr: u32, value: u8) {
            assert_eq!(addr, WINDOW);
            self.events.push(Byte(value));
        }

        fn write32(&mut self, addr: u32, value: u32) {
            assert_eq!(addr, SMC_SPI_CTRL);
            self.ctrl = value;
            self.events.push(Ctrl(value));
        }

        fn delay_us(&mut self, us: u32) {
            self.events.push(Delay(us));
        }
    }

    fn lo(div: u32) -> Ev {
        Ctrl((div << 8) | 0x03)
    }

    fn hi(div: u32) -> Ev {
        Ctrl((div << 8) | 0x07)
    }

    fn wren_events(div: u32, polls: usize) -> Vec<Ev> {
        let mut ev = vec![lo(div), Delay(100), Byte(0x06), Delay(10), hi(div), Delay(100)];
        ev.extend([lo(div), Delay(100), Byte(0x05), Delay(10)]);
        ev.extend(core::iter::repeat(Poll).take(polls));
        ev.extend([hi(div), Delay(100)]);
        ev
    }

    #[test]
    fn test_read_jedec_id() {
        let mut ctrl = SmcController::new(Recorder::new(&[]));
        let id = ctrl.read_jedec_id(WINDOW);
        assert_eq!(id.raw(), 0x1530EF);
        assert_eq!(
            ctrl.mmio().events,
            vec![
                Ctrl(0x000B_0603),
                Delay(100),
                Byte(0x9F),
                Delay(10),
                Word,
                Ctrl(0x000B_0607),
                Delay(100),
            ]
        );
    }

    #[test]
    fn test_write_enable_polls_for_wel() {
        let mut ctrl = SmcController::new(Recorder::new(&[0x00, 0x00, 0x02]));
        ctrl.write_enable(WINDOW, 5).unwrap();
        assert_eq!(ctrl.mmio().events, wren_events(5, 3));
    }

    #[test]
    fn test_write_status() {
        let mut rec = Recorder::new(&[0x02, 0x01, 0x01, 0x00]);
        rec.idle_status = 0x00;
        let mut ctrl = SmcController::new(rec);
        ctrl.write_status(WINDOW, 5, 0x00).unwrap();

        let mut expected = wren_events(5, 1);
        // No settle after the data byte
        expected.extend([lo(5), Delay(100), Byte(0x01), Delay(10), Byte(0x00), hi(5), Delay(100)]);
        // Completion poll at divisor code 0
        expected.extend([lo(0), Delay(100), Byte(0x05), Delay(10), Poll, Poll, Poll, hi(0), Delay(100)]);
        assert_eq!(ctrl.mmio().events, expected);
    }

    #[test]
    fn test_page_program() {
        let mut ctrl = SmcController::new(Recorder::new(&[0x02, 0x01, 0x00]));
        ctrl.page_program(WINDOW, 5, 0x01_2345, &[0xAA, 0x55]).unwrap();

        let mut expected = wren_events(5, 1);
        expected.extend([lo(5), Delay(100), Byte(0x02), Delay(10)]);
        expected.extend([Byte(0x01), Delay(10), Byte(0x23), Delay(10), Byte(0x45), Delay(10)]);
        expected.extend([Byte(0xAA), Delay(10), Byte(0x55), Delay(10)]);
        expected.extend([hi(5), Delay(100)]);
        expected.extend([lo(5), Delay(100), Byte(0x05), Delay(10), Poll, Poll, hi(5), Delay(100)]);
        assert_eq!(ctrl.mmio().events, expected);
    }

    #[test]
    fn test_sector_erase() {
        let mut ctrl = SmcController::new(Recorder::new(&[0x02, 0x00]));
        ctrl.sector_erase(WINDOW, 2, 0x05_0000).unwrap();

        let mut expected = wren_events(2, 1);
        expected.extend([lo(2), Delay(100), Byte(0xD8), Delay(10)]);
        expected.extend([Byte(0x05), Delay(10), Byte(0x00), Delay(10), Byte(0x00), Delay(10)]);
        expected.extend([hi(2), Delay(100)]);
        expected.extend([lo(2), Delay(100), Byte(0x05), Delay(10), Poll, hi(2), Delay(100)]);
        assert_eq!(ctrl.mmio().events, expected);
    }

    #[test]
    fn test_reset() {
        let mut ctrl = SmcController::new(Recorder::new(&[]));
        ctrl.reset(5, 1);
        assert_eq!(
            ctrl.mmio().events,
            vec![Ctrl(0x000B_0000 | 0x500 | 0x40 | 0x05), Delay(100)]
        );
    }

    #[test]
    fn test_poll_limit_timeout_raises_cs() {
        let mut rec = Recorder::new(&[0x02]);
        rec.idle_status = 0x03; // busy forever
        let mut ctrl = SmcController::new(rec).with_poll_limit(PollLimit::Iterations(4));
        let err = ctrl.sector_erase(WINDOW, 2, 0).unwrap_err();
        assert_eq!(err, Error::Timeout);

        let events = &ctrl.mmio().events;
        assert_eq!(events.iter().filter(|e| **e == Poll).count(), 1 + 4);
        assert_eq!(&events[events.len() - 2..], &[hi(2), Delay(100)]);
    }

    #[test]
    fn test_core_clock_from_strap() {
        let mut rec = Recorder::new(&[]);
        rec.strap = 0x1000;
        let mut ctrl = SmcController::new(rec);
        assert_eq!(ctrl.core_clock_mhz(), 133);
    }

    #[test]
    fn test_poll_limit_from_option() {
        assert_eq!(PollLimit::from_option(None), PollLimit::Unbounded);
        assert_eq!(PollLimit::from_option(Some(7)), PollLimit::Iterations(7));
    }
}
