//! smcflash-devmem - Run the SMC driver on a live BMC through /dev/mem
//!
//! The SMC register block, the SCU register block and every flash data
//! window are mapped once at open time. [`DevMem`] then implements
//! [`Mmio`] by routing each absolute address to its window.
//!
//! Requires root privileges and a kernel that allows /dev/mem access to
//! the ranges involved (`CONFIG_STRICT_DEVMEM` may need to be off).

mod error;
mod physmap;

pub use error::{DevMemError, Result};

use std::fs::File;

use smcflash_core::regs::{SCU_BASE, SMC_BASE};
use smcflash_core::Mmio;

use physmap::PhysMap;

/// Size mapped for each register block
const REG_WINDOW_SIZE: usize = 0x100;

/// Default size mapped for each flash data window (largest supported part)
pub const DEFAULT_WINDOW_SIZE: usize = 0x100_0000;

/// Backend configuration
#[derive(Debug, Clone)]
pub struct DevMemConfig {
    /// Bytes mapped per flash data window
    pub window_size: usize,
}

impl Default for DevMemConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Parse backend options from a list of key-value pairs
///
/// - `size=<bytes>`: bytes to map per flash window (hex with `0x` or decimal)
pub fn parse_options(options: &[(&str, &str)]) -> Result<DevMemConfig> {
    let mut config = DevMemConfig::default();

    for (key, value) in options {
        match *key {
            "size" => {
                let v = value.trim();
                let size = match v.strip_prefix("0x").or_else(|| v.strip_prefix("0X")) {
                    Some(hex) => usize::from_str_radix(hex, 16),
                    None => v.parse(),
                }
                .map_err(|_| DevMemError::InvalidParameter(format!("size={}", value)))?;
                if size == 0 {
                    return Err(DevMemError::InvalidParameter("size must not be 0".into()));
                }
                config.window_size = size;
            }
            _ => log::warn!("devmem: Unknown option: {}={}", key, value),
        }
    }

    Ok(config)
}

#[cfg(target_os = "linux")]
fn open_dev_mem() -> Result<File> {
    use std::fs::OpenOptions;
    use std::os::unix::fs::OpenOptionsExt;

    // O_SYNC for uncached access
    OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_SYNC)
        .open("/dev/mem")
        .map_err(DevMemError::Open)
}

#[cfg(not(target_os = "linux"))]
fn open_dev_mem() -> Result<File> {
    Err(DevMemError::NotSupported)
}

/// Physical memory access to the SMC, the SCU and the flash windows
pub struct DevMem {
    windows: Vec<PhysMap>,
}

impl DevMem {
    /// Map the controller registers and one data window per flash bank
    pub fn open(flash_bases: &[u32], config: &DevMemConfig) -> Result<Self> {
        let mem = open_dev_mem()?;

        let mut windows = vec![
            PhysMap::new(&mem, SMC_BASE as u64, REG_WINDOW_SIZE)?,
            PhysMap::new(&mem, SCU_BASE as u64, REG_WINDOW_SIZE)?,
        ];
        for &base in flash_bases {
            windows.push(PhysMap::new(&mem, base as u64, config.window_size)?);
        }

        log::info!(
            "Mapped SMC, SCU and {} flash window(s) through /dev/mem",
            flash_bases.len()
        );
        Ok(Self { windows })
    }

    fn window(&self, addr: u32, width: usize) -> Option<(&PhysMap, usize)> {
        let addr = addr as u64;
        self.windows
            .iter()
            .find(|w| w.covers(addr, width))
            .map(|w| (w, (addr - w.phys_addr()) as usize))
    }
}

impl Mmio for DevMem {
    fn read8(&mut self, addr: u32) -> u8 {
        match self.window(addr, 1) {
            Some((w, offset)) => w.read8(offset),
            None => {
                log::error!("devmem: read8 from unmapped address 0x{:08X}", addr);
                0xFF
            }
        }
    }

    fn read32(&mut self, addr: u32) -> u32 {
        match self.window(addr, 4) {
            Some((w, offset)) => w.read32(offset),
            None => {
                log::error!("devmem: read32 from unmapped address 0x{:08X}", addr);
                0xFFFF_FFFF
            }
        }
    }

    fn write8(&mut self, addr: u32, value: u8) {
        match self.window(addr, 1) {
            Some((w, offset)) => w.write8(offset, value),
            None => log::error!("devmem: write8 to unmapped address 0x{:08X}", addr),
        }
    }

    fn write32(&mut self, addr: u32, value: u32) {
        match self.window(addr, 4) {
            Some((w, offset)) => w.write32(offset, value),
            None => log::error!("devmem: write32 to unmapped address 0x{:08X}", addr),
        }
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(us as u64));
    }
}
