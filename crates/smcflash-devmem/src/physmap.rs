//! Physical memory windows mapped through /dev/mem
//!
//! # Safety
//!
//! Accessing physical memory is inherently unsafe and requires root
//! privileges. Each window checks offsets against its own size in debug
//! builds; callers resolve absolute addresses to a window first.

use std::fs::File;

use crate::error::{DevMemError, Result};

/// A mapped range of physical memory
#[cfg(target_os = "linux")]
pub struct PhysMap {
    /// Pointer to `phys_addr` inside the mapping
    ptr: *mut u8,
    /// Bytes usable from `ptr`
    len: usize,
    /// Length passed to mmap
    map_size: usize,
    /// Distance from the page-aligned mmap start to `ptr`
    page_offset: usize,
    phys_addr: u64,
}

#[cfg(target_os = "linux")]
impl PhysMap {
    /// Map `len` bytes at `phys_addr` from an open /dev/mem
    pub fn new(mem: &File, phys_addr: u64, len: usize) -> Result<Self> {
        use std::os::unix::io::AsRawFd;

        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
        let page_mask = page_size - 1;
        let page_offset = (phys_addr as usize) & page_mask;
        let aligned_addr = phys_addr & !(page_mask as u64);
        let map_size = (len + page_offset + page_mask) & !page_mask;

        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                map_size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                mem.as_raw_fd(),
                aligned_addr as libc::off_t,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(DevMemError::MemoryMap {
                address: phys_addr,
                size: len,
                source: std::io::Error::last_os_error(),
            });
        }

        log::debug!("Mapped 0x{:08X}+0x{:X}", phys_addr, len);

        Ok(Self {
            ptr: unsafe { (ptr as *mut u8).add(page_offset) },
            len,
            map_size,
            page_offset,
            phys_addr,
        })
    }

    /// True if `addr..addr + width` lies in this window
    pub fn covers(&self, addr: u64, width: usize) -> bool {
        addr >= self.phys_addr && addr - self.phys_addr + width as u64 <= self.len as u64
    }

    /// Physical address of the first mapped byte
    pub fn phys_addr(&self) -> u64 {
        self.phys_addr
    }

    #[inline]
    pub fn read8(&self, offset: usize) -> u8 {
        debug_assert!(offset < self.len);
        unsafe { core::ptr::read_volatile(self.ptr.add(offset)) }
    }

    #[inline]
    pub fn read32(&self, offset: usize) -> u32 {
        debug_assert!(offset + 4 <= self.len);
        debug_assert!(offset & 3 == 0, "unaligned 32-bit read");
        unsafe { core::ptr::read_volatile(self.ptr.add(offset) as *const u32) }
    }

    #[inline]
    pub fn write8(&self, offset: usize, value: u8) {
        debug_assert!(offset < self.len);
        unsafe { core::ptr::write_volatile(self.ptr.add(offset), value) }
    }

    #[inline]
    pub fn write32(&self, offset: usize, value: u32) {
        debug_assert!(offset + 4 <= self.len);
        debug_assert!(offset & 3 == 0, "unaligned 32-bit write");
        unsafe { core::ptr::write_volatile(self.ptr.add(offset) as *mut u32, value) }
    }
}

#[cfg(target_os = "linux")]
impl Drop for PhysMap {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(
                self.ptr.sub(self.page_offset) as *mut libc::c_void,
                self.map_size,
            );
        }
    }
}

// MMIO windows have no aliasing concerns beyond the volatile accesses above
#[cfg(target_os = "linux")]
unsafe impl Send for PhysMap {}

// Stub for non-Linux platforms
#[cfg(not(target_os = "linux"))]
pub struct PhysMap {
    _private: (),
}

#[cfg(not(target_os = "linux"))]
impl PhysMap {
    pub fn new(_mem: &File, _phys_addr: u64, _len: usize) -> Result<Self> {
        Err(DevMemError::NotSupported)
    }

    pub fn covers(&self, _addr: u64, _width: usize) -> bool {
        false
    }
    pub fn phys_addr(&self) -> u64 {
        0
    }
    pub fn read8(&self, _offset: usize) -> u8 {
        0xFF
    }
    pub fn read32(&self, _offset: usize) -> u32 {
        0xFFFF_FFFF
    }
    pub fn write8(&self, _offset: usize, _value: u8) {}
    pub fn write32(&self, _offset: usize, _value: u32) {}
}
