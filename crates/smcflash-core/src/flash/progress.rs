//! Progress reporting for long-running flash operations

/// Callback for progress reporting during erase and write
pub trait FlashProgress {
    /// Called before the first sector is erased
    fn erasing(&mut self, sectors_to_erase: usize);

    /// Called after each sector is erased
    fn sector_erased(&mut self, sector: usize);

    /// Called before the first page is programmed
    fn writing(&mut self, bytes_to_write: usize);

    /// Called after each page program with the running byte count
    fn write_progress(&mut self, bytes_written: usize);

    /// Called when the operation is complete
    fn complete(&mut self);
}

/// A no-op progress reporter
pub struct NoProgress;

impl FlashProgress for NoProgress {
    fn erasing(&mut self, _sectors_to_erase: usize) {}
    fn sector_erased(&mut self, _sector: usize) {}
    fn writing(&mut self, _bytes_to_write: usize) {}
    fn write_progress(&mut self, _bytes_written: usize) {}
    fn complete(&mut self) {}
}
