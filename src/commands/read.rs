//! Read command

use std::fs;
use std::path::Path;

use super::{present_bank, progress::bytes_bar};
use crate::Flash;

/// Bytes per read call, so progress can be shown
const READ_CHUNK: usize = 64 * 1024;

/// Resolve the absolute range a read or write covers
///
/// Without `start` the range begins at the base of `bank`. Without
/// `length` it runs to the end of the bank holding `start`.
pub(crate) fn resolve_range(
    flash: &Flash,
    bank: usize,
    start: Option<u32>,
    length: Option<u32>,
) -> Result<(u32, usize), Box<dyn std::error::Error>> {
    let start = match start {
        Some(addr) => addr,
        None => present_bank(flash, bank)?.base(),
    };
    let holder = flash
        .find_bank(start)
        .ok_or_else(|| format!("No flash bank contains address 0x{:08X}", start))?;
    let available = (holder.base() as u64 + holder.size() as u64 - start as u64) as usize;

    let length = match length {
        Some(len) if len as usize > available => {
            return Err(format!(
                "0x{:X} bytes at 0x{:08X} run past the end of bank {}",
                len,
                start,
                holder.index()
            )
            .into())
        }
        Some(len) => len as usize,
        None => available,
    };
    Ok((start, length))
}

/// Read a flash range into a file
pub fn run_read(
    flash: &mut Flash,
    output: &Path,
    bank: usize,
    start: Option<u32>,
    length: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (start, length) = resolve_range(flash, bank, start, length)?;
    log::info!("Reading 0x{:X} bytes from 0x{:08X}", length, start);

    let data = read_range(flash, start, length)?;
    fs::write(output, &data)?;

    println!("Read {} bytes to {:?}", data.len(), output);
    Ok(())
}

/// Read `length` bytes at `start` with a progress bar
pub(crate) fn read_range(
    flash: &mut Flash,
    start: u32,
    length: usize,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut data = vec![0u8; length];
    let pb = bytes_bar(length as u64);

    let mut offset = 0;
    for chunk in data.chunks_mut(READ_CHUNK) {
        flash.read(start + offset as u32, chunk)?;
        offset += chunk.len();
        pb.set_position(offset as u64);
    }

    pb.finish_with_message("Read complete");
    Ok(data)
}
