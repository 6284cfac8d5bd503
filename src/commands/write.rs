//! Write command

use std::fs;
use std::path::Path;

use super::read::{read_range, resolve_range};
use super::IndicatifProgress;
use crate::Flash;

/// Program a file into flash, optionally erasing first and verifying after
pub fn run_write(
    flash: &mut Flash,
    input: &Path,
    bank: usize,
    start: Option<u32>,
    erase: bool,
    verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    if data.is_empty() {
        return Err(format!("{:?} is empty", input).into());
    }
    let (start, _) = resolve_range(flash, bank, start, Some(data.len() as u32))?;
    log::info!("Writing {} bytes to 0x{:08X}", data.len(), start);

    if erase {
        erase_covering(flash, start, data.len())?;
    }

    let mut progress = IndicatifProgress::new("Write complete");
    flash.write(start, &data, &mut progress)?;

    if verify {
        let readback = read_range(flash, start, data.len())?;
        if let Some(pos) = data.iter().zip(&readback).position(|(a, b)| a != b) {
            return Err(format!(
                "Verification failed at 0x{:08X}: expected 0x{:02X}, found 0x{:02X}",
                start + pos as u32,
                data[pos],
                readback[pos]
            )
            .into());
        }
        println!("Verification passed");
    }

    println!("Wrote {} bytes from {:?}", data.len(), input);
    Ok(())
}

/// Erase every sector overlapping `len` bytes at `start`
fn erase_covering(flash: &mut Flash, start: u32, len: usize) -> Result<(), Box<dyn std::error::Error>> {
    let bank = flash
        .find_bank(start)
        .ok_or_else(|| format!("No flash bank contains address 0x{:08X}", start))?;

    // Refuse before erasing anything
    if let Some(sector) = bank.first_protected_in(start, len) {
        return Err(smcflash_core::Error::RegionProtected { sector }.into());
    }

    let (index, first, last) = match (
        bank.find_sector(start),
        bank.find_sector(start + len as u32 - 1),
    ) {
        (Some(first), Some(last)) => (bank.index(), first, last),
        _ => return Err(smcflash_core::Error::AddressOutOfBounds.into()),
    };

    let mut progress = IndicatifProgress::new("Erase complete");
    flash.erase(index, first as i32, last as i32, &mut progress)?;
    Ok(())
}
