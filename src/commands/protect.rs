//! Protect command
//!
//! Protection lives in the driver's sector flags, not in the part's
//! status register, so it only lasts for this invocation. The command
//! shows the resulting sector tables.

use super::probe::bank_info;
use crate::Flash;

/// Set or clear protection on `[start, end]` and show the result
pub fn run_protect(
    flash: &mut Flash,
    start: u32,
    end: u32,
    protected: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let touched = flash.protect(protected, start, end)?;
    println!(
        "{} {} sectors in 0x{:08X}..=0x{:08X}",
        if protected { "Protected" } else { "Unprotected" },
        touched,
        start,
        end
    );

    for bank in flash.banks().iter().filter(|b| b.is_present()) {
        print!("{}", bank_info(bank, None)?);
    }
    Ok(())
}
