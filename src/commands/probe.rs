//! Probe and info commands

use std::fmt::Write as _;

use smcflash_core::flash::{flash_print_info, FlashBank};
use smcflash_core::smc::clock::spi_clock_mhz;

use super::format_size;
use crate::Flash;

/// Sectors printed per line of the sector table
const SECTORS_PER_LINE: usize = 5;

/// Show the part found in every bank
pub fn run_probe(flash: &Flash) {
    for bank in flash.banks() {
        if bank.is_present() {
            println!(
                "Bank {}: {} {} ({}) at 0x{:08X}, JEDEC ID {}",
                bank.index(),
                bank.part().map_or("", |p| p.vendor),
                bank.name(),
                format_size(bank.size() as u64),
                bank.base(),
                bank.id()
            );
        } else {
            println!(
                "Bank {}: no supported flash at 0x{:08X} (JEDEC ID {})",
                bank.index(),
                bank.base(),
                bank.id()
            );
        }
    }
    println!("Total flash: {}", format_size(flash.total_size()));
}

/// Show geometry, clock calibration and the sector table of every bank
pub fn run_info(flash: &mut Flash) -> Result<(), Box<dyn std::error::Error>> {
    let core_mhz = flash.controller_mut().core_clock_mhz();
    println!("SMC core clock: {} MHz", core_mhz);
    for bank in flash.banks() {
        print!("{}", bank_info(bank, Some(core_mhz))?);
    }
    Ok(())
}

/// Render one bank, optionally with the SPI clocks for a core clock
pub(crate) fn bank_info(bank: &FlashBank, core_mhz: Option<u32>) -> Result<String, std::fmt::Error> {
    let mut out = String::new();

    writeln!(out, "Bank #{}: {} at 0x{:08X}", bank.index(), bank.name(), bank.base())?;
    writeln!(out, "  JEDEC ID:    {}", bank.id())?;
    if !bank.is_present() {
        return Ok(out);
    }

    writeln!(
        out,
        "  Size:        {} in {} sectors of {}",
        format_size(bank.size() as u64),
        bank.sector_count(),
        format_size(bank.sector_size() as u64)
    )?;
    let timing = bank.timing();
    write!(
        out,
        "  Divisors:    write {}, erase {}, read {}",
        timing.write, timing.erase, timing.read
    )?;
    if let Some(core) = core_mhz {
        write!(
            out,
            " ({}/{}/{} MHz)",
            spi_clock_mhz(core, timing.write),
            spi_clock_mhz(core, timing.erase),
            spi_clock_mhz(core, timing.read)
        )?;
    }
    writeln!(out)?;
    writeln!(out, "  Sector start addresses:")?;

    for (i, sector) in bank.sectors().enumerate() {
        if i % SECTORS_PER_LINE == 0 {
            out.push_str("   ");
        }
        write!(
            out,
            " {:08X}{}",
            sector.start,
            if sector.protected { " RO" } else { "   " }
        )?;
        if i % SECTORS_PER_LINE == SECTORS_PER_LINE - 1 {
            writeln!(out)?;
        }
    }
    if bank.sector_count() % SECTORS_PER_LINE != 0 {
        writeln!(out)?;
    }

    flash_print_info(bank, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smcflash_core::chip::find_part_by_name;
    use smcflash_core::smc::Timing;

    #[test]
    fn test_bank_info_marks_protected() {
        let part = find_part_by_name("W25X16").unwrap();
        let timing = Timing {
            write: 5,
            erase: 2,
            read: 5,
        };
        let mut bank = FlashBank::new(0, 0x1400_0000, part.id, Some(part), timing);
        bank.set_protected(1, true);

        let text = bank_info(&bank, Some(266)).unwrap();
        assert!(text.contains("Bank #0: W25X16 at 0x14000000"));
        assert!(text.contains("32 sectors of 64 KiB"));
        assert!(text.contains("write 5, erase 2, read 5 (44/22/44 MHz)"));
        assert!(text.contains(" 14010000 RO"));
        assert!(text.contains(" 14000000   "));
        assert!(text.ends_with("\n\n"));
    }

    #[test]
    fn test_bank_info_unknown_part() {
        let id = smcflash_core::chip::JedecId::from_word(0x123456);
        let bank = FlashBank::new(1, 0x1000_0000, id, None, Timing::default());
        let text = bank_info(&bank, None).unwrap();
        assert!(text.contains("Bank #1: unknown"));
        assert!(!text.contains("Sector"));
    }
}
