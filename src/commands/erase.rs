//! Erase command

use super::IndicatifProgress;
use crate::Flash;

/// Erase sectors `first..=last` of one bank
pub fn run_erase(
    flash: &mut Flash,
    bank: usize,
    first: i32,
    last: i32,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut progress = IndicatifProgress::new("Erase complete");
    let report = flash.erase(bank, first, last, &mut progress)?;

    if report.skipped > 0 {
        println!(
            "Erased {} sectors, skipped {} protected",
            report.erased, report.skipped
        );
    } else {
        println!("Erased {} sectors", report.erased);
    }
    Ok(())
}
