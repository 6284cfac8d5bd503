//! CLI command implementations
//!
//! Every command that touches hardware receives the identified
//! [`Flash`](crate::Flash) banks; addresses on the command line are
//! absolute bus addresses.

pub mod erase;
mod list;
pub mod probe;
mod progress;
pub mod protect;
pub mod read;
pub mod write;

pub use list::{list_backends, list_chips};
pub use progress::IndicatifProgress;

use smcflash_core::flash::FlashBank;

use crate::Flash;

/// Look up a bank that holds an identified part
pub(crate) fn present_bank(flash: &Flash, index: usize) -> Result<&FlashBank, Box<dyn std::error::Error>> {
    match flash.bank(index) {
        Some(bank) if bank.is_present() => Ok(bank),
        Some(bank) => Err(format!("No supported flash in bank {} (id {})", index, bank.id()).into()),
        None => Err(format!("Bank {} is not configured", index).into()),
    }
}

pub(crate) fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(64 * 1024), "64 KiB");
        assert_eq!(format_size(2 * 1024 * 1024), "2 MiB");
    }
}
