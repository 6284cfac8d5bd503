//! List commands implementation

use smcflash_core::chip::PARTS;

use super::format_size;
use crate::backends::available_backends;

/// List all available backends
pub fn list_backends() {
    let backends = available_backends();
    if backends.is_empty() {
        println!("No backends compiled in.");
        return;
    }

    println!("Available backends:");
    println!();
    for b in &backends {
        if b.aliases.is_empty() {
            println!("  {:8} - {}", b.name, b.description);
        } else {
            println!(
                "  {:8} - {} (aliases: {})",
                b.name,
                b.description,
                b.aliases.join(", ")
            );
        }
    }
}

/// List all supported flash parts
pub fn list_chips(vendor_filter: Option<&str>) {
    println!("Supported flash chips:");
    println!();
    println!(
        "{:<12} {:<14} {:>8} {:>8} {:>9} {:>14}",
        "Vendor", "Name", "Size", "Sectors", "JEDEC ID", "Clocks W/E/R"
    );
    println!("{}", "-".repeat(70));

    for part in PARTS {
        if let Some(vendor) = vendor_filter {
            if !part.vendor.to_lowercase().contains(&vendor.to_lowercase()) {
                continue;
            }
        }

        println!(
            "{:<12} {:<14} {:>8} {:>8} {:>9} {:>14}",
            part.vendor,
            part.name,
            format_size(part.size as u64),
            part.sector_count,
            part.id,
            format!(
                "{}/{}/{} MHz",
                part.clocks.write_mhz, part.clocks.erase_mhz, part.clocks.read_mhz
            )
        );
    }
}
