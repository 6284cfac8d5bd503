//! CLI argument parsing

use crate::backends;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Generate dynamic help text for the backend argument
fn backend_help() -> String {
    format!(
        "Register access backend, optionally with parameters (name:key=value,...) [available: {}]",
        backends::backend_names_short()
    )
}

#[derive(Parser)]
#[command(name = "smcflash")]
#[command(author, version, about = "SPI flash tool for the ASPEED AST2050 static memory controller", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Board configuration file (TOML): bank bases and protected regions
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Give up on a busy flash after this many status polls
    #[arg(long, global = true)]
    pub poll_limit: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Identify the flash in every configured bank
    Probe {
        #[arg(short, long, help = backend_help(), default_value = "devmem")]
        backend: String,
    },

    /// Show bank geometry, clock calibration and the sector table
    Info {
        #[arg(short, long, help = backend_help(), default_value = "devmem")]
        backend: String,
    },

    /// Read flash contents to file
    Read {
        #[arg(short, long, help = backend_help(), default_value = "devmem")]
        backend: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Bank to read when no start address is given
        #[arg(long, default_value_t = 0)]
        bank: usize,

        /// Absolute start address (hex, e.g., 0x14000000)
        #[arg(long, value_parser = parse_hex_u32)]
        start: Option<u32>,

        /// Number of bytes (defaults to the rest of the bank)
        #[arg(long, value_parser = parse_hex_u32)]
        length: Option<u32>,
    },

    /// Program a file into flash
    Write {
        #[arg(short, long, help = backend_help(), default_value = "devmem")]
        backend: String,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Bank to write when no start address is given
        #[arg(long, default_value_t = 0)]
        bank: usize,

        /// Absolute start address (hex, e.g., 0x14100000)
        #[arg(long, value_parser = parse_hex_u32)]
        start: Option<u32>,

        /// Erase the covered sectors first
        #[arg(long)]
        erase: bool,

        /// Verify after writing
        #[arg(long, default_value = "true")]
        verify: bool,
    },

    /// Erase a sector range of one bank
    Erase {
        #[arg(short, long, help = backend_help(), default_value = "devmem")]
        backend: String,

        /// Bank number
        #[arg(long, default_value_t = 0)]
        bank: usize,

        /// First sector
        #[arg(long, allow_negative_numbers = true)]
        first: i32,

        /// Last sector (inclusive)
        #[arg(long, allow_negative_numbers = true)]
        last: i32,
    },

    /// Mark sectors protected (or unprotected) and show the result
    Protect {
        #[arg(short, long, help = backend_help(), default_value = "devmem")]
        backend: String,

        /// First address of the range (hex)
        #[arg(long, value_parser = parse_hex_u32)]
        start: u32,

        /// Last address of the range, inclusive (hex)
        #[arg(long, value_parser = parse_hex_u32)]
        end: u32,

        /// Clear protection instead of setting it
        #[arg(long)]
        off: bool,
    },

    /// List supported flash parts
    ListChips {
        /// Filter by vendor name
        #[arg(long)]
        vendor: Option<String>,
    },

    /// List available register access backends
    ListBackends,
}
