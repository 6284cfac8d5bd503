//! smcflash - SPI flash tool for the ASPEED AST2050 static memory controller
//!
//! Identifies the flash parts behind the SMC, then reads, programs and
//! erases them with the controller's bit-banged user mode.
//!
//! # Architecture
//!
//! A backend provides raw register access (`devmem` on a live BMC, `dummy`
//! for a simulated board). The core's `SmcController` sequences SPI
//! commands over it and `FlashBanks` applies the board configuration.

mod backends;
mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use smcflash_core::board::BoardConfig;
use smcflash_core::flash::FlashBanks;
use smcflash_core::smc::SmcController;

use backends::BoxedMmio;

/// Flash banks driven through a runtime-selected backend
pub type Flash = FlashBanks<BoxedMmio>;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let board = load_board_config(&cli)?;

    let result = match cli.command {
        Commands::Probe { backend } => {
            let flash = open_flash(&backend, &board)?;
            commands::probe::run_probe(&flash);
            Ok(())
        }
        Commands::Info { backend } => {
            let mut flash = open_flash(&backend, &board)?;
            commands::probe::run_info(&mut flash)
        }
        Commands::Read {
            backend,
            output,
            bank,
            start,
            length,
        } => {
            let mut flash = open_flash(&backend, &board)?;
            commands::read::run_read(&mut flash, &output, bank, start, length)
        }
        Commands::Write {
            backend,
            input,
            bank,
            start,
            erase,
            verify,
        } => {
            let mut flash = open_flash(&backend, &board)?;
            commands::write::run_write(&mut flash, &input, bank, start, erase, verify)
        }
        Commands::Erase {
            backend,
            bank,
            first,
            last,
        } => {
            let mut flash = open_flash(&backend, &board)?;
            commands::erase::run_erase(&mut flash, bank, first, last)
        }
        Commands::Protect {
            backend,
            start,
            end,
            off,
        } => {
            let mut flash = open_flash(&backend, &board)?;
            commands::protect::run_protect(&mut flash, start, end, !off)
        }
        Commands::ListChips { vendor } => {
            commands::list_chips(vendor.as_deref());
            Ok(())
        }
        Commands::ListBackends => {
            commands::list_backends();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Board configuration from `--config`, with command line overrides
fn load_board_config(cli: &Cli) -> Result<BoardConfig, Box<dyn std::error::Error>> {
    let mut board = match &cli.config {
        Some(path) => {
            log::debug!("Loading board configuration from {}", path.display());
            BoardConfig::from_toml_file(path)
                .map_err(|e| format!("Failed to load {}: {}", path.display(), e))?
        }
        None => BoardConfig::default(),
    };

    if let Some(limit) = cli.poll_limit {
        board.poll_limit = Some(limit);
    }

    Ok(board)
}

/// Open a backend and identify every configured bank
fn open_flash(backend: &str, board: &BoardConfig) -> Result<Flash, Box<dyn std::error::Error>> {
    let mmio = backends::open_backend(backend, board)?;
    let ctrl = SmcController::new(mmio);
    Ok(FlashBanks::init(ctrl, board)?)
}
