//! Backend registration and dispatch
//!
//! A backend provides the raw register access the SMC driver runs on:
//! real hardware through /dev/mem, or a simulated board.

use smcflash_core::board::BoardConfig;
use smcflash_core::Mmio;

/// Register access handed to the driver
pub type BoxedMmio = Box<dyn Mmio + Send>;

/// Information about a backend
pub struct BackendInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available backends (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_backends() -> Vec<BackendInfo> {
    let mut backends = Vec::new();

    #[cfg(feature = "devmem")]
    backends.push(BackendInfo {
        name: "devmem",
        aliases: &["internal"],
        description: "AST2050 registers through /dev/mem (size=<window bytes>) - requires root",
    });

    #[cfg(feature = "dummy")]
    backends.push(BackendInfo {
        name: "dummy",
        aliases: &[],
        description: "Simulated SMC with an in-memory flash (chip=<name>,id=<hex>,base=<addr>,strap=<hex>,busy=<n>)",
    });

    backends
}

/// Generate help text listing all available backends
pub fn backend_help() -> String {
    let backends = available_backends();

    if backends.is_empty() {
        return "No backends available (recompile with backend features enabled)".to_string();
    }

    let mut help = String::from("Available backends:\n");
    for b in &backends {
        help.push_str(&format!("  {:8} - {}\n", b.name, b.description));
    }
    help
}

/// Generate a short list of backend names for CLI help
pub fn backend_names_short() -> String {
    let backends = available_backends();
    let names: Vec<&str> = backends.iter().map(|b| b.name).collect();
    names.join(", ")
}

/// Resolve a name or alias to the canonical backend name
pub fn find_backend(name: &str) -> Option<&'static str> {
    available_backends()
        .into_iter()
        .find(|b| b.name == name || b.aliases.contains(&name))
        .map(|b| b.name)
}

/// Parse a backend string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_backend_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

/// Open the backend described by `backend` for the banks of `board`
#[allow(unused_variables)]
pub fn open_backend(
    backend: &str,
    board: &BoardConfig,
) -> Result<BoxedMmio, Box<dyn std::error::Error>> {
    let (name, options) = parse_backend_string(backend);

    let canonical_name = match find_backend(name) {
        Some(n) => n,
        None => return Err(unknown_backend_error(name)),
    };

    match canonical_name {
        #[cfg(feature = "devmem")]
        "devmem" => {
            let config = smcflash_devmem::parse_options(&options)
                .map_err(|e| format!("Invalid devmem parameters: {}", e))?;
            log::info!("Opening /dev/mem backend...");
            let mem = smcflash_devmem::DevMem::open(&board.banks, &config).map_err(|e| {
                format!(
                    "Failed to open /dev/mem: {}\n\
                     Make sure you are root and the kernel allows /dev/mem access.",
                    e
                )
            })?;
            Ok(Box::new(mem))
        }

        #[cfg(feature = "dummy")]
        "dummy" => {
            let config = smcflash_dummy::parse_options(&options)
                .map_err(|e| format!("Invalid dummy parameters: {}", e))?;
            if !board.banks.contains(&config.flash_base) {
                log::warn!(
                    "dummy: simulated flash at 0x{:08X} is not a configured bank",
                    config.flash_base
                );
            }
            Ok(Box::new(smcflash_dummy::DummySmc::new(config)))
        }

        _ => Err(unknown_backend_error(name)),
    }
}

fn unknown_backend_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown backend: {}\n\n", name);
    msg.push_str(&backend_help());
    msg.push_str("\nUse 'smcflash list-backends' for more details");
    msg.into()
}
