//! Backend option parsing (`dummy:chip=W25X32,strap=0x1000`)

use thiserror::Error;

use smcflash_core::chip::{find_part_by_name, JedecId};

use crate::DummyConfig;

/// Errors in dummy backend options
#[derive(Debug, Error)]
pub enum DummyError {
    /// Chip name not in the part table
    #[error("Unknown chip: {0}")]
    UnknownChip(String),

    /// Value could not be parsed
    #[error("Invalid value for {key}: {value}")]
    InvalidValue {
        /// Option name
        key: String,
        /// Offending value
        value: String,
    },
}

fn parse_u32(key: &str, value: &str) -> Result<u32, DummyError> {
    let v = value.trim();
    let parsed = match v.strip_prefix("0x").or_else(|| v.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => v.parse(),
    };
    parsed.map_err(|_| DummyError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Build a [`DummyConfig`] from `key=value` options
///
/// - `chip=<name>`: simulate a part from the table
/// - `id=<hex>`: override the JEDEC ID (an unknown ID simulates an unsupported part)
/// - `base=<addr>`: flash window base
/// - `strap=<value>`: SCU hardware strapping register
/// - `busy=<n>`: busy status reads after each program or erase
pub fn parse_options(options: &[(&str, &str)]) -> Result<DummyConfig, DummyError> {
    let mut config = DummyConfig::default();

    // The chip sets geometry, so apply it before any override
    if let Some((_, name)) = options.iter().find(|(k, _)| *k == "chip") {
        let part = find_part_by_name(name).ok_or_else(|| DummyError::UnknownChip(name.to_string()))?;
        config = DummyConfig::for_part(part, config.flash_base);
    }

    for (key, value) in options {
        match *key {
            "chip" => {}
            "id" => config.id = JedecId::from_word(parse_u32(key, value)?),
            "base" => config.flash_base = parse_u32(key, value)?,
            "strap" => config.scu_strap = parse_u32(key, value)?,
            "busy" => config.busy_polls = parse_u32(key, value)?,
            _ => log::warn!("dummy: Unknown option: {}={}", key, value),
        }
    }

    Ok(config)
}
