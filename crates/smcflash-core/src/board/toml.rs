//! TOML board configuration files
//!
//! ```toml
//! [board]
//! banks = [0x14000000]
//! poll_limit = 1000000
//!
//! [monitor]
//! start = 0x14000000
//! length = "0x40000"
//!
//! [env]
//! start = 0x14060000
//! length = 0x10000
//! ```
//!
//! Numbers may be TOML integers or strings in hex (`0x...`) or decimal.

use std::fs;
use std::path::Path;
use std::string::String;
use std::vec::Vec;
use std::format;

use thiserror::Error;

use super::{BoardConfig, Region, MAX_BANKS};

/// Errors loading a board configuration
#[derive(Debug, Error)]
pub enum BoardConfigError {
    /// The file could not be read
    #[error("failed to read board config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML or has the wrong shape
    #[error("failed to parse board config: {0}")]
    Parse(#[from] ::toml::de::Error),

    /// No bank listed
    #[error("board config lists no flash banks")]
    NoBanks,

    /// More banks than the controller supports
    #[error("board config lists {count} flash banks, at most {max} supported")]
    TooManyBanks {
        /// Banks listed
        count: usize,
        /// Banks supported
        max: usize,
    },
}

#[derive(Debug, serde::Deserialize)]
struct TomlBoardFile {
    #[serde(default)]
    board: Option<TomlBoard>,
    monitor: Option<TomlRegion>,
    env: Option<TomlRegion>,
    env_redundant: Option<TomlRegion>,
}

#[derive(Debug, serde::Deserialize)]
struct TomlBoard {
    #[serde(default, deserialize_with = "deserialize_hex_u32_list")]
    banks: Option<Vec<u32>>,
    #[serde(default, deserialize_with = "deserialize_hex_u32_opt")]
    poll_limit: Option<u32>,
}

#[derive(Debug, serde::Deserialize)]
struct TomlRegion {
    #[serde(deserialize_with = "deserialize_hex_u32")]
    start: u32,
    #[serde(deserialize_with = "deserialize_hex_u32")]
    length: u32,
}

impl From<TomlRegion> for Region {
    fn from(r: TomlRegion) -> Self {
        Region::new(r.start, r.length)
    }
}

/// A number written as a TOML integer or as a string
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum HexOrInt {
    Int(u32),
    Str(String),
}

impl HexOrInt {
    fn value(self) -> Result<u32, String> {
        match self {
            Self::Int(n) => Ok(n),
            Self::Str(s) => parse_number(&s),
        }
    }
}

fn deserialize_hex_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    HexOrInt::deserialize(deserializer)?
        .value()
        .map_err(serde::de::Error::custom)
}

fn deserialize_hex_u32_opt<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_hex_u32(deserializer).map(Some)
}

fn deserialize_hex_u32_list<'de, D>(deserializer: D) -> Result<Option<Vec<u32>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    Vec::<HexOrInt>::deserialize(deserializer)?
        .into_iter()
        .map(|n| n.value().map_err(serde::de::Error::custom))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Parse a number that can be hex (0x...) or decimal
fn parse_number(s: &str) -> Result<u32, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("invalid hex: {}", e))
    } else {
        s.parse().map_err(|e| format!("invalid number: {}", e))
    }
}

impl BoardConfig {
    /// Load a board configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, BoardConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a board configuration from a TOML string
    ///
    /// A missing `[board]` table or `banks` key keeps the default single
    /// bank.
    pub fn from_toml_str(content: &str) -> Result<Self, BoardConfigError> {
        let file: TomlBoardFile = ::toml::from_str(content)?;
        let mut config = BoardConfig::default();

        if let Some(board) = file.board {
            if let Some(banks) = board.banks {
                if banks.is_empty() {
                    return Err(BoardConfigError::NoBanks);
                }
                config.banks = heapless::Vec::from_slice(&banks).map_err(|_| {
                    BoardConfigError::TooManyBanks {
                        count: banks.len(),
                        max: MAX_BANKS,
                    }
                })?;
            }
            config.poll_limit = board.poll_limit;
        }

        config.monitor = file.monitor.map(Region::from);
        config.env = file.env.map(Region::from);
        config.env_redundant = file.env_redundant.map(Region::from);

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config() {
        let cfg = BoardConfig::from_toml_str(
            r#"
            [board]
            banks = [0x14000000, "0x15000000"]
            poll_limit = 1000

            [monitor]
            start = 0x14000000
            length = "0x40000"

            [env]
            start = "0x14060000"
            length = 65536

            [env_redundant]
            start = 0x14070000
            length = 0x10000
            "#,
        )
        .unwrap();

        assert_eq!(cfg.banks.as_slice(), &[0x1400_0000, 0x1500_0000]);
        assert_eq!(cfg.poll_limit, Some(1000));
        assert_eq!(cfg.monitor, Some(Region::new(0x1400_0000, 0x4_0000)));
        assert_eq!(cfg.env, Some(Region::new(0x1406_0000, 0x1_0000)));
        assert_eq!(cfg.env_redundant, Some(Region::new(0x1407_0000, 0x1_0000)));
    }

    #[test]
    fn test_empty_file_is_default() {
        let cfg = BoardConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, BoardConfig::default());
    }

    #[test]
    fn test_too_many_banks() {
        let err = BoardConfig::from_toml_str("[board]\nbanks = [0, 1, 2]\n").unwrap_err();
        assert!(matches!(err, BoardConfigError::TooManyBanks { count: 3, max: 2 }));
    }

    #[test]
    fn test_no_banks() {
        let err = BoardConfig::from_toml_str("[board]\nbanks = []\n").unwrap_err();
        assert!(matches!(err, BoardConfigError::NoBanks));
    }

    #[test]
    fn test_bad_hex() {
        let err = BoardConfig::from_toml_str("[monitor]\nstart = \"0xZZ\"\nlength = 1\n")
            .unwrap_err();
        assert!(matches!(err, BoardConfigError::Parse(_)));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("0x1000"), Ok(0x1000));
        assert_eq!(parse_number("0X10"), Ok(16));
        assert_eq!(parse_number(" 42 "), Ok(42));
        assert!(parse_number("forty").is_err());
    }
}
