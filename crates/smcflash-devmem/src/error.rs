//! Error types for /dev/mem access

use thiserror::Error;

/// /dev/mem backend errors
#[derive(Debug, Error)]
pub enum DevMemError {
    /// /dev/mem could not be opened
    #[error("Failed to open /dev/mem: {0}")]
    Open(#[source] std::io::Error),

    /// mmap of a physical range failed
    #[error("Failed to map {size:#x} bytes at physical address {address:#010x}: {source}")]
    MemoryMap {
        address: u64,
        size: usize,
        #[source]
        source: std::io::Error,
    },

    /// Not available on this platform
    #[error("Physical memory mapping only supported on Linux")]
    NotSupported,

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for /dev/mem operations
pub type Result<T> = std::result::Result<T, DevMemError>;
