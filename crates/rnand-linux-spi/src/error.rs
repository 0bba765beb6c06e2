//! Error types for Linux spidev access

use thiserror::Error;

/// Linux spidev errors
#[derive(Debug, Error)]
pub enum LinuxSpiError {
    /// Failed to open device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A spidev setup ioctl was rejected
    #[error("Failed to set {setting} to {value}: {source}")]
    ConfigureFailed {
        setting: &'static str,
        value: u32,
        #[source]
        source: std::io::Error,
    },

    /// SPI_IOC_MESSAGE failed
    #[error("spidev transfer failed: {0}")]
    TransferFailed(#[source] std::io::Error),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Device not specified
    #[error("No device specified. Use dev=/dev/spidevX.Y")]
    NoDevice,
}

/// Result type for Linux spidev operations
pub type Result<T> = std::result::Result<T, LinuxSpiError>;
