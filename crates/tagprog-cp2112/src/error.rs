//! Error types for the CP2112 bridge

use std::fmt;

/// Result type for CP2112 operations
pub type Result<T> = std::result::Result<T, Cp2112Error>;

/// Errors that can occur when using the CP2112 bridge
#[derive(Debug)]
pub enum Cp2112Error {
    /// Device not found
    DeviceNotFound,
    /// Failed to open device
    OpenFailed(String),
    /// Failed to claim interface
    ClaimFailed(String),
    /// USB transfer failed
    TransferFailed(String),
    /// Unexpected report from the bridge
    InvalidResponse(String),
    /// Timeout during a USB transfer
    Timeout,
    /// Bridge stayed busy past the retry limit
    RetriesExhausted,
    /// Parameter parsing error
    InvalidParameter(String),
    /// Core library error
    Core(tagprog_core::Error),
}

impl fmt::Display for Cp2112Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cp2112Error::DeviceNotFound => {
                write!(f, "CP2112 device not found (VID:10C4 PID:EA90)")
            }
            Cp2112Error::OpenFailed(msg) => write!(f, "Failed to open CP2112: {}", msg),
            Cp2112Error::ClaimFailed(msg) => write!(f, "Failed to claim interface: {}", msg),
            Cp2112Error::TransferFailed(msg) => write!(f, "USB transfer failed: {}", msg),
            Cp2112Error::InvalidResponse(msg) => {
                write!(f, "Invalid response from CP2112: {}", msg)
            }
            Cp2112Error::Timeout => write!(f, "Timeout during USB transfer"),
            Cp2112Error::RetriesExhausted => {
                write!(f, "CP2112 stayed busy past the retry limit")
            }
            Cp2112Error::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            Cp2112Error::Core(e) => write!(f, "Core error: {}", e),
        }
    }
}

impl std::error::Error for Cp2112Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Cp2112Error::Core(e) => Some(e),
            _ => None,
        }
    }
}

impl From<tagprog_core::Error> for Cp2112Error {
    fn from(e: tagprog_core::Error) -> Self {
        Cp2112Error::Core(e)
    }
}

impl From<Cp2112Error> for tagprog_core::Error {
    fn from(e: Cp2112Error) -> Self {
        match e {
            Cp2112Error::Core(e) => e,
            Cp2112Error::Timeout => tagprog_core::Error::Timeout,
            Cp2112Error::RetriesExhausted => tagprog_core::Error::TransportExhausted,
            Cp2112Error::TransferFailed(_) | Cp2112Error::InvalidResponse(_) => {
                tagprog_core::Error::TransferFailed
            }
            _ => tagprog_core::Error::IoError,
        }
    }
}
