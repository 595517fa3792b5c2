//! Error types for tagprog-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.
//!
//! Short transfers are not errors: every read/write path reports the
//! byte count it actually moved, and callers compare it against the
//! count they asked for. The variants here cover the cases that are
//! never expressible as a count - inapplicable operations, exhausted
//! bridge retries, and hard transport faults.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Policy errors
    /// Operation is not applicable to the active chip model or arguments
    Unsupported,
    /// Provided buffer is too small for the operation
    BufferTooSmall,
    /// Address or length is beyond the addressed bank
    AddressOutOfBounds,
    /// Write data is not a whole number of 16-bit words
    InvalidAlignment,

    // Probe errors
    /// No tag chip answered at any legal device address
    ChipNotFound,

    // Transport errors
    /// Bridge busy/poll retries were exhausted before the bus went idle
    TransportExhausted,
    /// A transfer could not be started or completed
    TransferFailed,
    /// Transport operation timed out
    Timeout,
    /// A transfer moved fewer bytes than the operation requires
    ShortTransfer,
    /// OS-level I/O error
    IoError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => write!(f, "operation not supported on this chip model"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::InvalidAlignment => write!(f, "write data must be whole 16-bit words"),
            Self::ChipNotFound => write!(f, "tag chip not found"),
            Self::TransportExhausted => write!(f, "bridge retries exhausted"),
            Self::TransferFailed => write!(f, "transfer failed"),
            Self::Timeout => write!(f, "transport operation timed out"),
            Self::ShortTransfer => write!(f, "transfer returned fewer bytes than required"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
