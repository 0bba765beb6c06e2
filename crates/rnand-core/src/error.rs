//! Error types for rnand-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Transport-level failure reported by a command channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    /// The bus transfer itself failed
    TransferFailed,
    /// The channel returned fewer bytes than requested
    ShortResponse,
    /// The channel cannot carry a frame of this size
    FrameTooLarge,
    /// The device on the other end did not accept the opcode
    Unsupported,
    /// The channel is not open or was disconnected
    NotReady,
}

/// Failure explicitly reported by the chip through its status register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFailure {
    /// Erase-fail bit was set after a block erase
    Erase,
    /// Program-fail bit was set after a page program
    Program,
    /// The on-die ECC engine could not correct the page
    UncorrectableEcc,
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Command channel failure (never retried by the engine)
    Channel(ChannelError),
    /// Busy bit did not clear within the poll budget
    Timeout {
        /// Number of status reads performed before giving up
        attempts: u32,
    },
    /// The chip reported a failed operation
    DeviceFailure(DeviceFailure),
    /// Corrected bit errors rejected by [`EccPolicy::Fail`](crate::protocol::EccPolicy::Fail)
    EccCorrected,
    /// Requested page range or buffer does not fit the chip
    InvalidRange,
    /// Read-ID returned ids different from the expected profile
    IdentityMismatch {
        /// Expected (manufacturer, device) ids
        expected: (u8, u16),
        /// Ids returned by the chip
        found: (u8, u16),
    },
    /// Chip profile violates a geometry or encoding constraint
    InvalidProfile(&'static str),
    /// The caller stopped a range operation between pages
    Interrupted,
}

impl From<ChannelError> for Error {
    fn from(e: ChannelError) -> Self {
        Error::Channel(e)
    }
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransferFailed => write!(f, "transfer failed"),
            Self::ShortResponse => write!(f, "short response"),
            Self::FrameTooLarge => write!(f, "frame too large for channel"),
            Self::Unsupported => write!(f, "opcode not supported"),
            Self::NotReady => write!(f, "channel not ready"),
        }
    }
}

impl fmt::Display for DeviceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Erase => write!(f, "erase failure"),
            Self::Program => write!(f, "program failure"),
            Self::UncorrectableEcc => write!(f, "uncorrectable ECC error"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(e) => write!(f, "command channel error: {}", e),
            Self::Timeout { attempts } => {
                write!(f, "device still busy after {} status reads", attempts)
            }
            Self::DeviceFailure(failure) => write!(f, "device reported {}", failure),
            Self::EccCorrected => write!(f, "corrected ECC error rejected by policy"),
            Self::InvalidRange => write!(f, "page range out of bounds"),
            Self::IdentityMismatch { expected, found } => write!(
                f,
                "ID mismatch: expected {:02X} {:04X}, found {:02X} {:04X}",
                expected.0, expected.1, found.0, found.1
            ),
            Self::InvalidProfile(reason) => write!(f, "invalid chip profile: {}", reason),
            Self::Interrupted => write!(f, "operation interrupted"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ChannelError {}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Error from a multi-page operation, carrying the position it stopped at
///
/// `completed` pages (or blocks, for erase) were fully processed before the
/// failure; their data is left in place so the caller can resume at `page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeError {
    /// Page (or first page of the block) that failed; `None` for precondition failures
    pub page: Option<u32>,
    /// Units finished before the failure
    pub completed: u32,
    /// Underlying cause
    pub error: Error,
}

impl RangeError {
    /// A precondition failure that happened before any transaction
    pub const fn invalid_range() -> Self {
        Self {
            page: None,
            completed: 0,
            error: Error::InvalidRange,
        }
    }

    /// A failure at `page` after `completed` units succeeded
    pub const fn at(page: u32, completed: u32, error: Error) -> Self {
        Self {
            page: Some(page),
            completed,
            error,
        }
    }
}

impl From<Error> for RangeError {
    fn from(error: Error) -> Self {
        Self {
            page: None,
            completed: 0,
            error,
        }
    }
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page {
            Some(page) => write!(f, "{} at page 0x{:05X}", self.error, page),
            None => write!(f, "{}", self.error),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RangeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
