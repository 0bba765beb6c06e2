//! Status register polling
//!
//! Every array operation on a serial NAND chip follows the same cycle:
//! start the operation, poll the status register until the busy bit
//! clears, then check the result flags. This module implements the poll
//! half of that cycle with a bounded number of attempts.

use crate::chip::{ChipProfile, EccStatus, Features};
use crate::error::{ChannelError, DeviceFailure, Error, Result};
use crate::programmer::CommandChannel;
use crate::spi::command;

/// Poll budget for one wait-ready cycle
///
/// The poller performs at most `max_attempts` status reads and sleeps
/// `delay_us` between consecutive reads (not after the last one).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Maximum number of status register reads
    pub max_attempts: u32,
    /// Delay between status reads in microseconds
    pub delay_us: u32,
}

impl PollConfig {
    /// Page read to cache: tRD is 25-100us, budget 10ms
    pub const PAGE_READ: Self = Self::new(1_000, 10);
    /// Page program: tPROG is 250-700us, budget 50ms
    pub const PROGRAM: Self = Self::new(1_000, 50);
    /// Block erase: tBERS is 2-10ms, budget 100ms
    pub const ERASE: Self = Self::new(1_000, 100);
    /// Device reset: tRST is up to 5ms, budget 10ms
    pub const RESET: Self = Self::new(1_000, 10);

    /// Create a poll budget
    pub const fn new(max_attempts: u32, delay_us: u32) -> Self {
        Self {
            max_attempts,
            delay_us,
        }
    }
}

/// Why a poll cycle ended without the chip becoming ready
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Erase-fail bit set
    EraseFailure,
    /// Program-fail bit set
    ProgramFailure,
    /// ECC field reports an uncorrectable page
    UncorrectableEcc,
    /// The status read itself failed
    Channel(ChannelError),
    /// Busy bit still set after the whole budget
    Timeout {
        /// Status reads performed
        attempts: u32,
    },
}

impl From<FailureReason> for Error {
    fn from(reason: FailureReason) -> Self {
        match reason {
            FailureReason::EraseFailure => Error::DeviceFailure(DeviceFailure::Erase),
            FailureReason::ProgramFailure => Error::DeviceFailure(DeviceFailure::Program),
            FailureReason::UncorrectableEcc => {
                Error::DeviceFailure(DeviceFailure::UncorrectableEcc)
            }
            FailureReason::Channel(e) => Error::Channel(e),
            FailureReason::Timeout { attempts } => Error::Timeout { attempts },
        }
    }
}

/// Result of one status read, or of a whole poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Busy bit clear and no failure flags; carries the ECC result
    Ready(EccStatus),
    /// Busy bit still set
    Busy,
    /// The operation failed or the poll could not complete
    Failed(FailureReason),
}

impl PollOutcome {
    /// Convert into a `Result`, treating a leftover `Busy` as a timeout
    pub fn into_result(self, attempts: u32) -> Result<EccStatus> {
        match self {
            PollOutcome::Ready(ecc) => Ok(ecc),
            PollOutcome::Busy => Err(Error::Timeout { attempts }),
            PollOutcome::Failed(reason) => Err(reason.into()),
        }
    }
}

/// Read the raw status register
pub fn read_status<C: CommandChannel + ?Sized>(
    channel: &mut C,
    profile: &ChipProfile,
) -> Result<u8> {
    let cmd = command::get_feature(profile.opcodes.get_feature, profile.registers.status)?;
    let mut buf = [0u8; 1];
    channel.transceive(&cmd, &mut buf)?;
    Ok(buf[0])
}

/// Perform a single status read and decode it
///
/// Busy is decoded first; the failure bits and the ECC field are only
/// meaningful once the chip is idle.
pub fn poll_once<C: CommandChannel + ?Sized>(
    channel: &mut C,
    profile: &ChipProfile,
) -> PollOutcome {
    let raw = match read_status(channel, profile) {
        Ok(raw) => raw,
        Err(Error::Channel(e)) => return PollOutcome::Failed(FailureReason::Channel(e)),
        Err(_) => return PollOutcome::Failed(FailureReason::Channel(ChannelError::TransferFailed)),
    };
    log::trace!("status: 0x{:02X}", raw);

    let status = profile.status.decode(raw);
    if status.busy {
        return PollOutcome::Busy;
    }
    if status.erase_failed {
        return PollOutcome::Failed(FailureReason::EraseFailure);
    }
    if status.program_failed {
        return PollOutcome::Failed(FailureReason::ProgramFailure);
    }
    if !profile.features.contains(Features::ECC_STATUS) {
        return PollOutcome::Ready(EccStatus::NoError);
    }
    match status.ecc {
        EccStatus::Uncorrectable => PollOutcome::Failed(FailureReason::UncorrectableEcc),
        ecc => PollOutcome::Ready(ecc),
    }
}

/// Poll the status register until the chip is ready or the budget runs out
///
/// Never returns `Busy`: a chip still busy after `max_attempts` reads
/// yields `Failed(Timeout)`. A budget of zero still performs one read.
pub fn poll_until_ready<C: CommandChannel + ?Sized>(
    channel: &mut C,
    profile: &ChipProfile,
    config: PollConfig,
) -> PollOutcome {
    poll_counted(channel, profile, config).0
}

/// Same as [`poll_until_ready`], also returning the number of status reads
pub(crate) fn poll_counted<C: CommandChannel + ?Sized>(
    channel: &mut C,
    profile: &ChipProfile,
    config: PollConfig,
) -> (PollOutcome, u32) {
    let max_attempts = config.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match poll_once(channel, profile) {
            PollOutcome::Busy => {
                if attempt < max_attempts && config.delay_us > 0 {
                    channel.delay_us(config.delay_us);
                }
            }
            outcome => return (outcome, attempt),
        }
    }

    log::debug!("status: still busy after {} reads", max_attempts);
    (
        PollOutcome::Failed(FailureReason::Timeout {
            attempts: max_attempts,
        }),
        max_attempts,
    )
}
