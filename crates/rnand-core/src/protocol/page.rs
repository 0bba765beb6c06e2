//! Page transfer engine
//!
//! Runs the start → poll → move cycle for one page (or one block, for
//! erase) at a time:
//!
//! - **Read**: page read to cache, poll until ready, read the cache
//!   (main + spare) and hand back the main area.
//! - **Program**: write enable, program load of the padded cache unit,
//!   program execute, poll until ready.
//! - **Erase**: write enable, block erase, poll until ready.
//!
//! A command channel failure ends the transfer immediately. Nothing is
//! retried here; a caller that wants retries wraps the whole page.

use alloc::vec;
use alloc::vec::Vec;

use crate::chip::{ChipProfile, EccStatus, Features};
use crate::error::{ChannelError, Error, Result};
use crate::programmer::CommandChannel;
use crate::spi::{command, MAX_HEADER_LEN};

use super::spinand::{write_disable, write_enable};
use super::status::{poll_counted, PollConfig};

/// What to do with pages the on-die ECC had to correct
///
/// Uncorrectable pages always fail; this only governs the corrected case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EccPolicy {
    /// Accept silently
    Ignore,
    /// Accept and log a warning
    #[default]
    Report,
    /// Treat as a failure of the page
    Fail,
}

/// Poll budgets and ECC handling for a [`PageEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Budget for page read to cache
    pub read_poll: PollConfig,
    /// Budget for program execute
    pub program_poll: PollConfig,
    /// Budget for block erase
    pub erase_poll: PollConfig,
    /// Corrected-ECC handling
    pub ecc_policy: EccPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            read_poll: PollConfig::PAGE_READ,
            program_poll: PollConfig::PROGRAM,
            erase_poll: PollConfig::ERASE,
            ecc_policy: EccPolicy::default(),
        }
    }
}

/// Transfer direction of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Array to host
    Read,
    /// Host to array
    Program,
    /// Block erase
    Erase,
}

/// Bookkeeping for one page operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSession {
    /// Target page (first page of the block for erase)
    pub page: u32,
    /// Transfer direction
    pub direction: Direction,
    /// Status reads spent waiting for the chip
    pub poll_attempts: u32,
}

/// One page read back from the chip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    /// Main-area bytes, exactly `page_size` long; spare bytes are dropped
    pub data: Vec<u8>,
    /// ECC result reported for this page
    pub ecc: EccStatus,
}

/// Executes single-page transfers for one chip profile
///
/// Owns a scratch buffer sized to one command header plus one cache unit,
/// reused by every transfer.
pub struct PageEngine<'p> {
    profile: &'p ChipProfile,
    config: EngineConfig,
    scratch: Vec<u8>,
    last_session: Option<TransferSession>,
}

impl<'p> PageEngine<'p> {
    /// Create an engine for a validated profile
    pub fn new(profile: &'p ChipProfile, config: EngineConfig) -> Result<Self> {
        profile.validate()?;
        Ok(Self {
            profile,
            config,
            scratch: vec![0u8; MAX_HEADER_LEN + profile.cache_unit()],
            last_session: None,
        })
    }

    /// The profile this engine drives
    pub fn profile(&self) -> &'p ChipProfile {
        self.profile
    }

    /// Current configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The most recently finished (or failed) transfer
    pub fn last_session(&self) -> Option<&TransferSession> {
        self.last_session.as_ref()
    }

    fn check_page(&self, page: u32) -> Result<()> {
        if page >= self.profile.pages_total {
            return Err(Error::InvalidRange);
        }
        Ok(())
    }

    fn check_channel<C: CommandChannel + ?Sized>(&self, channel: &C) -> Result<()> {
        if channel.max_transfer_len() < MAX_HEADER_LEN + self.profile.cache_unit() {
            return Err(Error::Channel(ChannelError::FrameTooLarge));
        }
        Ok(())
    }

    /// Poll until ready, charging the attempts to `session`
    fn wait<C: CommandChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        session: &mut TransferSession,
        config: PollConfig,
    ) -> Result<EccStatus> {
        let (outcome, attempts) = poll_counted(channel, self.profile, config);
        session.poll_attempts += attempts;
        self.last_session = Some(*session);
        outcome.into_result(attempts)
    }

    /// Read one page into `out`, which must be exactly `page_size` bytes
    ///
    /// On success `out` holds the page's main area and the ECC result is
    /// returned. On failure `out` is left untouched.
    pub fn read_page_into<C: CommandChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        page: u32,
        out: &mut [u8],
    ) -> Result<EccStatus> {
        let page_size = self.profile.page_size as usize;
        if out.len() != page_size {
            return Err(Error::InvalidRange);
        }
        self.check_page(page)?;
        self.check_channel(channel)?;

        let mut session = TransferSession {
            page,
            direction: Direction::Read,
            poll_attempts: 0,
        };
        self.last_session = Some(session);

        // Page select: array -> cache
        let cmd = command::row(self.profile.opcodes.page_read, &self.profile.address, page)?;
        channel.transceive(&cmd, &mut [])?;

        let ecc = self.wait(channel, &mut session, self.config.read_poll)?;

        // Cache -> host, main area and spare in one transfer
        let unit = self.profile.cache_unit();
        let cmd = command::cache_read(self.profile.opcodes.read_cache, &self.profile.address, 0)?;
        channel.transceive(&cmd, &mut self.scratch[..unit])?;

        match (ecc, self.config.ecc_policy) {
            (EccStatus::Corrected, EccPolicy::Fail) => return Err(Error::EccCorrected),
            (EccStatus::Corrected, EccPolicy::Report) => {
                log::warn!("page 0x{:05X}: corrected bit errors", page);
            }
            _ => {}
        }

        out.copy_from_slice(&self.scratch[..page_size]);
        log::trace!(
            "read page 0x{:05X} ({} status reads)",
            page,
            session.poll_attempts
        );
        Ok(ecc)
    }

    /// Read one page into a newly allocated [`PageResult`]
    pub fn read_page<C: CommandChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        page: u32,
    ) -> Result<PageResult> {
        let mut data = vec![0u8; self.profile.page_size as usize];
        let ecc = self.read_page_into(channel, page, &mut data)?;
        Ok(PageResult { data, ecc })
    }

    /// Program one page
    ///
    /// `data` may be shorter than a page; the rest of the cache unit,
    /// spare area included, is filled with the profile's pad byte. The
    /// page must have been erased beforehand.
    pub fn program_page<C: CommandChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        page: u32,
        data: &[u8],
    ) -> Result<()> {
        if data.len() > self.profile.page_size as usize {
            return Err(Error::InvalidRange);
        }
        self.check_page(page)?;
        self.check_channel(channel)?;

        let mut session = TransferSession {
            page,
            direction: Direction::Program,
            poll_attempts: 0,
        };
        self.last_session = Some(session);

        write_enable(channel, self.profile)?;
        if let Err(e) = self.load_and_execute(channel, &mut session, data) {
            disarm(channel, self.profile);
            return Err(e);
        }
        log::trace!(
            "programmed page 0x{:05X} ({} status reads)",
            page,
            session.poll_attempts
        );
        Ok(())
    }

    /// Program load (plus execute where the chip has one), then poll
    fn load_and_execute<C: CommandChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        session: &mut TransferSession,
        data: &[u8],
    ) -> Result<()> {
        let page = session.page;

        // Program load: header, data, padding up to the cache unit
        let has_execute = self.profile.features.contains(Features::PROGRAM_EXECUTE);
        let opcode = self.profile.opcodes.program_load;
        let header = if has_execute {
            command::cache_load(opcode, &self.profile.address, 0)?
        } else {
            command::cache_load_row(opcode, &self.profile.address, page, 0)?
        };
        let h = header.len();
        let end = h + self.profile.cache_unit();
        self.scratch[..h].copy_from_slice(&header);
        self.scratch[h..h + data.len()].copy_from_slice(data);
        self.scratch[h + data.len()..end].fill(self.profile.pad_byte);
        channel.transceive(&self.scratch[..end], &mut [])?;

        if has_execute {
            let cmd = command::row(
                self.profile.opcodes.program_execute,
                &self.profile.address,
                page,
            )?;
            channel.transceive(&cmd, &mut [])?;
        }

        self.wait(channel, session, self.config.program_poll)?;
        Ok(())
    }

    /// Erase one block
    pub fn erase_block<C: CommandChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        block: u32,
    ) -> Result<()> {
        if block >= self.profile.block_count() {
            return Err(Error::InvalidRange);
        }
        let page = self.profile.block_first_page(block);

        let mut session = TransferSession {
            page,
            direction: Direction::Erase,
            poll_attempts: 0,
        };
        self.last_session = Some(session);

        write_enable(channel, self.profile)?;
        if let Err(e) = self.erase_and_wait(channel, &mut session) {
            disarm(channel, self.profile);
            return Err(e);
        }
        log::trace!(
            "erased block {} ({} status reads)",
            block,
            session.poll_attempts
        );
        Ok(())
    }

    fn erase_and_wait<C: CommandChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        session: &mut TransferSession,
    ) -> Result<()> {
        let cmd = command::row(
            self.profile.opcodes.block_erase,
            &self.profile.address,
            session.page,
        )?;
        channel.transceive(&cmd, &mut [])?;
        self.wait(channel, session, self.config.erase_poll)?;
        Ok(())
    }
}

/// Drop the write-enable latch after a program or erase that failed
///
/// The chip clears the latch itself when an operation runs to completion,
/// but not when the sequence is cut short on the host side.
fn disarm<C: CommandChannel + ?Sized>(channel: &mut C, profile: &ChipProfile) {
    if let Err(e) = write_disable(channel, profile) {
        log::debug!("write disable after failure: {}", e);
    }
}
