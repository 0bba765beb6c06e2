//! Serial NAND housekeeping commands
//!
//! Identification, reset, feature register access and the write-enable
//! latch. Array transfers live in the `page` module.

use crate::chip::{ChipProfile, Features};
use crate::error::{Error, Result};
use crate::programmer::CommandChannel;
use crate::spi::{command, opcodes};

use super::status::{poll_counted, PollConfig};

/// Read the three raw ID bytes that follow the read-ID command
pub fn read_id_raw<C: CommandChannel + ?Sized>(channel: &mut C, opcode: u8) -> Result<[u8; 3]> {
    let cmd = command::read_id(opcode)?;
    let mut buf = [0u8; 3];
    channel.transceive(&cmd, &mut buf)?;
    Ok(buf)
}

/// Read the manufacturer and device ids using the profile's ID format
///
/// Returns (manufacturer_id, device_id). Whether the ids are acceptable is
/// the caller's decision; see [`verify_identity`] for the common check.
pub fn identify<C: CommandChannel + ?Sized>(
    channel: &mut C,
    profile: &ChipProfile,
) -> Result<(u8, u16)> {
    let raw = read_id_raw(channel, profile.opcodes.read_id)?;
    let id = profile.decode_id(raw);
    log::debug!(
        "read ID: {:02X} {:02X} {:02X} -> {:02X} {:04X}",
        raw[0],
        raw[1],
        raw[2],
        id.0,
        id.1
    );
    Ok(id)
}

/// Read the ids and fail with `IdentityMismatch` unless they match `profile`
pub fn verify_identity<C: CommandChannel + ?Sized>(
    channel: &mut C,
    profile: &ChipProfile,
) -> Result<()> {
    let found = identify(channel, profile)?;
    if found != profile.id() {
        return Err(Error::IdentityMismatch {
            expected: profile.id(),
            found,
        });
    }
    Ok(())
}

/// Read a feature register
pub fn get_feature<C: CommandChannel + ?Sized>(
    channel: &mut C,
    profile: &ChipProfile,
    register: u8,
) -> Result<u8> {
    let cmd = command::get_feature(profile.opcodes.get_feature, register)?;
    let mut buf = [0u8; 1];
    channel.transceive(&cmd, &mut buf)?;
    Ok(buf[0])
}

/// Write a feature register
pub fn set_feature<C: CommandChannel + ?Sized>(
    channel: &mut C,
    profile: &ChipProfile,
    register: u8,
    value: u8,
) -> Result<()> {
    let cmd = command::set_feature(profile.opcodes.set_feature, register, value)?;
    channel.transceive(&cmd, &mut [])?;
    Ok(())
}

/// Send the Write Enable command
pub fn write_enable<C: CommandChannel + ?Sized>(
    channel: &mut C,
    profile: &ChipProfile,
) -> Result<()> {
    let cmd = command::simple(profile.opcodes.write_enable)?;
    channel.transceive(&cmd, &mut [])?;
    Ok(())
}

/// Send the Write Disable command
pub fn write_disable<C: CommandChannel + ?Sized>(
    channel: &mut C,
    profile: &ChipProfile,
) -> Result<()> {
    let cmd = command::simple(profile.opcodes.write_disable)?;
    channel.transceive(&cmd, &mut [])?;
    Ok(())
}

/// Reset the chip and wait until it is ready again
///
/// Used before other operations to start from a known state: the reset
/// aborts nothing in flight on an idle chip and clears the fail flags.
pub fn reset<C: CommandChannel + ?Sized>(
    channel: &mut C,
    profile: &ChipProfile,
    config: PollConfig,
) -> Result<()> {
    let cmd = command::simple(profile.opcodes.reset)?;
    channel.transceive(&cmd, &mut [])?;
    let (outcome, attempts) = poll_counted(channel, profile, config);
    outcome.into_result(attempts)?;
    log::debug!("reset complete after {} status reads", attempts);
    Ok(())
}

/// Clear all block protection bits
///
/// Chips with a block-lock register power up with the whole array locked;
/// program and erase fail until it is cleared. No-op for other chips.
pub fn unlock_all_blocks<C: CommandChannel + ?Sized>(
    channel: &mut C,
    profile: &ChipProfile,
) -> Result<()> {
    if !profile.features.contains(Features::BLOCK_LOCK) {
        return Ok(());
    }
    let before = get_feature(channel, profile, profile.registers.protection)?;
    if before == 0 {
        return Ok(());
    }
    set_feature(channel, profile, profile.registers.protection, 0x00)?;
    let after = get_feature(channel, profile, profile.registers.protection)?;
    if after != 0 {
        log::warn!(
            "block protection still 0x{:02X} after unlock (WP# asserted?)",
            after
        );
    } else {
        log::info!("Cleared block protection (was 0x{:02X})", before);
    }
    Ok(())
}

/// Select page-buffer read mode on chips that default to continuous reads
///
/// With continuous read active the cache read does not stop at the end of
/// the page, so page-by-page transfers require the BUF bit set.
pub fn enable_buffer_mode<C: CommandChannel + ?Sized>(
    channel: &mut C,
    profile: &ChipProfile,
) -> Result<()> {
    if !profile.features.contains(Features::BUFFER_MODE) {
        return Ok(());
    }
    let config = get_feature(channel, profile, profile.registers.config)?;
    if config & opcodes::CFG_BUF == 0 {
        set_feature(channel, profile, profile.registers.config, config | opcodes::CFG_BUF)?;
        log::debug!("config: set BUF (0x{:02X})", config | opcodes::CFG_BUF);
    }
    Ok(())
}

/// Reset the chip and apply the configuration the engine relies on
pub fn prepare<C: CommandChannel + ?Sized>(
    channel: &mut C,
    profile: &ChipProfile,
    config: PollConfig,
) -> Result<()> {
    reset(channel, profile, config)?;
    enable_buffer_mode(channel, profile)
}
