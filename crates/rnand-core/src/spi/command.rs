//! Command frame construction
//!
//! A frame is the opcode plus its address and dummy bytes, exactly as it
//! goes out on the wire. Payload data (program load) is appended by the
//! caller after the frame.

use super::AddressFormat;
use crate::error::{Error, Result};

/// Longest opcode + address + dummy header any profile may produce
pub const MAX_HEADER_LEN: usize = 12;

/// Fixed-capacity command header
pub type CommandFrame = heapless::Vec<u8, MAX_HEADER_LEN>;

fn frame(bytes: &[u8]) -> Result<CommandFrame> {
    CommandFrame::from_slice(bytes).map_err(|_| Error::InvalidProfile("command header too long"))
}

/// Opcode only (reset, write enable/disable)
pub fn simple(opcode: u8) -> Result<CommandFrame> {
    frame(&[opcode])
}

/// Read-ID: opcode followed by one dummy/address byte
pub fn read_id(opcode: u8) -> Result<CommandFrame> {
    frame(&[opcode, 0x00])
}

/// Get Feature: opcode and register address
pub fn get_feature(opcode: u8, register: u8) -> Result<CommandFrame> {
    frame(&[opcode, register])
}

/// Set Feature: opcode, register address and the new value
pub fn set_feature(opcode: u8, register: u8, value: u8) -> Result<CommandFrame> {
    frame(&[opcode, register, value])
}

/// Page-select style command carrying a row (page) address
pub fn row(opcode: u8, format: &AddressFormat, page: u32) -> Result<CommandFrame> {
    let mut f = frame(&[opcode])?;
    format.encode_row(page, &mut f)?;
    Ok(f)
}

/// Cache read command: opcode, column address and read dummy bytes
pub fn cache_read(opcode: u8, format: &AddressFormat, column: u32) -> Result<CommandFrame> {
    let mut f = frame(&[opcode])?;
    format.encode_column(column, true, &mut f)?;
    Ok(f)
}

/// Cache load command header: opcode and column address
pub fn cache_load(opcode: u8, format: &AddressFormat, column: u32) -> Result<CommandFrame> {
    let mut f = frame(&[opcode])?;
    format.encode_column(column, false, &mut f)?;
    Ok(f)
}

/// Cache load header that also selects the page
///
/// Chips without a separate Program Execute commit the cache on load, so
/// the row address goes out ahead of the column.
pub fn cache_load_row(
    opcode: u8,
    format: &AddressFormat,
    page: u32,
    column: u32,
) -> Result<CommandFrame> {
    let mut f = frame(&[opcode])?;
    format.encode_row(page, &mut f)?;
    format.encode_column(column, false, &mut f)?;
    Ok(f)
}
