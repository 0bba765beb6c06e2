//! Row/column address encoding

use super::command::CommandFrame;
use crate::error::{Error, Result};

/// Byte layout of the address fields following an opcode
///
/// Page-select style commands (page read, program execute, block erase)
/// carry `row_dummy` zero bytes followed by the page index big-endian in
/// `row_bytes`. Cache commands carry the column big-endian in
/// `column_bytes`, and cache reads add `read_dummy` zero bytes after it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AddressFormat {
    /// Dummy bytes before the row address
    pub row_dummy: u8,
    /// Width of the row (page index) address
    pub row_bytes: u8,
    /// Width of the column address
    pub column_bytes: u8,
    /// Dummy bytes after the column on cache reads
    pub read_dummy: u8,
}

impl AddressFormat {
    /// 8 dummy bits + 16 page bits, 16 column bits, one read dummy byte
    pub const STANDARD: Self = Self {
        row_dummy: 1,
        row_bytes: 2,
        column_bytes: 2,
        read_dummy: 1,
    };

    /// Number of bits available for the page index
    pub const fn row_bits(&self) -> u32 {
        self.row_bytes as u32 * 8
    }

    /// Highest page index the row field can carry
    pub const fn max_row(&self) -> u32 {
        if self.row_bytes >= 4 {
            u32::MAX
        } else {
            (1u32 << self.row_bits()) - 1
        }
    }

    /// Append dummy bytes and the big-endian page index
    pub fn encode_row(&self, page: u32, frame: &mut CommandFrame) -> Result<()> {
        if page > self.max_row() {
            return Err(Error::InvalidRange);
        }
        push_zeros(frame, self.row_dummy)?;
        push_be(frame, page, self.row_bytes)
    }

    /// Append the big-endian column address and, for reads, the dummy bytes
    pub fn encode_column(
        &self,
        column: u32,
        with_read_dummy: bool,
        frame: &mut CommandFrame,
    ) -> Result<()> {
        push_be(frame, column, self.column_bytes)?;
        if with_read_dummy {
            push_zeros(frame, self.read_dummy)?;
        }
        Ok(())
    }
}

impl Default for AddressFormat {
    fn default() -> Self {
        Self::STANDARD
    }
}

fn push_zeros(frame: &mut CommandFrame, count: u8) -> Result<()> {
    for _ in 0..count {
        frame
            .push(0)
            .map_err(|_| Error::InvalidProfile("command header too long"))?;
    }
    Ok(())
}

fn push_be(frame: &mut CommandFrame, value: u32, width: u8) -> Result<()> {
    let bytes = value.to_be_bytes();
    let width = width as usize;
    if width > bytes.len() {
        return Err(Error::InvalidProfile("address field wider than 32 bits"));
    }
    frame
        .extend_from_slice(&bytes[bytes.len() - width..])
        .map_err(|_| Error::InvalidProfile("command header too long"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_encoding() {
        let mut frame = CommandFrame::new();
        AddressFormat::STANDARD.encode_row(0x1234, &mut frame).unwrap();
        assert_eq!(frame.as_slice(), &[0x00, 0x12, 0x34]);
    }

    #[test]
    fn test_row_out_of_range() {
        let mut frame = CommandFrame::new();
        assert_eq!(
            AddressFormat::STANDARD.encode_row(0x1_0000, &mut frame),
            Err(Error::InvalidRange)
        );
    }

    #[test]
    fn test_column_encoding() {
        let mut frame = CommandFrame::new();
        AddressFormat::STANDARD
            .encode_column(0x0840, true, &mut frame)
            .unwrap();
        assert_eq!(frame.as_slice(), &[0x08, 0x40, 0x00]);
    }

    #[test]
    fn test_max_row() {
        assert_eq!(AddressFormat::STANDARD.max_row(), 0xFFFF);
        let wide = AddressFormat {
            row_bytes: 3,
            ..AddressFormat::STANDARD
        };
        assert_eq!(wide.max_row(), 0xFF_FFFF);
    }
}
