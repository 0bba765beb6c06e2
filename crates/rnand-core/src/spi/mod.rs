//! SPI NAND command encoding
//!
//! This module provides the address layout, command frame builders and
//! the common serial NAND opcodes.

mod address;
pub mod command;
pub mod opcodes;

pub use address::AddressFormat;
pub use command::{CommandFrame, MAX_HEADER_LEN};
