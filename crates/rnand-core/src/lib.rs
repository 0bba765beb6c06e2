//! rnand-core - Core library for serial NAND flash programming
//!
//! This crate drives SPI NAND chips that move data through an on-die page
//! cache: every page transfer is a page-select, a status poll until the
//! chip is ready, and a cache transfer. It is `no_std` compatible and only
//! needs a heap for the engine's scratch buffer.
//!
//! # Features
//!
//! - `std` - Enable standard library support and the RON chip database
//!
//! # Example
//!
//! ```ignore
//! use rnand_core::{chip::W25N01GV, flash, programmer::CommandChannel};
//!
//! fn dump<C: CommandChannel>(channel: &mut C) -> Vec<u8> {
//!     let chip = &W25N01GV;
//!     let mut buf = vec![0u8; 4 * chip.page_size as usize];
//!     match flash::read_range(channel, chip, 0, 4, &mut buf) {
//!         Ok(report) => println!("read {} pages", report.pages),
//!         Err(e) => println!("read failed: {}", e),
//!     }
//!     buf
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod chip;
pub mod error;
pub mod flash;
pub mod programmer;
pub mod protocol;
pub mod spi;

pub use error::{Error, RangeError, Result};
