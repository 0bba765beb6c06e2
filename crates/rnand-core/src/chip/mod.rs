//! Chip profiles and database
//!
//! This module provides the data-driven description of a serial NAND chip
//! family, the table of built-in profiles, and (with `std`) a database that
//! can load additional profiles from RON files.

mod builtin;
mod features;
mod types;

#[cfg(feature = "std")]
mod database;

pub use builtin::*;
pub use features::Features;
pub use types::*;

#[cfg(feature = "std")]
pub use database::*;
