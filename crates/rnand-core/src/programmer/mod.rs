//! Programmer traits and abstractions
//!
//! This module defines the command channel trait that every programmer
//! backend implements to talk to a chip.

mod traits;

pub use traits::*;
