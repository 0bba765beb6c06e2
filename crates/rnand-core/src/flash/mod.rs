//! High-level flash operations
//!
//! Multi-page read, program and erase built on the page transfer engine.

mod operations;

pub use operations::*;
