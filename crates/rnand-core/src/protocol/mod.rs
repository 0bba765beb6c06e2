//! Serial NAND protocol
//!
//! Command sequences for housekeeping (identification, reset, feature
//! registers), the status poller and the single-page transfer engine.

mod page;
mod spinand;
mod status;

pub use page::*;
pub use spinand::*;
pub use status::*;
