//! Chip profile feature flags

use bitflags::bitflags;

bitflags! {
    /// Feature flags for serial NAND chips
    ///
    /// These flags describe which optional parts of the common command set
    /// a chip family implements.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Features: u32 {
        /// Status register reports on-die ECC results
        const ECC_STATUS      = 1 << 0;
        /// Has a block protection register that locks the array at power-up
        const BLOCK_LOCK      = 1 << 1;
        /// Program Load only fills the cache; a separate Program Execute commits it
        const PROGRAM_EXECUTE = 1 << 2;
        /// Configuration register has a BUF bit selecting page-buffer reads
        const BUFFER_MODE     = 1 << 3;
    }
}

impl Default for Features {
    fn default() -> Self {
        Features::ECC_STATUS | Features::BLOCK_LOCK | Features::PROGRAM_EXECUTE
    }
}
