//! Common SPI NAND opcodes, feature registers and status bits
//!
//! Values shared by the Winbond, Dosilicon and Macronix serial NAND
//! families. Chip profiles start from these and override what differs.

// ============================================================================
// Reset and identification
// ============================================================================

/// Device Reset
pub const RESET: u8 = 0xFF;
/// Read JEDEC ID (followed by one dummy byte)
pub const READ_ID: u8 = 0x9F;

// ============================================================================
// Feature (status) register access
// ============================================================================

/// Get Feature - `[0x0F, reg]`, one byte response
pub const GET_FEATURE: u8 = 0x0F;
/// Set Feature - `[0x1F, reg, value]`
pub const SET_FEATURE: u8 = 0x1F;

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required before program and erase
pub const WRITE_ENABLE: u8 = 0x06;
/// Write Disable - clears the WEL bit
pub const WRITE_DISABLE: u8 = 0x04;

// ============================================================================
// Array access
// ============================================================================

/// Page Data Read - moves one page from the array into the cache
pub const PAGE_READ: u8 = 0x13;
/// Read from cache (single I/O)
pub const READ_CACHE: u8 = 0x03;
/// Fast read from cache (single I/O, one dummy byte)
pub const FAST_READ_CACHE: u8 = 0x0B;
/// Program Load - resets the cache to 0xFF and loads data into it
pub const PROGRAM_LOAD: u8 = 0x02;
/// Random Program Load - loads data without resetting the cache
pub const RANDOM_PROGRAM_LOAD: u8 = 0x84;
/// Program Execute - commits the cache to the array page
pub const PROGRAM_EXECUTE: u8 = 0x10;
/// Block Erase (128 KiB on 2 KiB page parts)
pub const BLOCK_ERASE: u8 = 0xD8;

// ============================================================================
// Feature register addresses
// ============================================================================

/// Block protection register
pub const REG_PROTECTION: u8 = 0xA0;
/// Configuration / OTP register
pub const REG_CONFIG: u8 = 0xB0;
/// Status register
pub const REG_STATUS: u8 = 0xC0;
/// Output driver strength (Dosilicon)
pub const REG_DRIVER_STRENGTH: u8 = 0xD0;

// ============================================================================
// Status register bits
// ============================================================================

/// Operation in progress (busy)
pub const SR_OIP: u8 = 0x01;
/// Write enable latch
pub const SR_WEL: u8 = 0x02;
/// Erase failure
pub const SR_E_FAIL: u8 = 0x04;
/// Program failure
pub const SR_P_FAIL: u8 = 0x08;
/// ECC status field
pub const SR_ECC_MASK: u8 = 0x30;
/// ECC: bit errors detected and corrected
pub const SR_ECC_CORRECTED: u8 = 0x10;
/// ECC: bit errors detected, not corrected
pub const SR_ECC_UNCORRECTABLE: u8 = 0x20;

// ============================================================================
// Configuration register bits
// ============================================================================

/// Enable on-die ECC
pub const CFG_ECC_EN: u8 = 0x10;
/// Buffer read mode (Winbond); cleared selects continuous read
pub const CFG_BUF: u8 = 0x08;
