//! Built-in chip profiles
//!
//! All three families share the 1 Gbit, 2048+64 byte page, 64 pages per
//! block geometry and the standard command set. They differ in IDs and
//! in whether the BUF bit has to be set for page reads.

use alloc::borrow::Cow;

use super::features::Features;
use super::types::{ChipProfile, FeatureRegisters, Opcodes, StatusLayout};
use crate::spi::AddressFormat;

/// Winbond W25N01GV, 1 Gbit
pub const W25N01GV: ChipProfile = ChipProfile {
    vendor: Cow::Borrowed("Winbond"),
    name: Cow::Borrowed("W25N01GV"),
    manufacturer_id: 0xEF,
    device_id: 0xAA21,
    device_id_len: 2,
    page_size: 2048,
    spare_size: 64,
    pages_per_block: 64,
    pages_total: 65536,
    opcodes: Opcodes::STANDARD,
    registers: FeatureRegisters::STANDARD,
    status: StatusLayout::STANDARD,
    address: AddressFormat::STANDARD,
    pad_byte: 0xFF,
    features: Features::ECC_STATUS
        .union(Features::BLOCK_LOCK)
        .union(Features::PROGRAM_EXECUTE)
        .union(Features::BUFFER_MODE),
};

/// Dosilicon DS35Q1GA, 1 Gbit
pub const DS35Q1GA: ChipProfile = ChipProfile {
    vendor: Cow::Borrowed("Dosilicon"),
    name: Cow::Borrowed("DS35Q1GA"),
    manufacturer_id: 0xE5,
    device_id: 0x71,
    device_id_len: 1,
    page_size: 2048,
    spare_size: 64,
    pages_per_block: 64,
    pages_total: 65536,
    opcodes: Opcodes::STANDARD,
    registers: FeatureRegisters::STANDARD,
    status: StatusLayout::STANDARD,
    address: AddressFormat::STANDARD,
    pad_byte: 0xFF,
    features: Features::ECC_STATUS
        .union(Features::BLOCK_LOCK)
        .union(Features::PROGRAM_EXECUTE),
};

/// Macronix MX35LF1GE4AB, 1 Gbit
pub const MX35LF1GE4AB: ChipProfile = ChipProfile {
    vendor: Cow::Borrowed("Macronix"),
    name: Cow::Borrowed("MX35LF1GE4AB"),
    manufacturer_id: 0xC2,
    device_id: 0x12,
    device_id_len: 1,
    page_size: 2048,
    spare_size: 64,
    pages_per_block: 64,
    pages_total: 65536,
    opcodes: Opcodes::STANDARD,
    registers: FeatureRegisters::STANDARD,
    status: StatusLayout::STANDARD,
    address: AddressFormat::STANDARD,
    pad_byte: 0xFF,
    features: Features::ECC_STATUS
        .union(Features::BLOCK_LOCK)
        .union(Features::PROGRAM_EXECUTE),
};

/// All built-in profiles
pub static BUILTIN_CHIPS: [ChipProfile; 3] = [W25N01GV, DS35Q1GA, MX35LF1GE4AB];

/// Find a built-in profile by ids
pub fn find_builtin(manufacturer: u8, device: u16) -> Option<&'static ChipProfile> {
    BUILTIN_CHIPS
        .iter()
        .find(|chip| chip.matches_id(manufacturer, device))
}

/// Find a built-in profile by name (case-insensitive)
pub fn find_builtin_by_name(name: &str) -> Option<&'static ChipProfile> {
    BUILTIN_CHIPS
        .iter()
        .find(|chip| chip.name.eq_ignore_ascii_case(name))
}
