//! Chip database for runtime loading and lookup
//!
//! This module provides the `ChipDatabase` type, which holds the built-in
//! profiles plus any profiles loaded from RON files at runtime.

use alloc::{borrow::Cow, format, string::String, vec::Vec};
use std::fs;
use std::io;
use std::path::Path;

use super::builtin::BUILTIN_CHIPS;
use super::features::Features;
use super::types::{ChipProfile, FeatureRegisters, Opcodes, StatusLayout};
use crate::spi::AddressFormat;

/// Error type for chip database operations
#[derive(Debug)]
pub enum ChipDbError {
    /// I/O error reading files
    Io(io::Error),
    /// RON parsing error
    Parse(ron::error::SpannedError),
    /// Validation error
    Validation(String),
}

impl From<io::Error> for ChipDbError {
    fn from(e: io::Error) -> Self {
        ChipDbError::Io(e)
    }
}

impl From<ron::error::SpannedError> for ChipDbError {
    fn from(e: ron::error::SpannedError) -> Self {
        ChipDbError::Parse(e)
    }
}

impl std::fmt::Display for ChipDbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChipDbError::Io(e) => write!(f, "I/O error: {}", e),
            ChipDbError::Parse(e) => write!(f, "Parse error: {}", e),
            ChipDbError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ChipDbError {}

// ============================================================================
// RON deserialization types (intermediate format)
// ============================================================================

/// Opcode overrides; anything omitted uses the standard command set
#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(default)]
struct OpcodesDef {
    page_read: u8,
    read_cache: u8,
    program_load: u8,
    program_execute: u8,
    block_erase: u8,
    get_feature: u8,
    set_feature: u8,
    reset: u8,
    write_enable: u8,
    write_disable: u8,
    read_id: u8,
}

impl Default for OpcodesDef {
    fn default() -> Self {
        let o = Opcodes::STANDARD;
        Self {
            page_read: o.page_read,
            read_cache: o.read_cache,
            program_load: o.program_load,
            program_execute: o.program_execute,
            block_erase: o.block_erase,
            get_feature: o.get_feature,
            set_feature: o.set_feature,
            reset: o.reset,
            write_enable: o.write_enable,
            write_disable: o.write_disable,
            read_id: o.read_id,
        }
    }
}

impl From<OpcodesDef> for Opcodes {
    fn from(def: OpcodesDef) -> Self {
        Opcodes {
            page_read: def.page_read,
            read_cache: def.read_cache,
            program_load: def.program_load,
            program_execute: def.program_execute,
            block_erase: def.block_erase,
            get_feature: def.get_feature,
            set_feature: def.set_feature,
            reset: def.reset,
            write_enable: def.write_enable,
            write_disable: def.write_disable,
            read_id: def.read_id,
        }
    }
}

#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(default)]
struct RegistersDef {
    protection: u8,
    config: u8,
    status: u8,
}

impl Default for RegistersDef {
    fn default() -> Self {
        let r = FeatureRegisters::STANDARD;
        Self {
            protection: r.protection,
            config: r.config,
            status: r.status,
        }
    }
}

#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(default)]
struct StatusDef {
    busy: u8,
    write_enable_latch: u8,
    erase_fail: u8,
    program_fail: u8,
    ecc_mask: u8,
    ecc_corrected: u8,
}

impl Default for StatusDef {
    fn default() -> Self {
        let s = StatusLayout::STANDARD;
        Self {
            busy: s.busy,
            write_enable_latch: s.write_enable_latch,
            erase_fail: s.erase_fail,
            program_fail: s.program_fail,
            ecc_mask: s.ecc_mask,
            ecc_corrected: s.ecc_corrected,
        }
    }
}

#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(default)]
struct AddressDef {
    row_dummy: u8,
    row_bytes: u8,
    column_bytes: u8,
    read_dummy: u8,
}

impl Default for AddressDef {
    fn default() -> Self {
        let a = AddressFormat::STANDARD;
        Self {
            row_dummy: a.row_dummy,
            row_bytes: a.row_bytes,
            column_bytes: a.column_bytes,
            read_dummy: a.read_dummy,
        }
    }
}

/// Feature flags for chips (RON format)
#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(default)]
struct FeaturesDef {
    ecc_status: bool,
    block_lock: bool,
    program_execute: bool,
    buffer_mode: bool,
}

impl Default for FeaturesDef {
    fn default() -> Self {
        Self {
            ecc_status: true,
            block_lock: true,
            program_execute: true,
            buffer_mode: false,
        }
    }
}

impl From<FeaturesDef> for Features {
    fn from(def: FeaturesDef) -> Self {
        let mut f = Features::empty();
        if def.ecc_status {
            f |= Features::ECC_STATUS;
        }
        if def.block_lock {
            f |= Features::BLOCK_LOCK;
        }
        if def.program_execute {
            f |= Features::PROGRAM_EXECUTE;
        }
        if def.buffer_mode {
            f |= Features::BUFFER_MODE;
        }
        f
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
struct ChipDef {
    name: String,
    device_id: u16,
    #[serde(default = "default_device_id_len")]
    device_id_len: u8,
    page_size: u32,
    spare_size: u32,
    pages_per_block: u32,
    pages_total: u32,
    #[serde(default)]
    opcodes: OpcodesDef,
    #[serde(default)]
    registers: RegistersDef,
    #[serde(default)]
    status: StatusDef,
    #[serde(default)]
    address: AddressDef,
    #[serde(default = "default_pad_byte")]
    pad_byte: u8,
    #[serde(default)]
    features: FeaturesDef,
}

fn default_device_id_len() -> u8 {
    1
}

fn default_pad_byte() -> u8 {
    0xFF
}

#[derive(Debug, Clone, serde::Deserialize)]
struct VendorDef {
    vendor: String,
    manufacturer_id: u8,
    chips: Vec<ChipDef>,
}

// ============================================================================
// Chip database
// ============================================================================

/// Runtime collection of chip profiles
///
/// Lookups search the most recently added profiles first, so a database
/// file can override a built-in entry with the same ids.
#[derive(Debug, Clone, Default)]
pub struct ChipDatabase {
    chips: Vec<ChipProfile>,
}

impl ChipDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        Self { chips: Vec::new() }
    }

    /// Create a database holding the built-in profiles
    pub fn with_builtin() -> Self {
        Self {
            chips: BUILTIN_CHIPS.to_vec(),
        }
    }

    /// Load chip definitions from a RON file
    pub fn load_file(&mut self, path: &Path) -> Result<usize, ChipDbError> {
        let content = fs::read_to_string(path)?;
        self.load_ron(&content)
    }

    /// Load chip definitions from a RON string
    ///
    /// Every profile is validated; nothing is added if any entry fails.
    pub fn load_ron(&mut self, content: &str) -> Result<usize, ChipDbError> {
        let vendor_def: VendorDef = ron::from_str(content)?;
        let mut loaded = Vec::with_capacity(vendor_def.chips.len());

        for chip_def in vendor_def.chips {
            let chip = ChipProfile {
                vendor: Cow::Owned(vendor_def.vendor.clone()),
                name: Cow::Owned(chip_def.name),
                manufacturer_id: vendor_def.manufacturer_id,
                device_id: chip_def.device_id,
                device_id_len: chip_def.device_id_len,
                page_size: chip_def.page_size,
                spare_size: chip_def.spare_size,
                pages_per_block: chip_def.pages_per_block,
                pages_total: chip_def.pages_total,
                opcodes: chip_def.opcodes.into(),
                registers: FeatureRegisters {
                    protection: chip_def.registers.protection,
                    config: chip_def.registers.config,
                    status: chip_def.registers.status,
                },
                status: StatusLayout {
                    busy: chip_def.status.busy,
                    write_enable_latch: chip_def.status.write_enable_latch,
                    erase_fail: chip_def.status.erase_fail,
                    program_fail: chip_def.status.program_fail,
                    ecc_mask: chip_def.status.ecc_mask,
                    ecc_corrected: chip_def.status.ecc_corrected,
                },
                address: AddressFormat {
                    row_dummy: chip_def.address.row_dummy,
                    row_bytes: chip_def.address.row_bytes,
                    column_bytes: chip_def.address.column_bytes,
                    read_dummy: chip_def.address.read_dummy,
                },
                pad_byte: chip_def.pad_byte,
                features: chip_def.features.into(),
            };
            chip.validate().map_err(|e| {
                ChipDbError::Validation(format!("{} {}: {}", chip.vendor, chip.name, e))
            })?;
            loaded.push(chip);
        }

        let count = loaded.len();
        self.chips.extend(loaded);
        Ok(count)
    }

    /// Load all RON files from a directory
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, ChipDbError> {
        let mut total = 0;

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "ron") {
                total += self.load_file(&path)?;
            }
        }

        Ok(total)
    }

    /// Get all chips in the database
    pub fn chips(&self) -> &[ChipProfile] {
        &self.chips
    }

    /// Get the number of chips in the database
    pub fn len(&self) -> usize {
        self.chips.len()
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }

    /// Find a chip by its manufacturer and device ids
    pub fn find_by_id(&self, manufacturer: u8, device: u16) -> Option<&ChipProfile> {
        self.chips
            .iter()
            .rev()
            .find(|c| c.matches_id(manufacturer, device))
    }

    /// Find a chip matching the raw bytes returned by read-ID
    pub fn find_by_raw_id(&self, raw: [u8; 3]) -> Option<&ChipProfile> {
        self.chips.iter().rev().find(|c| c.matches_raw_id(raw))
    }

    /// Find a chip by exact name (case-insensitive)
    pub fn find_by_name(&self, name: &str) -> Option<&ChipProfile> {
        self.chips
            .iter()
            .rev()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Find chips by vendor (case-insensitive partial match)
    pub fn find_by_vendor(&self, vendor: &str) -> Vec<&ChipProfile> {
        let vendor_lower = vendor.to_lowercase();
        self.chips
            .iter()
            .filter(|c| c.vendor.to_lowercase().contains(&vendor_lower))
            .collect()
    }

    /// Iterate over all chips
    pub fn iter(&self) -> impl Iterator<Item = &ChipProfile> {
        self.chips.iter()
    }
}
