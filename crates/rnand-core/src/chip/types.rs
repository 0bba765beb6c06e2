//! Chip profile type definitions

use alloc::borrow::Cow;

use super::features::Features;
use crate::error::{Error, Result};
use crate::spi::{opcodes, AddressFormat, MAX_HEADER_LEN};

/// Opcode set for one chip family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcodes {
    /// Page read to cache
    pub page_read: u8,
    /// Read from cache
    pub read_cache: u8,
    /// Program load (cache fill)
    pub program_load: u8,
    /// Program execute (cache commit); unused without `PROGRAM_EXECUTE`
    pub program_execute: u8,
    /// Block erase
    pub block_erase: u8,
    /// Get feature (status register read)
    pub get_feature: u8,
    /// Set feature (status register write)
    pub set_feature: u8,
    /// Device reset
    pub reset: u8,
    /// Write enable
    pub write_enable: u8,
    /// Write disable
    pub write_disable: u8,
    /// Read JEDEC ID
    pub read_id: u8,
}

impl Opcodes {
    /// The common serial NAND command set
    pub const STANDARD: Self = Self {
        page_read: opcodes::PAGE_READ,
        read_cache: opcodes::FAST_READ_CACHE,
        program_load: opcodes::PROGRAM_LOAD,
        program_execute: opcodes::PROGRAM_EXECUTE,
        block_erase: opcodes::BLOCK_ERASE,
        get_feature: opcodes::GET_FEATURE,
        set_feature: opcodes::SET_FEATURE,
        reset: opcodes::RESET,
        write_enable: opcodes::WRITE_ENABLE,
        write_disable: opcodes::WRITE_DISABLE,
        read_id: opcodes::READ_ID,
    };
}

impl Default for Opcodes {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Feature register addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureRegisters {
    /// Block protection register
    pub protection: u8,
    /// Configuration register
    pub config: u8,
    /// Status register
    pub status: u8,
}

impl FeatureRegisters {
    /// Register map shared by all observed families
    pub const STANDARD: Self = Self {
        protection: opcodes::REG_PROTECTION,
        config: opcodes::REG_CONFIG,
        status: opcodes::REG_STATUS,
    };
}

impl Default for FeatureRegisters {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// On-die ECC result for the last page read, in increasing severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum EccStatus {
    /// No bit errors detected
    #[default]
    NoError,
    /// Bit errors detected and corrected
    Corrected,
    /// Bit errors detected that could not be corrected
    Uncorrectable,
}

/// Decoded status register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    /// Operation in progress
    pub busy: bool,
    /// Write enable latch
    pub write_enabled: bool,
    /// Last erase failed
    pub erase_failed: bool,
    /// Last program failed
    pub program_failed: bool,
    /// ECC result of the last page read
    pub ecc: EccStatus,
}

/// Status register bit masks
///
/// The ECC field is `ecc_mask`; a masked value of zero means no error,
/// `ecc_corrected` means corrected, and any other non-zero value is
/// treated as uncorrectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusLayout {
    /// Busy / operation-in-progress bit
    pub busy: u8,
    /// Write enable latch bit
    pub write_enable_latch: u8,
    /// Erase failure bit
    pub erase_fail: u8,
    /// Program failure bit
    pub program_fail: u8,
    /// ECC result field
    pub ecc_mask: u8,
    /// Masked ECC value reporting corrected errors
    pub ecc_corrected: u8,
}

impl StatusLayout {
    /// OIP 0x01, WEL 0x02, E_FAIL 0x04, P_FAIL 0x08, ECC 0x30
    pub const STANDARD: Self = Self {
        busy: opcodes::SR_OIP,
        write_enable_latch: opcodes::SR_WEL,
        erase_fail: opcodes::SR_E_FAIL,
        program_fail: opcodes::SR_P_FAIL,
        ecc_mask: opcodes::SR_ECC_MASK,
        ecc_corrected: opcodes::SR_ECC_CORRECTED,
    };

    /// Decode a raw status register value
    pub fn decode(&self, value: u8) -> Status {
        let ecc = match value & self.ecc_mask {
            0 => EccStatus::NoError,
            v if v == self.ecc_corrected => EccStatus::Corrected,
            _ => EccStatus::Uncorrectable,
        };
        Status {
            busy: value & self.busy != 0,
            write_enabled: value & self.write_enable_latch != 0,
            erase_failed: value & self.erase_fail != 0,
            program_failed: value & self.program_fail != 0,
            ecc,
        }
    }
}

impl Default for StatusLayout {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Static description of one serial NAND chip family
///
/// Profiles are created once, either from the built-in table or from a
/// chip database file, and then only read. Every engine operation is
/// driven by the values in here; there is no per-chip code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipProfile {
    /// Vendor name (e.g., "Winbond")
    pub vendor: Cow<'static, str>,
    /// Chip name (e.g., "W25N01GV")
    pub name: Cow<'static, str>,
    /// JEDEC manufacturer ID
    pub manufacturer_id: u8,
    /// Device ID as returned after the manufacturer byte
    pub device_id: u16,
    /// Number of device ID bytes (1 or 2)
    pub device_id_len: u8,
    /// Main area bytes per page
    pub page_size: u32,
    /// Spare (OOB) bytes per page
    pub spare_size: u32,
    /// Pages per erase block
    pub pages_per_block: u32,
    /// Total number of pages
    pub pages_total: u32,
    /// Command opcodes
    pub opcodes: Opcodes,
    /// Feature register addresses
    pub registers: FeatureRegisters,
    /// Status register layout
    pub status: StatusLayout,
    /// Address field layout
    pub address: AddressFormat,
    /// Value used to pad partial pages when programming
    pub pad_byte: u8,
    /// Optional capabilities
    pub features: Features,
}

impl ChipProfile {
    /// Bytes moved to or from the cache per page (main + spare)
    pub const fn cache_unit(&self) -> usize {
        self.page_size as usize + self.spare_size as usize
    }

    /// Main-area capacity in bytes
    pub const fn total_size(&self) -> u64 {
        self.page_size as u64 * self.pages_total as u64
    }

    /// Number of erase blocks
    pub const fn block_count(&self) -> u32 {
        self.pages_total / self.pages_per_block
    }

    /// Erase block size in bytes (main area only)
    pub const fn block_size(&self) -> u32 {
        self.page_size * self.pages_per_block
    }

    /// First page of `block`
    pub const fn block_first_page(&self, block: u32) -> u32 {
        block * self.pages_per_block
    }

    /// Expected (manufacturer, device) ids
    pub const fn id(&self) -> (u8, u16) {
        (self.manufacturer_id, self.device_id)
    }

    /// Check if this profile matches the given ids
    pub fn matches_id(&self, manufacturer: u8, device: u16) -> bool {
        self.manufacturer_id == manufacturer && self.device_id == device
    }

    /// Split raw read-ID bytes into (manufacturer, device) for this family
    pub fn decode_id(&self, raw: [u8; 3]) -> (u8, u16) {
        let device = if self.device_id_len >= 2 {
            u16::from_be_bytes([raw[1], raw[2]])
        } else {
            raw[1] as u16
        };
        (raw[0], device)
    }

    /// Check raw read-ID bytes against this profile
    pub fn matches_raw_id(&self, raw: [u8; 3]) -> bool {
        let (manufacturer, device) = self.decode_id(raw);
        self.matches_id(manufacturer, device)
    }

    /// Check geometry and encoding constraints
    ///
    /// The engine only accepts validated profiles, so a bad table entry is
    /// reported once here instead of as a malformed command on the bus.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.pages_total == 0 || self.pages_per_block == 0 {
            return Err(Error::InvalidProfile("zero page size or page count"));
        }
        if self.page_size.checked_add(self.spare_size).is_none()
            || self.page_size.checked_mul(self.pages_per_block).is_none()
        {
            return Err(Error::InvalidProfile("page geometry overflows"));
        }
        if self.pages_total % self.pages_per_block != 0 {
            return Err(Error::InvalidProfile("page count is not a whole number of blocks"));
        }
        if !(1..=4).contains(&self.address.row_bytes)
            || !(1..=4).contains(&self.address.column_bytes)
        {
            return Err(Error::InvalidProfile("address width must be 1 to 4 bytes"));
        }
        if self.pages_total - 1 > self.address.max_row() {
            return Err(Error::InvalidProfile("page count exceeds row address width"));
        }
        let row_header = 1 + self.address.row_dummy as usize + self.address.row_bytes as usize;
        let column_header =
            1 + self.address.column_bytes as usize + self.address.read_dummy as usize;
        let load_header = if self.features.contains(Features::PROGRAM_EXECUTE) {
            1 + self.address.column_bytes as usize
        } else {
            row_header + self.address.column_bytes as usize
        };
        if row_header.max(column_header).max(load_header) > MAX_HEADER_LEN {
            return Err(Error::InvalidProfile("command header too long"));
        }
        if self.address.column_bytes < 4
            && self.cache_unit() as u64 > 1u64 << (self.address.column_bytes as u32 * 8)
        {
            return Err(Error::InvalidProfile("cache unit exceeds column address width"));
        }
        if self.status.busy == 0 {
            return Err(Error::InvalidProfile("busy bit mask is empty"));
        }
        if self.status.ecc_corrected & !self.status.ecc_mask != 0 {
            return Err(Error::InvalidProfile("ECC corrected value outside ECC field"));
        }
        if !(1..=2).contains(&self.device_id_len) {
            return Err(Error::InvalidProfile("device ID must be 1 or 2 bytes"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::W25N01GV;

    #[test]
    fn test_status_decode() {
        let layout = StatusLayout::STANDARD;

        let s = layout.decode(0x00);
        assert!(!s.busy);
        assert_eq!(s.ecc, EccStatus::NoError);

        let s = layout.decode(0x03);
        assert!(s.busy);
        assert!(s.write_enabled);

        let s = layout.decode(0x0C);
        assert!(s.erase_failed);
        assert!(s.program_failed);

        assert_eq!(layout.decode(0x10).ecc, EccStatus::Corrected);
        assert_eq!(layout.decode(0x20).ecc, EccStatus::Uncorrectable);
        // Reserved encoding is never treated as clean
        assert_eq!(layout.decode(0x30).ecc, EccStatus::Uncorrectable);
    }

    #[test]
    fn test_ecc_severity_order() {
        assert!(EccStatus::NoError < EccStatus::Corrected);
        assert!(EccStatus::Corrected < EccStatus::Uncorrectable);
    }

    #[test]
    fn test_geometry() {
        let chip = W25N01GV;
        assert_eq!(chip.cache_unit(), 2112);
        assert_eq!(chip.total_size(), 128 * 1024 * 1024);
        assert_eq!(chip.block_count(), 1024);
        assert_eq!(chip.block_size(), 128 * 1024);
        assert_eq!(chip.block_first_page(3), 192);
    }

    #[test]
    fn test_validate_row_width() {
        let mut chip = W25N01GV;
        chip.pages_total = 0x2_0000;
        assert!(matches!(chip.validate(), Err(Error::InvalidProfile(_))));

        chip.address.row_bytes = 3;
        assert_eq!(chip.validate(), Ok(()));
    }

    #[test]
    fn test_decode_id() {
        assert_eq!(W25N01GV.decode_id([0xEF, 0xAA, 0x21]), (0xEF, 0xAA21));
        assert!(W25N01GV.matches_raw_id([0xEF, 0xAA, 0x21]));
        assert!(crate::chip::DS35Q1GA.matches_raw_id([0xE5, 0x71, 0x71]));
        assert!(!crate::chip::DS35Q1GA.matches_raw_id([0xE5, 0x72, 0x71]));
    }

    #[test]
    fn test_validate_geometry_overflow() {
        let mut chip = W25N01GV;
        chip.page_size = 0xFFFF_FF00;
        chip.spare_size = 512;
        assert_eq!(
            chip.validate(),
            Err(Error::InvalidProfile("page geometry overflows"))
        );

        let mut chip = W25N01GV;
        chip.page_size = 0x0400_0000;
        assert_eq!(
            chip.validate(),
            Err(Error::InvalidProfile("page geometry overflows"))
        );
    }

    #[test]
    fn test_validate_load_header() {
        let mut chip = W25N01GV;
        chip.features.remove(Features::PROGRAM_EXECUTE);
        assert_eq!(chip.validate(), Ok(()));

        // 1 + 4 + 4 fits a row command, but a row-addressed load adds 4 more
        chip.address.row_dummy = 4;
        chip.address.row_bytes = 4;
        chip.address.column_bytes = 4;
        assert_eq!(
            chip.validate(),
            Err(Error::InvalidProfile("command header too long"))
        );
        chip.features.insert(Features::PROGRAM_EXECUTE);
        assert_eq!(chip.validate(), Ok(()));
    }

    #[test]
    fn test_validate_blocks() {
        let mut chip = W25N01GV;
        chip.pages_total = 100;
        assert!(chip.validate().is_err());
    }
}
