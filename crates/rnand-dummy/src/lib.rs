//! rnand-dummy - In-memory serial NAND emulator for testing
//!
//! This crate provides a command channel that emulates a cached SPI NAND
//! chip in memory: page array, cache register, feature registers, busy
//! timing and fault injection. It's useful for testing and development
//! without real hardware.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec;
use alloc::vec::Vec;

use rnand_core::chip::{ChipProfile, EccStatus, Features, W25N01GV};
use rnand_core::error::ChannelError;
use rnand_core::programmer::CommandChannel;

/// Configuration for the dummy chip
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Chip being emulated; opcodes, registers and geometry come from here
    pub profile: ChipProfile,
    /// Status reads that report busy after each array operation
    pub busy_polls: u32,
    /// Block protection register value at power-up
    pub protection: u8,
    /// Largest transaction accepted, as reported by `max_transfer_len`
    pub max_transfer: usize,
}

impl DummyConfig {
    /// Emulate `profile` with no busy time and no protection
    pub fn new(profile: ChipProfile) -> Self {
        Self {
            profile,
            busy_polls: 0,
            protection: 0,
            max_transfer: usize::MAX,
        }
    }
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self::new(W25N01GV)
    }
}

/// One command seen by the emulator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// First command byte
    pub opcode: u8,
    /// Row address, for commands that carry one
    pub row: Option<u32>,
    /// Bytes written, header included
    pub write_len: usize,
    /// Bytes requested back
    pub read_len: usize,
}

/// Dummy serial NAND chip
///
/// Pages are stored sparsely; a page never programmed reads back erased
/// (all 0xFF, spare included).
pub struct DummyNand {
    config: DummyConfig,
    unit: usize,
    pages: BTreeMap<u32, Vec<u8>>,
    cache: Vec<u8>,
    /// Fail and ECC bits of the status register
    status: u8,
    busy_remaining: u32,
    write_enabled: bool,
    protection: u8,
    config_reg: u8,
    fail_program: BTreeSet<u32>,
    fail_erase: BTreeSet<u32>,
    ecc: BTreeMap<u32, EccStatus>,
    fail_transaction: Option<usize>,
    log: Vec<Transaction>,
}

impl DummyNand {
    /// Create a new dummy chip with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let unit = config.profile.cache_unit();
        Self {
            unit,
            pages: BTreeMap::new(),
            cache: vec![0xFF; unit],
            status: 0,
            busy_remaining: 0,
            write_enabled: false,
            protection: config.protection,
            config_reg: 0,
            fail_program: BTreeSet::new(),
            fail_erase: BTreeSet::new(),
            ecc: BTreeMap::new(),
            fail_transaction: None,
            log: Vec::new(),
            config,
        }
    }

    /// Create a new dummy chip emulating a W25N01GV
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// The profile being emulated
    pub fn profile(&self) -> &ChipProfile {
        &self.config.profile
    }

    /// Store `data` as the contents of `page`, bypassing the command set
    ///
    /// `data` may cover the main area only or main plus spare; the rest of
    /// the page reads back as 0xFF.
    pub fn fill_page(&mut self, page: u32, data: &[u8]) {
        let mut stored = vec![0xFF; self.unit];
        let len = data.len().min(self.unit);
        stored[..len].copy_from_slice(&data[..len]);
        self.pages.insert(page, stored);
    }

    /// Fill every page with `f(page, offset)` over the main area
    pub fn fill_with(&mut self, f: impl Fn(u32, usize) -> u8) {
        let page_size = self.config.profile.page_size as usize;
        for page in 0..self.config.profile.pages_total {
            let data: Vec<u8> = (0..page_size).map(|k| f(page, k)).collect();
            self.fill_page(page, &data);
        }
    }

    /// Contents of `page` (main + spare) as currently stored
    pub fn page(&self, page: u32) -> Vec<u8> {
        self.pages
            .get(&page)
            .cloned()
            .unwrap_or_else(|| vec![0xFF; self.unit])
    }

    /// Main area of `page`
    pub fn page_main(&self, page: u32) -> Vec<u8> {
        let mut data = self.page(page);
        data.truncate(self.config.profile.page_size as usize);
        data
    }

    /// Current block protection register value
    pub fn protection(&self) -> u8 {
        self.protection
    }

    /// Current configuration register value
    pub fn config_register(&self) -> u8 {
        self.config_reg
    }

    /// Change the number of busy status reads after each array operation
    pub fn set_busy_polls(&mut self, polls: u32) {
        self.config.busy_polls = polls;
    }

    /// Make program execute on `page` report a program failure
    pub fn fail_program_at(&mut self, page: u32) {
        self.fail_program.insert(page);
    }

    /// Make erasing `block` report an erase failure
    pub fn fail_erase_at(&mut self, block: u32) {
        self.fail_erase.insert(block);
    }

    /// Report `ecc` whenever `page` is read to cache
    pub fn set_ecc(&mut self, page: u32, ecc: EccStatus) {
        self.ecc.insert(page, ecc);
    }

    /// Fail the transaction with zero-based index `index` at the transport
    pub fn fail_transaction_at(&mut self, index: usize) {
        self.fail_transaction = Some(index);
    }

    /// All transactions seen so far, including failed ones
    pub fn transactions(&self) -> &[Transaction] {
        &self.log
    }

    /// Number of transactions with the given opcode
    pub fn count(&self, opcode: u8) -> usize {
        self.log.iter().filter(|t| t.opcode == opcode).count()
    }

    /// Forget the transaction log
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn row(&self, cmd: &[u8]) -> Result<u32, ChannelError> {
        let addr = &self.config.profile.address;
        let start = 1 + addr.row_dummy as usize;
        let end = start + addr.row_bytes as usize;
        let bytes = cmd.get(start..end).ok_or(ChannelError::ShortResponse)?;
        Ok(bytes.iter().fold(0u32, |acc, &b| acc << 8 | u32::from(b)))
    }

    fn column(&self, cmd: &[u8]) -> Result<usize, ChannelError> {
        self.column_at(cmd, 1)
    }

    fn column_at(&self, cmd: &[u8], offset: usize) -> Result<usize, ChannelError> {
        let bytes = self.config.profile.address.column_bytes as usize;
        let field = cmd
            .get(offset..offset + bytes)
            .ok_or(ChannelError::ShortResponse)?;
        Ok(field.iter().fold(0usize, |acc, &b| acc << 8 | usize::from(b)))
    }

    fn start_busy(&mut self) {
        self.busy_remaining = self.config.busy_polls;
    }

    fn ecc_bits(&self, ecc: EccStatus) -> u8 {
        let layout = &self.config.profile.status;
        match ecc {
            EccStatus::NoError => 0,
            EccStatus::Corrected => layout.ecc_corrected,
            EccStatus::Uncorrectable => match layout.ecc_mask & !layout.ecc_corrected {
                0 => layout.ecc_mask,
                bits => bits,
            },
        }
    }

    fn status_value(&mut self) -> u8 {
        let layout = self.config.profile.status;
        let mut value = self.status;
        if self.write_enabled {
            value |= layout.write_enable_latch;
        }
        if self.busy_remaining > 0 {
            self.busy_remaining -= 1;
            value |= layout.busy;
        }
        value
    }

    fn handle_read_id(&self, response: &mut [u8]) {
        let profile = &self.config.profile;
        let dev = profile.device_id.to_be_bytes();
        let id: &[u8] = if profile.device_id_len >= 2 {
            &dev
        } else {
            &dev[1..]
        };
        for (i, b) in response.iter_mut().enumerate() {
            *b = match i {
                0 => profile.manufacturer_id,
                _ => id[(i - 1) % id.len()],
            };
        }
    }

    fn handle_get_feature(&mut self, cmd: &[u8], response: &mut [u8]) {
        let regs = self.config.profile.registers;
        let value = match cmd.get(1) {
            Some(&r) if r == regs.status => self.status_value(),
            Some(&r) if r == regs.protection => self.protection,
            Some(&r) if r == regs.config => self.config_reg,
            _ => 0,
        };
        if let Some(b) = response.first_mut() {
            *b = value;
        }
    }

    fn handle_set_feature(&mut self, cmd: &[u8]) {
        let regs = self.config.profile.registers;
        if let (Some(&reg), Some(&value)) = (cmd.get(1), cmd.get(2)) {
            if reg == regs.protection {
                self.protection = value;
            } else if reg == regs.config {
                self.config_reg = value;
            }
        }
    }

    fn handle_page_read(&mut self, page: u32) {
        self.cache = self.page(page);
        let ecc = self.ecc.get(&page).copied().unwrap_or_default();
        let layout = self.config.profile.status;
        self.status &= !layout.ecc_mask;
        self.status |= self.ecc_bits(ecc);
        self.start_busy();
    }

    fn handle_read_cache(&self, column: usize, response: &mut [u8]) {
        for (i, b) in response.iter_mut().enumerate() {
            *b = self.cache.get(column + i).copied().unwrap_or(0xFF);
        }
    }

    fn handle_program_load(&mut self, column: usize, data: &[u8]) {
        self.cache.fill(0xFF);
        for (i, &b) in data.iter().enumerate() {
            if let Some(slot) = self.cache.get_mut(column + i) {
                *slot = b;
            }
        }
    }

    fn handle_program_execute(&mut self, page: u32) {
        let layout = self.config.profile.status;
        self.status &= !(layout.ecc_mask | layout.program_fail | layout.erase_fail);
        self.start_busy();

        let allowed = self.write_enabled
            && self.protection == 0
            && page < self.config.profile.pages_total
            && !self.fail_program.contains(&page);
        self.write_enabled = false;
        if !allowed {
            self.status |= layout.program_fail;
            return;
        }

        let unit = self.unit;
        let stored = self
            .pages
            .entry(page)
            .or_insert_with(|| vec![0xFF; unit]);
        // NAND programming: can only change 1 -> 0
        for (dst, &src) in stored.iter_mut().zip(self.cache.iter()) {
            *dst &= src;
        }
    }

    fn handle_block_erase(&mut self, page: u32) {
        let layout = self.config.profile.status;
        let pages_per_block = self.config.profile.pages_per_block;
        let block = page / pages_per_block;
        let first = block * pages_per_block;

        self.status &= !(layout.ecc_mask | layout.program_fail | layout.erase_fail);
        self.start_busy();

        let allowed = self.write_enabled
            && self.protection == 0
            && block < self.config.profile.block_count()
            && !self.fail_erase.contains(&block);
        self.write_enabled = false;
        if !allowed {
            self.status |= layout.erase_fail;
            return;
        }

        let erased: Vec<u32> = self
            .pages
            .range(first..first + pages_per_block)
            .map(|(&p, _)| p)
            .collect();
        for p in erased {
            self.pages.remove(&p);
        }
    }

    fn handle_reset(&mut self) {
        self.status = 0;
        self.write_enabled = false;
        self.cache.fill(0xFF);
        self.start_busy();
    }
}

impl CommandChannel for DummyNand {
    fn transceive(&mut self, cmd: &[u8], response: &mut [u8]) -> Result<(), ChannelError> {
        let opcode = *cmd.first().ok_or(ChannelError::ShortResponse)?;
        let ops = self.config.profile.opcodes;
        let commit_on_load = !self
            .config
            .profile
            .features
            .contains(Features::PROGRAM_EXECUTE);
        let is_row_cmd = opcode == ops.page_read
            || (opcode == ops.program_execute && !commit_on_load)
            || (opcode == ops.program_load && commit_on_load)
            || opcode == ops.block_erase;
        let row = if is_row_cmd { self.row(cmd).ok() } else { None };

        let index = self.log.len();
        self.log.push(Transaction {
            opcode,
            row,
            write_len: cmd.len(),
            read_len: response.len(),
        });

        if self.fail_transaction == Some(index) {
            log::debug!("dummy: injected transport failure at transaction {}", index);
            return Err(ChannelError::TransferFailed);
        }
        if cmd.len() + response.len() > self.config.max_transfer {
            return Err(ChannelError::FrameTooLarge);
        }

        match opcode {
            op if op == ops.read_id => self.handle_read_id(response),
            op if op == ops.get_feature => self.handle_get_feature(cmd, response),
            op if op == ops.set_feature => self.handle_set_feature(cmd),
            op if op == ops.write_enable => self.write_enabled = true,
            op if op == ops.write_disable => self.write_enabled = false,
            op if op == ops.reset => self.handle_reset(),
            op if op == ops.page_read => {
                let page = self.row(cmd)?;
                self.handle_page_read(page);
            }
            op if op == ops.read_cache => {
                let column = self.column(cmd)?;
                self.handle_read_cache(column, response);
            }
            op if op == ops.program_load && commit_on_load => {
                // Row address ahead of the column; the load programs the page
                let addr = self.config.profile.address;
                let row_len = addr.row_dummy as usize + addr.row_bytes as usize;
                let page = self.row(cmd)?;
                let column = self.column_at(cmd, 1 + row_len)?;
                let header = 1 + row_len + addr.column_bytes as usize;
                let data = cmd.get(header..).unwrap_or(&[]);
                self.handle_program_load(column, data);
                self.handle_program_execute(page);
            }
            op if op == ops.program_load => {
                let column = self.column(cmd)?;
                let header = 1 + self.config.profile.address.column_bytes as usize;
                let data = cmd.get(header..).unwrap_or(&[]);
                self.handle_program_load(column, data);
            }
            op if op == ops.program_execute => {
                let page = self.row(cmd)?;
                self.handle_program_execute(page);
            }
            op if op == ops.block_erase => {
                let page = self.row(cmd)?;
                self.handle_block_erase(page);
            }
            _ => {
                log::debug!("dummy: unsupported opcode 0x{:02X}", opcode);
                return Err(ChannelError::Unsupported);
            }
        }
        Ok(())
    }

    fn max_transfer_len(&self) -> usize {
        self.config.max_transfer
    }

    fn delay_us(&mut self, _us: u32) {
        // No delay needed for in-memory operations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::borrow::Cow;
    use rnand_core::chip::{FeatureRegisters, Features, Opcodes, StatusLayout, DS35Q1GA};
    use rnand_core::error::{DeviceFailure, Error, RangeError};
    use rnand_core::flash;
    use rnand_core::protocol::{self, EngineConfig, PageEngine, PollConfig, PollOutcome};
    use rnand_core::spi::{opcodes, AddressFormat};

    fn profile(page_size: u32, pages_per_block: u32, pages_total: u32) -> ChipProfile {
        ChipProfile {
            vendor: Cow::Borrowed("Test"),
            name: Cow::Borrowed("SIM"),
            manufacturer_id: 0xEF,
            device_id: 0xAA21,
            device_id_len: 2,
            page_size,
            spare_size: 64,
            pages_per_block,
            pages_total,
            opcodes: Opcodes::STANDARD,
            registers: FeatureRegisters::STANDARD,
            status: StatusLayout::STANDARD,
            address: AddressFormat::STANDARD,
            pad_byte: 0xFF,
            features: Features::default(),
        }
    }

    fn counting(page: u32, k: usize) -> u8 {
        (page as usize * 31 + k) as u8
    }

    fn status_reads(nand: &DummyNand) -> usize {
        nand.count(opcodes::GET_FEATURE)
    }

    #[test]
    fn test_read_id() {
        let mut nand = DummyNand::new_default();
        assert_eq!(
            protocol::identify(&mut nand, &W25N01GV).unwrap(),
            (0xEF, 0xAA21)
        );
        protocol::verify_identity(&mut nand, &W25N01GV).unwrap();

        let mut nand = DummyNand::new(DummyConfig::new(DS35Q1GA));
        assert_eq!(
            protocol::read_id_raw(&mut nand, opcodes::READ_ID).unwrap(),
            [0xE5, 0x71, 0x71]
        );
        assert_eq!(
            protocol::verify_identity(&mut nand, &W25N01GV),
            Err(Error::IdentityMismatch {
                expected: (0xEF, 0xAA21),
                found: (0xE5, 0x7171),
            })
        );
    }

    #[test]
    fn test_concrete_two_page_read() {
        let chip = profile(2048, 2, 4);
        let mut nand = DummyNand::new(DummyConfig::new(chip.clone()));
        nand.fill_with(|_, k| k as u8);

        let mut out = vec![0u8; 4096];
        let report = flash::read_range(&mut nand, &chip, 1, 2, &mut out).unwrap();

        let mut expected = nand.page_main(1);
        expected.extend(nand.page_main(2));
        assert_eq!(out, expected);
        assert_eq!(report.pages, 2);
        assert!(report.corrected_pages.is_empty());
        assert_eq!(nand.count(opcodes::PAGE_READ), 2);
        let selected: Vec<_> = nand
            .transactions()
            .iter()
            .filter(|t| t.opcode == opcodes::PAGE_READ)
            .map(|t| t.row)
            .collect();
        assert_eq!(selected, [Some(1), Some(2)]);
    }

    #[test]
    fn test_read_range_matches_every_page() {
        let chip = profile(64, 4, 16);
        let mut nand = DummyNand::new(DummyConfig::new(chip.clone()));
        nand.fill_with(counting);

        for start in 0..16u32 {
            for count in 0..=(16 - start) {
                let mut out = vec![0u8; count as usize * 64];
                flash::read_range(&mut nand, &chip, start, count, &mut out).unwrap();
                for i in 0..count {
                    for k in 0..64usize {
                        assert_eq!(out[i as usize * 64 + k], counting(start + i, k));
                    }
                }
            }
        }
    }

    #[test]
    fn test_cache_read_covers_spare() {
        let chip = profile(64, 4, 16);
        let mut nand = DummyNand::new(DummyConfig::new(chip.clone()));
        nand.fill_with(counting);

        let mut out = vec![0u8; 64];
        flash::read_range(&mut nand, &chip, 3, 1, &mut out).unwrap();
        let cache_read = nand
            .transactions()
            .iter()
            .find(|t| t.opcode == opcodes::FAST_READ_CACHE)
            .unwrap();
        assert_eq!(cache_read.read_len, 64 + 64);
    }

    #[test]
    fn test_busy_then_ready() {
        let chip = profile(64, 4, 16);
        for busy in 0..5u32 {
            let mut nand = DummyNand::new(DummyConfig {
                busy_polls: busy,
                ..DummyConfig::new(chip.clone())
            });
            protocol::write_enable(&mut nand, &chip).unwrap();
            nand.transceive(&[opcodes::BLOCK_ERASE, 0, 0, 0], &mut []).unwrap();
            nand.clear_log();

            let outcome = protocol::poll_until_ready(&mut nand, &chip, PollConfig::new(5, 1));
            assert_eq!(outcome, PollOutcome::Ready(EccStatus::NoError));
            assert_eq!(status_reads(&nand), busy as usize + 1);
        }
    }

    #[test]
    fn test_busy_exhausts_budget() {
        let chip = profile(64, 4, 16);
        let mut nand = DummyNand::new(DummyConfig {
            busy_polls: 5,
            ..DummyConfig::new(chip.clone())
        });
        let config = EngineConfig {
            read_poll: PollConfig::new(5, 1),
            ..EngineConfig::default()
        };
        let mut engine = PageEngine::new(&chip, config).unwrap();

        assert_eq!(
            engine.read_page(&mut nand, 0),
            Err(Error::Timeout { attempts: 5 })
        );
        assert_eq!(status_reads(&nand), 5);
        assert_eq!(nand.count(opcodes::FAST_READ_CACHE), 0);
    }

    #[test]
    fn test_program_then_read_back() {
        let chip = profile(128, 4, 32);
        let mut nand = DummyNand::new(DummyConfig {
            busy_polls: 3,
            ..DummyConfig::new(chip.clone())
        });
        nand.fill_with(|_, _| 0x5A);

        flash::erase_range(&mut nand, &chip, 1, 2).unwrap();
        let data: Vec<u8> = (0..8 * 128).map(|i| (i * 13 % 251) as u8).collect();
        assert_eq!(flash::program_range(&mut nand, &chip, 4, &data), Ok(8));

        let mut out = vec![0u8; data.len()];
        flash::read_range(&mut nand, &chip, 4, 8, &mut out).unwrap();
        assert_eq!(out, data);
        // Neighbouring blocks untouched
        assert!(nand.page_main(3).iter().all(|&b| b == 0x5A));
        assert!(nand.page_main(12).iter().all(|&b| b == 0x5A));
    }

    #[test]
    fn test_program_only_clears_bits() {
        let chip = profile(64, 4, 16);
        let mut nand = DummyNand::new(DummyConfig::new(chip.clone()));
        nand.fill_page(0, &[0xF0; 64]);

        flash::program_range(&mut nand, &chip, 0, &[0x0F; 64]).unwrap();
        assert!(nand.page_main(0).iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_partial_page_padded() {
        let chip = profile(64, 4, 16);
        let mut nand = DummyNand::new(DummyConfig::new(chip.clone()));

        flash::program_range(&mut nand, &chip, 2, &[0x11; 70]).unwrap();
        assert!(nand.page_main(2).iter().all(|&b| b == 0x11));
        let second = nand.page(3);
        assert!(second[..6].iter().all(|&b| b == 0x11));
        assert!(second[6..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_load_only_program_round_trip() {
        let mut chip = profile(64, 4, 16);
        chip.features.remove(Features::PROGRAM_EXECUTE);
        let mut nand = DummyNand::new(DummyConfig::new(chip.clone()));

        let data: Vec<u8> = (0..3 * 64).map(|i| i as u8).collect();
        assert_eq!(flash::program_range(&mut nand, &chip, 5, &data).unwrap(), 3);
        assert_eq!(nand.count(opcodes::PROGRAM_EXECUTE), 0);
        let loaded: Vec<_> = nand
            .transactions()
            .iter()
            .filter(|t| t.opcode == opcodes::PROGRAM_LOAD)
            .map(|t| t.row)
            .collect();
        assert_eq!(loaded, [Some(5), Some(6), Some(7)]);

        let mut out = vec![0u8; data.len()];
        flash::read_range(&mut nand, &chip, 5, 3, &mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_load_only_program_failure() {
        let mut chip = profile(64, 4, 16);
        chip.features.remove(Features::PROGRAM_EXECUTE);
        let mut nand = DummyNand::new(DummyConfig::new(chip.clone()));
        nand.fail_program_at(1);

        let err = flash::program_range(&mut nand, &chip, 0, &[0u8; 2 * 64]).unwrap_err();
        assert_eq!(
            err,
            RangeError::at(1, 1, Error::DeviceFailure(DeviceFailure::Program))
        );
        assert!(nand.page_main(1).iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_program_failure_stops_range() {
        let chip = profile(64, 4, 16);
        let mut nand = DummyNand::new(DummyConfig::new(chip.clone()));
        nand.fail_program_at(6);

        let err = flash::program_range(&mut nand, &chip, 4, &[0u8; 4 * 64]).unwrap_err();
        assert_eq!(
            err,
            RangeError::at(6, 2, Error::DeviceFailure(DeviceFailure::Program))
        );
        let executed: Vec<_> = nand
            .transactions()
            .iter()
            .filter(|t| t.opcode == opcodes::PROGRAM_EXECUTE)
            .map(|t| t.row)
            .collect();
        assert_eq!(executed, [Some(4), Some(5), Some(6)]);
        assert!(nand.page_main(7).iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_erase_failure_reports_block() {
        let chip = profile(64, 4, 16);
        let mut nand = DummyNand::new(DummyConfig::new(chip.clone()));
        nand.fail_erase_at(2);

        let err = flash::erase_range(&mut nand, &chip, 0, 4).unwrap_err();
        assert_eq!(
            err,
            RangeError::at(8, 2, Error::DeviceFailure(DeviceFailure::Erase))
        );
        assert_eq!(nand.count(opcodes::BLOCK_ERASE), 3);
    }

    #[test]
    fn test_out_of_range_sends_nothing() {
        let chip = profile(64, 4, 16);
        let mut nand = DummyNand::new(DummyConfig::new(chip.clone()));

        let mut out = vec![0u8; 4 * 64];
        let err = flash::read_range(&mut nand, &chip, 14, 4, &mut out).unwrap_err();
        assert_eq!(err.error, Error::InvalidRange);
        assert_eq!(err.page, None);
        assert!(nand.transactions().is_empty());
    }

    #[test]
    fn test_ecc_status_per_page() {
        let chip = profile(64, 4, 16);
        let mut nand = DummyNand::new(DummyConfig::new(chip.clone()));
        nand.set_ecc(1, EccStatus::Corrected);
        nand.set_ecc(5, EccStatus::Uncorrectable);

        let mut out = vec![0u8; 4 * 64];
        let report = flash::read_range(&mut nand, &chip, 0, 4, &mut out).unwrap();
        assert_eq!(report.worst_ecc, EccStatus::Corrected);
        assert_eq!(report.corrected_pages, [1]);

        let err = flash::read_range(&mut nand, &chip, 4, 4, &mut out).unwrap_err();
        assert_eq!(
            err,
            RangeError::at(5, 1, Error::DeviceFailure(DeviceFailure::UncorrectableEcc))
        );
    }

    #[test]
    fn test_stale_ecc_does_not_fail_program() {
        let chip = profile(64, 4, 16);
        let mut nand = DummyNand::new(DummyConfig::new(chip.clone()));
        nand.set_ecc(0, EccStatus::Uncorrectable);

        let mut engine = PageEngine::new(&chip, EngineConfig::default()).unwrap();
        assert!(engine.read_page(&mut nand, 0).is_err());
        engine.program_page(&mut nand, 1, &[0x00; 64]).unwrap();
    }

    #[test]
    fn test_transport_failure() {
        let chip = profile(64, 4, 16);
        let mut nand = DummyNand::new(DummyConfig::new(chip.clone()));
        // page 0: select, status, cache read; page 1: select fails
        nand.fail_transaction_at(3);

        let mut out = vec![0u8; 2 * 64];
        let err = flash::read_range(&mut nand, &chip, 0, 2, &mut out).unwrap_err();
        assert_eq!(
            err,
            RangeError::at(1, 1, Error::Channel(ChannelError::TransferFailed))
        );
        assert_eq!(nand.transactions().len(), 4);
    }

    #[test]
    fn test_block_lock() {
        let chip = profile(64, 4, 16);
        let mut nand = DummyNand::new(DummyConfig {
            protection: 0x7C,
            ..DummyConfig::new(chip.clone())
        });

        assert_eq!(
            flash::erase_range(&mut nand, &chip, 0, 1).unwrap_err().error,
            Error::DeviceFailure(DeviceFailure::Erase)
        );

        protocol::unlock_all_blocks(&mut nand, &chip).unwrap();
        assert_eq!(nand.protection(), 0);
        flash::erase_range(&mut nand, &chip, 0, 1).unwrap();
    }

    #[test]
    fn test_reset_and_buffer_mode() {
        let mut nand = DummyNand::new(DummyConfig {
            busy_polls: 2,
            ..DummyConfig::default()
        });
        protocol::prepare(&mut nand, &W25N01GV, PollConfig::RESET).unwrap();
        assert_eq!(nand.config_register() & opcodes::CFG_BUF, opcodes::CFG_BUF);
        assert_eq!(nand.count(opcodes::RESET), 1);

        // Chips without buffer mode leave the config register alone
        let mut nand = DummyNand::new(DummyConfig::new(DS35Q1GA));
        protocol::prepare(&mut nand, &DS35Q1GA, PollConfig::RESET).unwrap();
        assert_eq!(nand.config_register(), 0);
    }

    #[test]
    fn test_small_channel_rejected() {
        let chip = profile(64, 4, 16);
        let mut nand = DummyNand::new(DummyConfig {
            max_transfer: 32,
            ..DummyConfig::new(chip.clone())
        });
        let mut engine = PageEngine::new(&chip, EngineConfig::default()).unwrap();
        assert_eq!(
            engine.read_page(&mut nand, 0),
            Err(Error::Channel(ChannelError::FrameTooLarge))
        );
        assert!(nand.transactions().is_empty());
    }
}
