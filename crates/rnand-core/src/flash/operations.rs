//! Multi-page flash operations
//!
//! Ranges are processed one page (or block) at a time in ascending order
//! through a [`PageEngine`]. The first failure stops the operation; work
//! already done stays done and the returned [`RangeError`] says where to
//! pick up again.

use alloc::vec::Vec;
use core::ops::ControlFlow;

#[cfg(feature = "std")]
use crate::chip::ChipDatabase;
use crate::chip::{ChipProfile, EccStatus};
use crate::error::{Error, RangeError};
use crate::programmer::CommandChannel;
use crate::protocol::{Direction, EngineConfig, PageEngine};

/// Result type for range operations
pub type RangeResult<T> = core::result::Result<T, RangeError>;

/// Summary of a finished range read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeReport {
    /// Pages read
    pub pages: u32,
    /// Most severe ECC result seen across the range
    pub worst_ecc: EccStatus,
    /// Pages whose bit errors were corrected by the chip
    pub corrected_pages: Vec<u32>,
}

impl RangeReport {
    fn record(&mut self, page: u32, ecc: EccStatus) {
        self.pages += 1;
        self.worst_ecc = self.worst_ecc.max(ecc);
        if ecc == EccStatus::Corrected {
            self.corrected_pages.push(page);
        }
    }
}

/// Callback for progress reporting during range operations
///
/// Units are pages for read and program, blocks for erase.
pub trait RangeProgress {
    /// Called before the first unit
    fn start(&mut self, direction: Direction, total_units: u32);

    /// Called after each unit completes
    ///
    /// Returning `Break` stops the operation before the next unit with
    /// [`Error::Interrupted`]. A `Break` after the last unit is ignored.
    fn advance(&mut self, completed: u32) -> ControlFlow<()>;

    /// Called once the whole range has completed
    fn finish(&mut self, completed: u32);
}

/// A no-op progress reporter
pub struct NoProgress;

impl RangeProgress for NoProgress {
    fn start(&mut self, _direction: Direction, _total_units: u32) {}
    fn advance(&mut self, _completed: u32) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
    fn finish(&mut self, _completed: u32) {}
}

/// Check that `[start, start + count)` lies within `total`
fn check_bounds(start: u32, count: u32, total: u32) -> RangeResult<()> {
    match start.checked_add(count) {
        Some(end) if end <= total => Ok(()),
        _ => Err(RangeError::invalid_range()),
    }
}

/// Ask the progress hook whether to continue with unit `next`
fn keep_going<P: RangeProgress + ?Sized>(
    progress: &mut P,
    completed: u32,
    remaining: u32,
    next: u32,
) -> RangeResult<()> {
    if progress.advance(completed).is_break() && remaining > 0 {
        log::info!("Interrupted before page 0x{:05X}", next);
        return Err(RangeError::at(next, completed, Error::Interrupted));
    }
    Ok(())
}

/// Read `page_count` pages starting at `start_page` into `out`
///
/// Page `i` of the range lands at `out[i * page_size..]`. Uses the default
/// engine configuration; see [`read_range_with`] for control over polling,
/// ECC handling and progress.
pub fn read_range<C: CommandChannel + ?Sized>(
    channel: &mut C,
    profile: &ChipProfile,
    start_page: u32,
    page_count: u32,
    out: &mut [u8],
) -> RangeResult<RangeReport> {
    let mut engine = PageEngine::new(profile, EngineConfig::default())?;
    read_range_with(
        &mut engine,
        channel,
        start_page,
        page_count,
        out,
        &mut NoProgress,
    )
}

/// Read a page range with an explicit engine and progress reporter
///
/// Bounds and buffer size are checked before any command is sent. On
/// failure the pages before the failing one are already in `out`.
pub fn read_range_with<C, P>(
    engine: &mut PageEngine<'_>,
    channel: &mut C,
    start_page: u32,
    page_count: u32,
    out: &mut [u8],
    progress: &mut P,
) -> RangeResult<RangeReport>
where
    C: CommandChannel + ?Sized,
    P: RangeProgress + ?Sized,
{
    let profile = engine.profile();
    let page_size = profile.page_size as usize;
    check_bounds(start_page, page_count, profile.pages_total)?;
    let needed = (page_count as usize)
        .checked_mul(page_size)
        .ok_or(RangeError::invalid_range())?;
    if out.len() < needed {
        return Err(RangeError::invalid_range());
    }

    log::info!(
        "Reading {} pages from 0x{:05X} ({} bytes)",
        page_count,
        start_page,
        needed
    );
    progress.start(Direction::Read, page_count);

    let mut report = RangeReport::default();
    for (i, chunk) in out[..needed].chunks_exact_mut(page_size).enumerate() {
        let i = i as u32;
        let page = start_page + i;
        log::debug!("read page 0x{:05X}", page);
        let ecc = engine
            .read_page_into(channel, page, chunk)
            .map_err(|e| RangeError::at(page, i, e))?;
        report.record(page, ecc);
        keep_going(progress, i + 1, page_count - i - 1, page + 1)?;
    }

    progress.finish(report.pages);
    if report.corrected_pages.is_empty() {
        log::info!("Read {} pages", report.pages);
    } else {
        log::info!(
            "Read {} pages, {} with corrected bit errors",
            report.pages,
            report.corrected_pages.len()
        );
    }
    Ok(report)
}

/// Program `data` starting at `start_page`
///
/// Writes `ceil(data.len() / page_size)` pages; a short final page is
/// padded with the profile's pad byte. Returns the number of pages written.
/// The target pages must be erased.
pub fn program_range<C: CommandChannel + ?Sized>(
    channel: &mut C,
    profile: &ChipProfile,
    start_page: u32,
    data: &[u8],
) -> RangeResult<u32> {
    let mut engine = PageEngine::new(profile, EngineConfig::default())?;
    program_range_with(&mut engine, channel, start_page, data, &mut NoProgress)
}

/// Program a page range with an explicit engine and progress reporter
pub fn program_range_with<C, P>(
    engine: &mut PageEngine<'_>,
    channel: &mut C,
    start_page: u32,
    data: &[u8],
    progress: &mut P,
) -> RangeResult<u32>
where
    C: CommandChannel + ?Sized,
    P: RangeProgress + ?Sized,
{
    let profile = engine.profile();
    let page_size = profile.page_size as usize;
    if data.is_empty() {
        return Err(RangeError::invalid_range());
    }
    let page_count =
        u32::try_from(data.len().div_ceil(page_size)).map_err(|_| RangeError::invalid_range())?;
    check_bounds(start_page, page_count, profile.pages_total)?;

    log::info!(
        "Programming {} pages from 0x{:05X} ({} bytes)",
        page_count,
        start_page,
        data.len()
    );
    progress.start(Direction::Program, page_count);

    for (i, chunk) in data.chunks(page_size).enumerate() {
        let i = i as u32;
        let page = start_page + i;
        log::debug!("program page 0x{:05X}", page);
        engine
            .program_page(channel, page, chunk)
            .map_err(|e| RangeError::at(page, i, e))?;
        keep_going(progress, i + 1, page_count - i - 1, page + 1)?;
    }

    progress.finish(page_count);
    log::info!("Programmed {} pages", page_count);
    Ok(page_count)
}

/// Erase `block_count` blocks starting at `start_block`
///
/// Returns the number of blocks erased. A failure reports the first page
/// of the failing block.
pub fn erase_range<C: CommandChannel + ?Sized>(
    channel: &mut C,
    profile: &ChipProfile,
    start_block: u32,
    block_count: u32,
) -> RangeResult<u32> {
    let mut engine = PageEngine::new(profile, EngineConfig::default())?;
    erase_range_with(
        &mut engine,
        channel,
        start_block,
        block_count,
        &mut NoProgress,
    )
}

/// Erase a block range with an explicit engine and progress reporter
pub fn erase_range_with<C, P>(
    engine: &mut PageEngine<'_>,
    channel: &mut C,
    start_block: u32,
    block_count: u32,
    progress: &mut P,
) -> RangeResult<u32>
where
    C: CommandChannel + ?Sized,
    P: RangeProgress + ?Sized,
{
    let profile = engine.profile();
    check_bounds(start_block, block_count, profile.block_count())?;

    log::info!(
        "Erasing {} blocks from block {}",
        block_count,
        start_block
    );
    progress.start(Direction::Erase, block_count);

    for i in 0..block_count {
        let block = start_block + i;
        log::debug!("erase block {}", block);
        engine
            .erase_block(channel, block)
            .map_err(|e| RangeError::at(profile.block_first_page(block), i, e))?;
        keep_going(
            progress,
            i + 1,
            block_count - i - 1,
            profile.block_first_page(block + 1),
        )?;
    }

    progress.finish(block_count);
    log::info!("Erased {} blocks", block_count);
    Ok(block_count)
}

/// Raw identification result from [`probe`]
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct Probe<'db> {
    /// The three bytes returned by read-ID
    pub raw_id: [u8; 3],
    /// Matching profile, if any
    pub chip: Option<&'db ChipProfile>,
}

/// Identify the attached chip against a chip database
///
/// Sends the standard read-ID command; every known serial NAND family
/// shares its opcode and framing.
#[cfg(feature = "std")]
pub fn probe<'db, C: CommandChannel + ?Sized>(
    channel: &mut C,
    db: &'db ChipDatabase,
) -> crate::error::Result<Probe<'db>> {
    let raw_id = crate::protocol::read_id_raw(channel, crate::spi::opcodes::READ_ID)?;
    let chip = db.find_by_raw_id(raw_id);
    match chip {
        Some(chip) => log::info!(
            "Found {} {} (ID {:02X} {:02X} {:02X})",
            chip.vendor,
            chip.name,
            raw_id[0],
            raw_id[1],
            raw_id[2]
        ),
        None => log::warn!(
            "Unknown chip (ID {:02X} {:02X} {:02X})",
            raw_id[0],
            raw_id[1],
            raw_id[2]
        ),
    }
    Ok(Probe { raw_id, chip })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::{FeatureRegisters, Features, Opcodes, StatusLayout};
    use crate::error::{ChannelError, DeviceFailure};
    use crate::spi::{opcodes, AddressFormat};
    use alloc::borrow::Cow;
    use alloc::vec;

    /// A minimal serial NAND model: pages of `page + spare` bytes, a cache
    /// register and a status byte
    struct MockNand {
        page_size: usize,
        unit: usize,
        pages: Vec<Vec<u8>>,
        cache: Vec<u8>,
        status: u8,
        /// Pages whose program reports P_FAIL
        program_fail: Option<u32>,
        /// Pages whose read reports the given ECC bits
        ecc: Vec<(u32, u8)>,
        transactions: usize,
        page_selects: Vec<u32>,
    }

    impl MockNand {
        fn new(profile: &ChipProfile) -> Self {
            let unit = profile.cache_unit();
            let pages = (0..profile.pages_total)
                .map(|p| {
                    let mut data = vec![0xFFu8; unit];
                    for (i, b) in data[..profile.page_size as usize].iter_mut().enumerate() {
                        *b = (p as usize * 7 + i) as u8;
                    }
                    data
                })
                .collect();
            Self {
                page_size: profile.page_size as usize,
                unit,
                pages,
                cache: vec![0xFF; unit],
                status: 0,
                program_fail: None,
                ecc: Vec::new(),
                transactions: 0,
                page_selects: Vec::new(),
            }
        }

        fn row(cmd: &[u8]) -> u32 {
            u32::from(cmd[2]) << 8 | u32::from(cmd[3])
        }
    }

    impl CommandChannel for MockNand {
        fn transceive(
            &mut self,
            cmd: &[u8],
            response: &mut [u8],
        ) -> core::result::Result<(), ChannelError> {
            self.transactions += 1;
            match cmd[0] {
                opcodes::PAGE_READ => {
                    let page = Self::row(cmd);
                    self.page_selects.push(page);
                    self.cache.copy_from_slice(&self.pages[page as usize]);
                    self.status = self
                        .ecc
                        .iter()
                        .find(|(p, _)| *p == page)
                        .map_or(0, |(_, bits)| *bits);
                }
                opcodes::FAST_READ_CACHE => {
                    response.copy_from_slice(&self.cache[..response.len()]);
                }
                opcodes::GET_FEATURE => response[0] = self.status,
                opcodes::WRITE_ENABLE => self.status = opcodes::SR_WEL,
                opcodes::PROGRAM_LOAD => {
                    let payload = &cmd[3..];
                    assert_eq!(payload.len(), self.unit);
                    self.cache.copy_from_slice(payload);
                }
                opcodes::PROGRAM_EXECUTE => {
                    let page = Self::row(cmd);
                    if self.program_fail == Some(page) {
                        self.status = opcodes::SR_P_FAIL;
                    } else {
                        let cache = self.cache.clone();
                        for (dst, src) in self.pages[page as usize].iter_mut().zip(cache) {
                            *dst &= src;
                        }
                        self.status = 0;
                    }
                }
                opcodes::BLOCK_ERASE => {
                    let first = Self::row(cmd) as usize;
                    for page in &mut self.pages[first..first + 2] {
                        page.fill(0xFF);
                    }
                    self.status = 0;
                }
                _ => {}
            }
            Ok(())
        }

        fn delay_us(&mut self, _us: u32) {}
    }

    fn tiny_chip() -> ChipProfile {
        ChipProfile {
            vendor: Cow::Borrowed("Test"),
            name: Cow::Borrowed("TINY"),
            manufacturer_id: 0x01,
            device_id: 0x02,
            device_id_len: 1,
            page_size: 32,
            spare_size: 8,
            pages_per_block: 2,
            pages_total: 8,
            opcodes: Opcodes::STANDARD,
            registers: FeatureRegisters::STANDARD,
            status: StatusLayout::STANDARD,
            address: AddressFormat::STANDARD,
            pad_byte: 0xFF,
            features: Features::default(),
        }
    }

    /// Stops after a fixed number of units
    struct StopAfter(u32);

    impl RangeProgress for StopAfter {
        fn start(&mut self, _direction: Direction, _total_units: u32) {}
        fn advance(&mut self, completed: u32) -> ControlFlow<()> {
            if completed >= self.0 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }
        fn finish(&mut self, _completed: u32) {}
    }

    #[test]
    fn test_read_range_layout() {
        let chip = tiny_chip();
        let mut nand = MockNand::new(&chip);
        let mut out = vec![0u8; 3 * 32];

        let report = read_range(&mut nand, &chip, 2, 3, &mut out).unwrap();
        assert_eq!(report.pages, 3);
        assert_eq!(report.worst_ecc, EccStatus::NoError);
        for i in 0..3 {
            assert_eq!(&out[i * 32..(i + 1) * 32], &nand.pages[2 + i][..32]);
        }
        assert_eq!(nand.page_selects, [2, 3, 4]);
    }

    #[test]
    fn test_read_range_out_of_bounds() {
        let chip = tiny_chip();
        let mut nand = MockNand::new(&chip);
        let mut out = vec![0u8; 4 * 32];

        let err = read_range(&mut nand, &chip, 6, 3, &mut out).unwrap_err();
        assert_eq!(err, RangeError::invalid_range());
        let err = read_range(&mut nand, &chip, u32::MAX, 2, &mut out).unwrap_err();
        assert_eq!(err.error, Error::InvalidRange);
        assert_eq!(nand.transactions, 0);
    }

    #[test]
    fn test_read_range_buffer_too_small() {
        let chip = tiny_chip();
        let mut nand = MockNand::new(&chip);
        let mut out = vec![0u8; 2 * 32 - 1];

        let err = read_range(&mut nand, &chip, 0, 2, &mut out).unwrap_err();
        assert_eq!(err.error, Error::InvalidRange);
        assert_eq!(nand.transactions, 0);
    }

    #[test]
    fn test_read_range_zero_pages() {
        let chip = tiny_chip();
        let mut nand = MockNand::new(&chip);
        let report = read_range(&mut nand, &chip, 8, 0, &mut []).unwrap();
        assert_eq!(report.pages, 0);
        assert_eq!(nand.transactions, 0);
    }

    #[test]
    fn test_read_range_ecc_report() {
        let chip = tiny_chip();
        let mut nand = MockNand::new(&chip);
        nand.ecc.push((1, opcodes::SR_ECC_CORRECTED));
        nand.ecc.push((3, opcodes::SR_ECC_CORRECTED));
        let mut out = vec![0u8; 4 * 32];

        let report = read_range(&mut nand, &chip, 0, 4, &mut out).unwrap();
        assert_eq!(report.worst_ecc, EccStatus::Corrected);
        assert_eq!(report.corrected_pages, [1, 3]);
    }

    #[test]
    fn test_read_range_stops_at_uncorrectable() {
        let chip = tiny_chip();
        let mut nand = MockNand::new(&chip);
        nand.ecc.push((2, opcodes::SR_ECC_UNCORRECTABLE));
        let mut out = vec![0u8; 4 * 32];

        let err = read_range(&mut nand, &chip, 0, 4, &mut out).unwrap_err();
        assert_eq!(
            err,
            RangeError::at(2, 2, Error::DeviceFailure(DeviceFailure::UncorrectableEcc))
        );
        // Pages before the failure are delivered, nothing after it
        assert_eq!(&out[32..64], &nand.pages[1][..32]);
        assert!(out[64..].iter().all(|&b| b == 0));
        assert_eq!(nand.page_selects, [0, 1, 2]);
    }

    #[test]
    fn test_program_range_pads_last_page() {
        let chip = tiny_chip();
        let mut nand = MockNand::new(&chip);
        erase_range(&mut nand, &chip, 0, 1).unwrap();

        let data: Vec<u8> = (0..40u8).collect();
        assert_eq!(program_range(&mut nand, &chip, 0, &data), Ok(2));
        assert_eq!(&nand.pages[0][..32], &data[..32]);
        assert_eq!(&nand.pages[1][..8], &data[32..]);
        assert!(nand.pages[1][8..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_program_then_read_back() {
        let chip = tiny_chip();
        let mut nand = MockNand::new(&chip);
        erase_range(&mut nand, &chip, 1, 2).unwrap();

        let data: Vec<u8> = (0..4 * 32).map(|i| (i * 3) as u8).collect();
        program_range(&mut nand, &chip, 2, &data).unwrap();

        let mut out = vec![0u8; data.len()];
        read_range(&mut nand, &chip, 2, 4, &mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_program_range_stops_at_failure() {
        let chip = tiny_chip();
        let mut nand = MockNand::new(&chip);
        nand.program_fail = Some(5);

        let data = vec![0u8; 4 * 32];
        let err = program_range(&mut nand, &chip, 4, &data).unwrap_err();
        assert_eq!(
            err,
            RangeError::at(5, 1, Error::DeviceFailure(DeviceFailure::Program))
        );
        // Page 6 and 7 never touched
        assert!(nand.pages[6][..32].iter().zip(0..).all(|(&b, i)| b == (6 * 7 + i) as u8));
    }

    #[test]
    fn test_program_range_invalid() {
        let chip = tiny_chip();
        let mut nand = MockNand::new(&chip);
        assert_eq!(
            program_range(&mut nand, &chip, 0, &[]).unwrap_err(),
            RangeError::invalid_range()
        );
        assert_eq!(
            program_range(&mut nand, &chip, 7, &[0u8; 33]).unwrap_err(),
            RangeError::invalid_range()
        );
        assert_eq!(nand.transactions, 0);
    }

    #[test]
    fn test_erase_range() {
        let chip = tiny_chip();
        let mut nand = MockNand::new(&chip);
        assert_eq!(erase_range(&mut nand, &chip, 1, 3), Ok(3));
        assert!(nand.pages[0][..32].iter().any(|&b| b != 0xFF));
        assert!(nand.pages[2..8].iter().all(|p| p.iter().all(|&b| b == 0xFF)));

        assert_eq!(
            erase_range(&mut nand, &chip, 3, 2).unwrap_err(),
            RangeError::invalid_range()
        );
    }

    #[test]
    fn test_interrupt_between_pages() {
        let chip = tiny_chip();
        let mut nand = MockNand::new(&chip);
        let mut engine = PageEngine::new(&chip, EngineConfig::default()).unwrap();
        let mut out = vec![0u8; 4 * 32];

        let err = read_range_with(&mut engine, &mut nand, 0, 4, &mut out, &mut StopAfter(2))
            .unwrap_err();
        assert_eq!(err, RangeError::at(2, 2, Error::Interrupted));
        assert_eq!(nand.page_selects, [0, 1]);

        // A stop request after the last page does not turn success into failure
        let report = read_range_with(&mut engine, &mut nand, 0, 2, &mut out, &mut StopAfter(2))
            .unwrap();
        assert_eq!(report.pages, 2);
    }

    #[test]
    fn test_interrupt_erase_reports_next_block() {
        let chip = tiny_chip();
        let mut nand = MockNand::new(&chip);
        let mut engine = PageEngine::new(&chip, EngineConfig::default()).unwrap();

        let err = erase_range_with(&mut engine, &mut nand, 0, 3, &mut StopAfter(1)).unwrap_err();
        assert_eq!(err, RangeError::at(2, 1, Error::Interrupted));
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_probe() {
        struct IdOnly([u8; 3]);
        impl CommandChannel for IdOnly {
            fn transceive(
                &mut self,
                cmd: &[u8],
                response: &mut [u8],
            ) -> core::result::Result<(), ChannelError> {
                assert_eq!(cmd, [opcodes::READ_ID, 0x00]);
                response.copy_from_slice(&self.0);
                Ok(())
            }
            fn delay_us(&mut self, _us: u32) {}
        }

        let db = ChipDatabase::with_builtin();
        let found = probe(&mut IdOnly([0xEF, 0xAA, 0x21]), &db).unwrap();
        assert_eq!(found.chip.map(|c| c.name.as_ref()), Some("W25N01GV"));

        let found = probe(&mut IdOnly([0x12, 0x34, 0x56]), &db).unwrap();
        assert!(found.chip.is_none());
        assert_eq!(found.raw_id, [0x12, 0x34, 0x56]);
    }
}
