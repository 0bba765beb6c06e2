//! Write command implementation

use super::progress::BarProgress;
use crate::cli::ChipArgs;
use rnand_core::chip::ChipDatabase;
use rnand_core::flash::{self, NoProgress};
use rnand_core::programmer::CommandChannel;
use rnand_core::protocol::{self, PageEngine};
use std::fs;
use std::path::Path;

/// Run the write command
///
/// Unless `no_erase` is set, every block the data touches is erased first,
/// so `start` must then be the first page of a block.
pub fn run_write<C: CommandChannel + ?Sized>(
    channel: &mut C,
    db: &ChipDatabase,
    args: &ChipArgs,
    input: &Path,
    start: u32,
    no_erase: bool,
    verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    if data.is_empty() {
        return Err(format!("{:?} is empty", input).into());
    }

    let chip = super::open_chip(channel, db, args)?;
    let page_size = chip.page_size as usize;
    let pages = data.len().div_ceil(page_size) as u32;

    protocol::unlock_all_blocks(channel, &chip)?;
    let mut engine = PageEngine::new(&chip, super::engine_config(args))?;

    if !no_erase {
        if start % chip.pages_per_block != 0 {
            return Err(format!(
                "Start page 0x{:X} is not block aligned ({} pages per block); use --no-erase",
                start, chip.pages_per_block
            )
            .into());
        }
        let first_block = start / chip.pages_per_block;
        let blocks = pages.div_ceil(chip.pages_per_block);
        let mut progress = BarProgress::new(chip.block_size());
        flash::erase_range_with(&mut engine, channel, first_block, blocks, &mut progress)?;
    }

    let mut progress = BarProgress::new(chip.page_size);
    let written = flash::program_range_with(&mut engine, channel, start, &data, &mut progress)?;
    println!(
        "Programmed {} page(s) starting at page 0x{:05X} ({} bytes)",
        written,
        start,
        data.len()
    );

    if verify {
        let mut readback = vec![0u8; written as usize * page_size];
        flash::read_range_with(
            &mut engine,
            channel,
            start,
            written,
            &mut readback,
            &mut NoProgress,
        )?;
        if let Some(pos) = readback.iter().zip(&data).position(|(a, b)| a != b) {
            return Err(format!(
                "Verification failed at page 0x{:05X}, offset {}",
                start as usize + pos / page_size,
                pos % page_size
            )
            .into());
        }
        println!("Verified {} bytes", data.len());
    }

    Ok(())
}
