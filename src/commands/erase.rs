//! Erase command implementation

use super::progress::BarProgress;
use crate::cli::ChipArgs;
use rnand_core::chip::ChipDatabase;
use rnand_core::flash;
use rnand_core::programmer::CommandChannel;
use rnand_core::protocol::{self, PageEngine};

/// Run the erase command
pub fn run_erase<C: CommandChannel + ?Sized>(
    channel: &mut C,
    db: &ChipDatabase,
    args: &ChipArgs,
    start: u32,
    count: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let chip = super::open_chip(channel, db, args)?;

    let count = match count {
        Some(count) => count,
        None => chip
            .block_count()
            .checked_sub(start)
            .ok_or_else(|| format!("Start block {} is past the end of the chip", start))?,
    };

    protocol::unlock_all_blocks(channel, &chip)?;

    let mut engine = PageEngine::new(&chip, super::engine_config(args))?;
    let mut progress = BarProgress::new(chip.block_size());
    let erased = flash::erase_range_with(&mut engine, channel, start, count, &mut progress)?;

    println!(
        "Erased {} block(s) starting at block {} ({} KiB)",
        erased,
        start,
        erased as u64 * chip.block_size() as u64 / 1024
    );
    Ok(())
}
