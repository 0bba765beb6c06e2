//! Probe command implementation

use rnand_core::chip::{ChipDatabase, Features};
use rnand_core::flash;
use rnand_core::programmer::CommandChannel;
use rnand_core::protocol;

/// Read the chip ID and show what it matches
pub fn run_probe<C: CommandChannel + ?Sized>(
    channel: &mut C,
    db: &ChipDatabase,
) -> Result<(), Box<dyn std::error::Error>> {
    let probe = flash::probe(channel, db)?;
    let [b0, b1, b2] = probe.raw_id;

    let chip = match probe.chip {
        Some(chip) => chip,
        None => {
            println!("Unknown chip, read-ID bytes: {:02X} {:02X} {:02X}", b0, b1, b2);
            return Err("Probe failed: no matching chip definition".into());
        }
    };

    println!("Found serial NAND chip:");
    println!("  Vendor:   {}", chip.vendor);
    println!("  Name:     {}", chip.name);
    println!(
        "  ID:       {:02X} {:0width$X}",
        chip.manufacturer_id,
        chip.device_id,
        width = chip.device_id_len as usize * 2
    );
    println!(
        "  Size:     {} MiB ({} blocks of {} KiB)",
        chip.total_size() / (1024 * 1024),
        chip.block_count(),
        chip.block_size() / 1024
    );
    println!(
        "  Page:     {} + {} bytes, {} pages per block",
        chip.page_size, chip.spare_size, chip.pages_per_block
    );

    if chip.features.contains(Features::BLOCK_LOCK) {
        let protection = protocol::get_feature(channel, chip, chip.registers.protection)?;
        if protection != 0 {
            println!("  Protection: 0x{:02X} (blocks locked)", protection);
        } else {
            println!("  Protection: none");
        }
    }

    Ok(())
}
