//! List commands implementation

use crate::programmers;
use rnand_core::chip::ChipDatabase;

/// List all supported programmers
pub fn list_programmers() {
    print!("{}", programmers::programmer_help());
}

/// List all chips in the database
pub fn list_chips(db: &ChipDatabase, vendor_filter: Option<&str>) {
    println!("Supported serial NAND chips:");
    println!();
    println!(
        "{:<12} {:<16} {:>8} {:>10} {:>8}",
        "Vendor", "Name", "Size", "Page", "ID"
    );
    println!("{}", "-".repeat(58));

    let chips: Vec<_> = match vendor_filter {
        Some(vendor) => db.find_by_vendor(vendor),
        None => db.iter().collect(),
    };

    for chip in chips {
        let page = format!("{}+{}", chip.page_size, chip.spare_size);
        let id = format!(
            "{:02X} {:0width$X}",
            chip.manufacturer_id,
            chip.device_id,
            width = chip.device_id_len as usize * 2
        );
        println!(
            "{:<12} {:<16} {:>8} {:>10} {:>8}",
            chip.vendor,
            chip.name,
            format_size(chip.total_size()),
            page,
            id
        );
    }
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 * 1024 {
        format!("{} GiB", bytes / (1024 * 1024 * 1024))
    } else if bytes >= 1024 * 1024 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else {
        format!("{} KiB", bytes / 1024)
    }
}
