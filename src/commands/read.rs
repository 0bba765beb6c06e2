//! Read command implementation

use super::progress::BarProgress;
use crate::cli::ChipArgs;
use rnand_core::chip::{ChipDatabase, EccStatus};
use rnand_core::error::RangeError;
use rnand_core::flash;
use rnand_core::programmer::CommandChannel;
use rnand_core::protocol::PageEngine;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Run the read command
pub fn run_read<C: CommandChannel + ?Sized>(
    channel: &mut C,
    db: &ChipDatabase,
    args: &ChipArgs,
    output: &Path,
    start: u32,
    count: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let chip = super::open_chip(channel, db, args)?;

    let count = match count {
        Some(count) => count,
        None => chip
            .pages_total
            .checked_sub(start)
            .ok_or_else(|| format!("Start page 0x{:X} is past the end of the chip", start))?,
    };

    match start.checked_add(count) {
        Some(end) if end <= chip.pages_total => {}
        _ => return Err(RangeError::invalid_range().into()),
    }

    let mut engine = PageEngine::new(&chip, super::engine_config(args))?;
    let page_size = chip.page_size as usize;
    let mut data = vec![0u8; count as usize * page_size];
    let mut progress = BarProgress::new(chip.page_size);
    let result =
        flash::read_range_with(&mut engine, channel, start, count, &mut data, &mut progress);

    // Pages read before a failure are kept so the dump can be resumed
    let report = match result {
        Ok(report) => report,
        Err(err) => {
            if let Some(page) = err.page {
                let done = err.completed as usize * page_size;
                File::create(output)?.write_all(&data[..done])?;
                eprintln!(
                    "Read stopped at page 0x{:05X}; wrote {} complete page(s) to {:?}",
                    page, err.completed, output
                );
            }
            return Err(err.into());
        }
    };

    let mut file = File::create(output)?;
    file.write_all(&data)?;
    println!("Wrote {} bytes to {:?}", data.len(), output);

    if report.worst_ecc == EccStatus::Corrected {
        println!(
            "{} page(s) had correctable bit errors: {}",
            report.corrected_pages.len(),
            report
                .corrected_pages
                .iter()
                .map(|p| format!("0x{:05X}", p))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rnand_core::chip::W25N01GV;
    use rnand_core::error::Error;
    use rnand_dummy::{DummyConfig, DummyNand};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("rnand-{}-{}.bin", name, std::process::id()))
    }

    #[test]
    fn test_oversized_count_is_rejected() {
        let db = ChipDatabase::with_builtin();
        let mut nand = DummyNand::new_default();
        let output = temp_path("oversized");

        let err = run_read(
            &mut nand,
            &db,
            &ChipArgs::default(),
            &output,
            0,
            Some(u32::MAX),
        )
        .unwrap_err();
        let err = err.downcast_ref::<RangeError>().unwrap();
        assert_eq!(err.error, Error::InvalidRange);
        assert!(!output.exists());
    }

    #[test]
    fn test_failed_read_keeps_completed_pages() {
        let db = ChipDatabase::with_builtin();
        let mut nand = DummyNand::new(DummyConfig::new(W25N01GV));
        for page in 0..4u32 {
            let data: Vec<u8> = (0..2048).map(|k| (page as usize + k) as u8).collect();
            nand.fill_page(page, &data);
        }
        nand.set_ecc(2, EccStatus::Uncorrectable);
        let output = temp_path("partial");

        let err = run_read(&mut nand, &db, &ChipArgs::default(), &output, 0, Some(4))
            .unwrap_err();
        let err = err.downcast_ref::<RangeError>().unwrap();
        assert_eq!(err.page, Some(2));
        assert_eq!(err.completed, 2);

        let saved = std::fs::read(&output).unwrap();
        let mut expected = nand.page_main(0);
        expected.extend(nand.page_main(1));
        assert_eq!(saved, expected);
        let _ = std::fs::remove_file(&output);
    }
}
