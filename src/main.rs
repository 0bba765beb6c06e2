//! rnand - A serial NAND flash programmer
//!
//! Reads, programs and erases SPI NAND chips that move data through an
//! on-die page cache. Chips are described by profiles (built in, or loaded
//! from RON files) and driven through any programmer that can run a single
//! framed SPI command.

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands};
use rnand_core::chip::ChipDatabase;
use std::path::{Path, PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let db = match load_chip_database(cli.chip_db.as_deref()) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to load chip database: {}", e);
            std::process::exit(1);
        }
    };

    log::debug!("Loaded {} chip definitions", db.len());

    let result = match cli.command {
        Commands::Probe { programmer } => {
            let mut channel = programmers::open_programmer(&programmer, &db)?;
            commands::run_probe(&mut channel, &db)
        }
        Commands::Read {
            programmer,
            output,
            start,
            count,
            chip,
        } => {
            let mut channel = programmers::open_programmer(&programmer, &db)?;
            commands::run_read(&mut channel, &db, &chip, &output, start, count)
        }
        Commands::Write {
            programmer,
            input,
            start,
            no_erase,
            verify,
            chip,
        } => {
            let mut channel = programmers::open_programmer(&programmer, &db)?;
            commands::run_write(&mut channel, &db, &chip, &input, start, no_erase, verify)
        }
        Commands::Erase {
            programmer,
            start,
            count,
            chip,
        } => {
            let mut channel = programmers::open_programmer(&programmer, &db)?;
            commands::run_erase(&mut channel, &db, &chip, start, count)
        }
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
        Commands::ListChips { vendor } => {
            commands::list_chips(&db, vendor.as_deref());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Built-in chips plus any RON definitions found on disk
fn load_chip_database(path: Option<&Path>) -> Result<ChipDatabase, Box<dyn std::error::Error>> {
    let mut db = ChipDatabase::with_builtin();

    if let Some(path) = path {
        // User specified a path
        if path.is_dir() {
            db.load_dir(path)?;
        } else if path.is_file() {
            db.load_file(path)?;
        } else {
            return Err(format!("Chip database path not found: {}", path.display()).into());
        }
        return Ok(db);
    }

    let default_paths = [
        PathBuf::from("chips"),
        PathBuf::from("/usr/share/rnand/chips"),
        PathBuf::from("/usr/local/share/rnand/chips"),
    ];
    for dir in default_paths.iter().filter(|d| d.is_dir()) {
        match db.load_dir(dir) {
            Ok(count) => log::debug!("Loaded {} chips from {}", count, dir.display()),
            Err(e) => log::warn!("Failed to load chips from {}: {}", dir.display(), e),
        }
    }

    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_chip_files_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("chips");
        let db = load_chip_database(Some(&dir)).unwrap();
        assert!(db.find_by_name("GD5F1GQ5UE").is_some());
        assert!(db.find_by_name("W25N02KV").is_some());
        // Built-ins stay available
        assert!(db.find_by_name("W25N01GV").is_some());
    }

    #[test]
    fn test_missing_chip_db_path() {
        assert!(load_chip_database(Some(Path::new("/nonexistent/rnand/chips"))).is_err());
    }
}
