//! CLI argument parsing

use crate::programmers;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Programmer to use [available: {}]",
        programmers::programmer_names_short()
    )
}

#[derive(Parser)]
#[command(name = "rnand")]
#[command(author, version, about = "Serial NAND flash programmer", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Chip database file or directory (.ron files), loaded on top of the
    /// built-in chips. Defaults to ./chips/ and /usr/share/rnand/chips/
    #[arg(long, global = true)]
    pub chip_db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// How to treat pages the chip had to correct
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EccArg {
    /// Accept corrected pages silently
    Ignore,
    /// Accept corrected pages and log a warning
    #[default]
    Report,
    /// Stop at the first corrected page
    Fail,
}

/// Chip selection and engine tuning shared across commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ChipArgs {
    /// Chip name (auto-detected from the read-ID bytes if not specified)
    #[arg(short, long)]
    pub chip: Option<String>,

    /// Maximum status reads per operation before giving up
    #[arg(long)]
    pub poll_attempts: Option<u32>,

    /// Delay between status reads in microseconds
    #[arg(long)]
    pub poll_delay_us: Option<u32>,

    /// Corrected-ECC handling
    #[arg(long, value_enum, default_value_t = EccArg::Report)]
    pub ecc: EccArg,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Identify the attached chip
    Probe {
        /// Programmer to use
        #[arg(short, long, help = programmer_help())]
        programmer: String,
    },

    /// Read pages to a file (main area only)
    Read {
        /// Programmer to use
        #[arg(short, long, help = programmer_help())]
        programmer: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// First page to read (hex or decimal)
        #[arg(long, default_value = "0", value_parser = parse_hex_u32)]
        start: u32,

        /// Number of pages to read (default: to the end of the chip)
        #[arg(long, value_parser = parse_hex_u32)]
        count: Option<u32>,

        #[command(flatten)]
        chip: ChipArgs,
    },

    /// Write a file to consecutive pages
    Write {
        /// Programmer to use
        #[arg(short, long, help = programmer_help())]
        programmer: String,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// First page to program (hex or decimal)
        #[arg(long, default_value = "0", value_parser = parse_hex_u32)]
        start: u32,

        /// Don't erase the covered blocks before programming
        #[arg(long)]
        no_erase: bool,

        /// Read back and compare after programming
        #[arg(long)]
        verify: bool,

        #[command(flatten)]
        chip: ChipArgs,
    },

    /// Erase blocks
    Erase {
        /// Programmer to use
        #[arg(short, long, help = programmer_help())]
        programmer: String,

        /// First block to erase (hex or decimal)
        #[arg(long, default_value = "0", value_parser = parse_hex_u32)]
        start: u32,

        /// Number of blocks to erase (default: to the end of the chip)
        #[arg(long, value_parser = parse_hex_u32)]
        count: Option<u32>,

        #[command(flatten)]
        chip: ChipArgs,
    },

    /// List supported programmers
    ListProgrammers,

    /// List supported chips
    ListChips {
        /// Filter by vendor
        #[arg(long)]
        vendor: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0x40"), Ok(64));
        assert_eq!(parse_hex_u32("64"), Ok(64));
        assert!(parse_hex_u32("0xZZ").is_err());
    }

    #[test]
    fn test_read_args() {
        let cli = Cli::try_parse_from([
            "rnand",
            "read",
            "-p",
            "dummy",
            "-o",
            "out.bin",
            "--start",
            "0x100",
            "--count",
            "4",
            "--ecc",
            "fail",
            "--poll-attempts",
            "50",
        ])
        .unwrap();
        match cli.command {
            Commands::Read {
                start, count, chip, ..
            } => {
                assert_eq!(start, 0x100);
                assert_eq!(count, Some(4));
                assert_eq!(chip.ecc, EccArg::Fail);
                assert_eq!(chip.poll_attempts, Some(50));
                assert_eq!(chip.chip, None);
            }
            _ => panic!("expected read"),
        }
    }
}
