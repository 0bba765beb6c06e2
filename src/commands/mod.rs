//! CLI command implementations
//!
//! Every chip command starts the same way: identify the chip (or check the
//! one named with `--chip`), reset it, then build a page engine with the
//! poll and ECC settings from the command line.

mod erase;
mod list;
mod probe;
mod progress;
mod read;
mod write;

pub use erase::run_erase;
pub use list::{list_chips, list_programmers};
pub use probe::run_probe;
pub use read::run_read;
pub use write::run_write;

use crate::cli::{ChipArgs, EccArg};
use rnand_core::chip::{ChipDatabase, ChipProfile};
use rnand_core::flash;
use rnand_core::programmer::CommandChannel;
use rnand_core::protocol::{self, EccPolicy, EngineConfig, PollConfig};

/// Identify the chip and bring it into a known state
///
/// With `--chip` the named profile is used and the read-ID bytes must match
/// it; otherwise the chip is looked up by its read-ID bytes.
pub fn open_chip<C: CommandChannel + ?Sized>(
    channel: &mut C,
    db: &ChipDatabase,
    args: &ChipArgs,
) -> Result<ChipProfile, Box<dyn std::error::Error>> {
    let chip = match &args.chip {
        Some(name) => {
            let chip = db
                .find_by_name(name)
                .ok_or_else(|| format!("Unknown chip: {} (see 'rnand list-chips')", name))?;
            protocol::verify_identity(channel, chip)?;
            chip.clone()
        }
        None => {
            let probe = flash::probe(channel, db)?;
            match probe.chip {
                Some(chip) => chip.clone(),
                None => {
                    return Err(format!(
                        "No known chip answered (ID {:02X} {:02X} {:02X}); use --chip or --chip-db",
                        probe.raw_id[0], probe.raw_id[1], probe.raw_id[2]
                    )
                    .into())
                }
            }
        }
    };

    println!(
        "Found: {} {} ({} MiB, {} pages of {}+{} bytes)",
        chip.vendor,
        chip.name,
        chip.total_size() / (1024 * 1024),
        chip.pages_total,
        chip.page_size,
        chip.spare_size
    );

    protocol::prepare(channel, &chip, poll_override(PollConfig::RESET, args))?;
    Ok(chip)
}

/// Engine settings from the command line
pub fn engine_config(args: &ChipArgs) -> EngineConfig {
    let defaults = EngineConfig::default();
    EngineConfig {
        read_poll: poll_override(defaults.read_poll, args),
        program_poll: poll_override(defaults.program_poll, args),
        erase_poll: poll_override(defaults.erase_poll, args),
        ecc_policy: match args.ecc {
            EccArg::Ignore => EccPolicy::Ignore,
            EccArg::Report => EccPolicy::Report,
            EccArg::Fail => EccPolicy::Fail,
        },
    }
}

fn poll_override(base: PollConfig, args: &ChipArgs) -> PollConfig {
    PollConfig::new(
        args.poll_attempts.unwrap_or(base.max_attempts),
        args.poll_delay_us.unwrap_or(base.delay_us),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rnand_dummy::{DummyConfig, DummyNand};

    #[test]
    fn test_engine_config_overrides() {
        let args = ChipArgs {
            poll_attempts: Some(7),
            ecc: EccArg::Fail,
            ..ChipArgs::default()
        };
        let config = engine_config(&args);
        assert_eq!(config.read_poll.max_attempts, 7);
        assert_eq!(config.erase_poll.max_attempts, 7);
        assert_eq!(config.erase_poll.delay_us, PollConfig::ERASE.delay_us);
        assert_eq!(config.ecc_policy, EccPolicy::Fail);
    }

    #[test]
    fn test_open_chip_detects_and_checks_name() {
        let db = ChipDatabase::with_builtin();
        let mut nand = DummyNand::new_default();
        let chip = open_chip(&mut nand, &db, &ChipArgs::default()).unwrap();
        assert_eq!(chip.name, "W25N01GV");

        let args = ChipArgs {
            chip: Some("DS35Q1GA".into()),
            ..ChipArgs::default()
        };
        assert!(open_chip(&mut nand, &db, &args).is_err());
    }
}
