//! Programmer registration and dispatch
//!
//! This module provides a centralized registry for all programmers, with support
//! for feature-gated inclusion and dynamic help text generation.

use rnand_core::chip::ChipDatabase;
use rnand_core::programmer::CommandChannel;

/// Boxed command channel as returned by [`open_programmer`]
pub type BoxedChannel = Box<dyn CommandChannel + Send>;

/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &[],
        description: "In-memory SPI NAND emulator (chip=<name>,busy=<polls>,protect=<hex>)",
    });

    #[cfg(feature = "linux-spi")]
    programmers.push(ProgrammerInfo {
        name: "linux_spi",
        aliases: &["linux-spi", "spidev"],
        description: "Linux spidev interface (dev=/dev/spidevX.Y,spispeed=<kHz>,mode=<0|3>)",
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with programmer features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");
    for p in &programmers {
        help.push_str(&format!("  {:12} - {}\n", p.name, p.description));
        if !p.aliases.is_empty() {
            help.push_str(&format!("  {:12}   aliases: {}\n", "", p.aliases.join(", ")));
        }
    }
    help
}

/// Generate a short list of programmer names for CLI help
pub fn programmer_names_short() -> String {
    let programmers = available_programmers();
    let names: Vec<&str> = programmers.iter().map(|p| p.name).collect();
    names.join(", ")
}

/// Resolve a programmer name or alias to its primary name
pub fn find_programmer(name: &str) -> Option<&'static str> {
    available_programmers()
        .into_iter()
        .find(|p| p.name == name || p.aliases.contains(&name))
        .map(|p| p.name)
}

/// Open the programmer described by `programmer`
///
/// The programmer string can be just the name (e.g., "dummy") or include
/// parameters (e.g., "linux_spi:dev=/dev/spidev0.0,spispeed=20000").
#[allow(unused_variables)]
pub fn open_programmer(
    programmer: &str,
    db: &ChipDatabase,
) -> Result<BoxedChannel, Box<dyn std::error::Error>> {
    let (name, options) = parse_programmer_string(programmer);

    let canonical_name = match find_programmer(name) {
        Some(n) => n,
        None => return Err(unknown_programmer_error(name)),
    };

    match canonical_name {
        #[cfg(feature = "dummy")]
        "dummy" => open_dummy(&options, db),

        #[cfg(feature = "linux-spi")]
        "linux_spi" => {
            log::info!("Opening Linux SPI programmer...");
            rnand_linux_spi::open_linux_spi(&options).map_err(|e| {
                format!(
                    "Failed to open Linux SPI device: {}\n\
                     Make sure the device exists and you have read/write permissions.",
                    e
                )
                .into()
            })
        }

        _ => Err(unknown_programmer_error(name)),
    }
}

#[cfg(feature = "dummy")]
fn open_dummy(
    options: &[(&str, &str)],
    db: &ChipDatabase,
) -> Result<BoxedChannel, Box<dyn std::error::Error>> {
    use rnand_dummy::{DummyConfig, DummyNand};

    let mut config = DummyConfig::default();
    for (key, value) in options {
        match *key {
            "chip" => {
                let chip = db
                    .find_by_name(value)
                    .ok_or_else(|| format!("dummy: unknown chip '{}'", value))?;
                config.profile = chip.clone();
            }
            "busy" => {
                config.busy_polls = value
                    .parse()
                    .map_err(|_| format!("dummy: invalid busy value: {}", value))?;
            }
            "protect" => {
                let hex = value.trim_start_matches("0x");
                config.protection = u8::from_str_radix(hex, 16)
                    .map_err(|_| format!("dummy: invalid protect value: {}", value))?;
            }
            _ => log::warn!("dummy: Unknown option: {}={}", key, value),
        }
    }

    log::info!(
        "dummy: emulating {} {} ({} busy polls per operation)",
        config.profile.vendor,
        config.profile.name,
        config.busy_polls
    );
    Ok(Box::new(DummyNand::new(config)))
}

/// Parse a programmer string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_programmer_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

fn unknown_programmer_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown programmer: {}\n\n", name);
    msg.push_str(&programmer_help());
    msg.push_str("\nUse 'rnand list-programmers' for more details");
    msg.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_programmer_string() {
        assert_eq!(parse_programmer_string("dummy"), ("dummy", vec![]));
        assert_eq!(
            parse_programmer_string("linux_spi:dev=/dev/spidev0.0,mode=3"),
            ("linux_spi", vec![("dev", "/dev/spidev0.0"), ("mode", "3")])
        );
    }

    #[cfg(feature = "linux-spi")]
    #[test]
    fn test_find_programmer_alias() {
        assert_eq!(find_programmer("spidev"), Some("linux_spi"));
        assert_eq!(find_programmer("nope"), None);
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_open_dummy_with_chip() {
        let db = ChipDatabase::with_builtin();
        let mut channel = open_programmer("dummy:chip=DS35Q1GA,busy=2", &db).unwrap();
        let (mfr, dev) =
            rnand_core::protocol::identify(&mut channel, &rnand_core::chip::DS35Q1GA).unwrap();
        assert_eq!((mfr, dev), (0xE5, 0x71));

        assert!(open_programmer("dummy:chip=NOPE", &db).is_err());
    }
}
