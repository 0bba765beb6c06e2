//! rnand-linux-spi - Linux spidev support
//!
//! This crate provides a serial NAND command channel over the Linux spidev
//! interface (`/dev/spidevX.Y`).
//!
//! # Example
//!
//! ```no_run
//! use rnand_core::chip::W25N01GV;
//! use rnand_core::protocol;
//! use rnand_linux_spi::{LinuxSpi, LinuxSpiConfig};
//!
//! let config = LinuxSpiConfig::new("/dev/spidev0.0").with_speed(20_000_000);
//! let mut spi = LinuxSpi::open(&config)?;
//!
//! let (mfr, dev) = protocol::identify(&mut spi, &W25N01GV)?;
//! println!("ID: {:02X} {:04X}", mfr, dev);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with the rnand CLI
//!
//! ```bash
//! rnand probe -p linux_spi:dev=/dev/spidev0.0
//! rnand read -p linux_spi:dev=/dev/spidev0.0,spispeed=20000 -o nand.bin
//! ```
//!
//! The kernel limits one message to `bufsiz` bytes (see
//! `/sys/module/spidev/parameters/bufsiz`). A page transfer needs the
//! command header plus main and spare area in one message, so chips with
//! 2048+64 byte pages need `spidev.bufsiz=4096` or larger.

pub mod device;
pub mod error;

pub use device::{mode, parse_options, LinuxSpi, LinuxSpiConfig};
pub use error::{LinuxSpiError, Result};

/// Open a Linux SPI device and return a boxed command channel
///
/// Options come from the CLI programmer string:
///
/// - `dev=/dev/spidev0.0` - Required: device path
/// - `spispeed=10000` - Optional: speed in kHz (default: 10000)
/// - `mode=0` - Optional: SPI mode 0 or 3 (default: 0)
pub fn open_linux_spi(
    options: &[(&str, &str)],
) -> std::result::Result<
    Box<dyn rnand_core::programmer::CommandChannel + Send>,
    Box<dyn std::error::Error>,
> {
    let config = parse_options(options)?;
    let spi = LinuxSpi::open(&config)?;
    Ok(Box::new(spi))
}
