//! Linux spidev command channel
//!
//! `LinuxSpi` moves serial NAND commands over `/dev/spidevX.Y`. Each
//! transaction is one `SPI_IOC_MESSAGE` with chip select held across the
//! command and response phases.

use crate::error::{LinuxSpiError, Result};

use rnand_core::error::ChannelError;
use rnand_core::programmer::CommandChannel;

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;

/// Path to kernel spidev buffer size parameter
const BUF_SIZE_SYSFS: &str = "/sys/module/spidev/parameters/bufsiz";

/// Default SPI clock speed in Hz (10 MHz; every supported chip runs far faster)
const DEFAULT_SPEED_HZ: u32 = 10_000_000;

/// SPI mode constants
pub mod mode {
    /// SPI mode 0: CPOL=0, CPHA=0
    pub const MODE_0: u8 = 0;
    /// SPI mode 3: CPOL=1, CPHA=1
    pub const MODE_3: u8 = 3;
}

/// Linux spidev ioctl constants
mod ioctl {
    use nix::ioctl_write_ptr;

    const SPI_IOC_MAGIC: u8 = b'k';

    const SPI_IOC_TYPE_MODE: u8 = 1;
    const SPI_IOC_TYPE_BITS_PER_WORD: u8 = 3;
    const SPI_IOC_TYPE_MAX_SPEED_HZ: u8 = 4;

    ioctl_write_ptr!(spi_ioc_wr_mode, SPI_IOC_MAGIC, SPI_IOC_TYPE_MODE, u8);
    ioctl_write_ptr!(
        spi_ioc_wr_bits_per_word,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_BITS_PER_WORD,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_max_speed_hz,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MAX_SPEED_HZ,
        u32
    );

    /// Size of struct spi_ioc_transfer
    pub const SPI_IOC_TRANSFER_SIZE: usize = 32;

    /// SPI_IOC_MESSAGE(n) = _IOW(SPI_IOC_MAGIC, 0, char[n * sizeof(spi_ioc_transfer)])
    pub fn spi_ioc_message(n: u8) -> libc::c_ulong {
        let size = (n as usize) * SPI_IOC_TRANSFER_SIZE;
        ((1u32 << 30) | ((size as u32) << 16) | ((SPI_IOC_MAGIC as u32) << 8)) as libc::c_ulong
    }
}

/// Kernel `struct spi_ioc_transfer`
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct SpiIocTransfer {
    tx_buf: u64,
    rx_buf: u64,
    len: u32,
    speed_hz: u32,
    delay_usecs: u16,
    bits_per_word: u8,
    cs_change: u8,
    tx_nbits: u8,
    rx_nbits: u8,
    word_delay_usecs: u8,
    _pad: u8,
}

impl SpiIocTransfer {
    fn tx(data: &[u8], speed_hz: u32) -> Self {
        Self {
            tx_buf: data.as_ptr() as u64,
            len: data.len() as u32,
            speed_hz,
            bits_per_word: 8,
            ..Self::default()
        }
    }

    fn rx(buf: &mut [u8], speed_hz: u32) -> Self {
        Self {
            rx_buf: buf.as_mut_ptr() as u64,
            len: buf.len() as u32,
            speed_hz,
            bits_per_word: 8,
            ..Self::default()
        }
    }
}

/// Configuration for opening a Linux SPI device
#[derive(Debug, Clone)]
pub struct LinuxSpiConfig {
    /// Device path (e.g., "/dev/spidev0.0")
    pub device: String,
    /// SPI clock speed in Hz (default: 10 MHz)
    pub speed_hz: u32,
    /// SPI mode (0 or 3, default: 0)
    pub mode: u8,
}

impl Default for LinuxSpiConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            speed_hz: DEFAULT_SPEED_HZ,
            mode: mode::MODE_0,
        }
    }
}

impl LinuxSpiConfig {
    /// Create a new configuration with the given device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    /// Set the SPI clock speed in Hz
    pub fn with_speed(mut self, speed_hz: u32) -> Self {
        self.speed_hz = speed_hz;
        self
    }

    /// Set the SPI mode
    pub fn with_mode(mut self, mode: u8) -> Self {
        self.mode = mode;
        self
    }
}

/// Serial NAND command channel over Linux spidev
pub struct LinuxSpi {
    file: File,
    /// Largest message the kernel accepts, all transfers combined
    max_kernel_buf_size: usize,
    speed_hz: u32,
}

impl LinuxSpi {
    /// Open a Linux SPI device with the given configuration
    pub fn open(config: &LinuxSpiConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxSpiError::NoDevice);
        }
        if config.mode != mode::MODE_0 && config.mode != mode::MODE_3 {
            return Err(LinuxSpiError::InvalidParameter(format!(
                "SPI mode {} (serial NAND supports 0 and 3)",
                config.mode
            )));
        }

        log::debug!("linux_spi: Opening device {}", config.device);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|e| LinuxSpiError::OpenFailed {
                path: config.device.clone(),
                source: e,
            })?;
        let fd = file.as_raw_fd();

        let mode = config.mode;
        unsafe { ioctl::spi_ioc_wr_mode(fd, &mode) }
            .map_err(|e| configure_failed("SPI mode", mode.into(), e))?;

        let bits: u8 = 8;
        unsafe { ioctl::spi_ioc_wr_bits_per_word(fd, &bits) }
            .map_err(|e| configure_failed("bits per word", bits.into(), e))?;

        let speed = config.speed_hz;
        unsafe { ioctl::spi_ioc_wr_max_speed_hz(fd, &speed) }
            .map_err(|e| configure_failed("clock speed (Hz)", speed, e))?;

        let max_kernel_buf_size = get_max_kernel_buf_size();
        log::info!(
            "linux_spi: Opened {} (mode={}, speed={} kHz, bufsiz={})",
            config.device,
            mode,
            speed / 1000,
            max_kernel_buf_size
        );

        Ok(Self {
            file,
            max_kernel_buf_size,
            speed_hz: speed,
        })
    }

    /// Open a device with default settings
    pub fn open_device(device: &str) -> Result<Self> {
        Self::open(&LinuxSpiConfig::new(device))
    }

    /// Current clock speed in Hz
    pub fn speed_hz(&self) -> u32 {
        self.speed_hz
    }

    /// Send `command`, then clock in `response`, under one chip select
    fn spi_transfer(&mut self, command: &[u8], response: &mut [u8]) -> Result<()> {
        if command.is_empty() {
            return Err(LinuxSpiError::InvalidParameter(
                "command cannot be empty".into(),
            ));
        }

        let fd = self.file.as_raw_fd();
        let transfers = [
            SpiIocTransfer::tx(command, self.speed_hz),
            SpiIocTransfer::rx(response, self.speed_hz),
        ];
        let count: u8 = if response.is_empty() { 1 } else { 2 };

        let ret = unsafe {
            libc::ioctl(
                fd,
                ioctl::spi_ioc_message(count),
                transfers.as_ptr(),
            )
        };
        if ret < 0 {
            return Err(LinuxSpiError::TransferFailed(
                std::io::Error::last_os_error(),
            ));
        }
        Ok(())
    }
}

impl CommandChannel for LinuxSpi {
    fn transceive(
        &mut self,
        command: &[u8],
        response: &mut [u8],
    ) -> std::result::Result<(), ChannelError> {
        if command.len() + response.len() > self.max_kernel_buf_size {
            return Err(ChannelError::FrameTooLarge);
        }
        self.spi_transfer(command, response).map_err(|e| {
            log::debug!("linux_spi: {}", e);
            ChannelError::TransferFailed
        })
    }

    fn max_transfer_len(&self) -> usize {
        self.max_kernel_buf_size
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(us as u64));
    }
}

fn configure_failed(setting: &'static str, value: u32, errno: nix::errno::Errno) -> LinuxSpiError {
    LinuxSpiError::ConfigureFailed {
        setting,
        value,
        source: std::io::Error::from_raw_os_error(errno as i32),
    }
}

/// Read the maximum kernel buffer size from sysfs, or use page size as fallback
fn get_max_kernel_buf_size() -> usize {
    if let Ok(content) = std::fs::read_to_string(BUF_SIZE_SYSFS) {
        if let Ok(size) = content.trim().parse::<usize>() {
            if size > 0 {
                return size;
            }
        }
        log::warn!("linux_spi: Invalid buffer size in {}", BUF_SIZE_SYSFS);
    } else {
        log::debug!("linux_spi: Cannot read {}, using page size", BUF_SIZE_SYSFS);
    }

    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page_size > 0 {
        page_size as usize
    } else {
        4096
    }
}

/// Parse programmer options from a list of key-value pairs
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<LinuxSpiConfig, String> {
    let mut config = LinuxSpiConfig::default();

    for (key, value) in options {
        match *key {
            "dev" => {
                config.device = value.to_string();
            }
            "spispeed" => {
                let speed_khz: u32 = value
                    .parse()
                    .map_err(|_| format!("Invalid spispeed value: {}", value))?;
                config.speed_hz = speed_khz
                    .checked_mul(1000)
                    .ok_or_else(|| format!("spispeed out of range: {}", value))?;
            }
            "mode" => {
                let mode: u8 = value
                    .parse()
                    .map_err(|_| format!("Invalid mode value: {}", value))?;
                if mode != mode::MODE_0 && mode != mode::MODE_3 {
                    return Err(format!("Invalid SPI mode: {} (must be 0 or 3)", mode));
                }
                config.mode = mode;
            }
            _ => {
                log::warn!("linux_spi: Unknown option: {}={}", key, value);
            }
        }
    }

    if config.device.is_empty() {
        return Err("No device specified. Use dev=/dev/spidevX.Y".to_string());
    }

    Ok(config)
}
