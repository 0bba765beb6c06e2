//! Command channel trait definitions

use crate::error::ChannelError;

/// Synchronous request/response primitive to a single chip
///
/// This trait represents a programmer that can run one framed command
/// against the chip: send `command` (opcode, address and dummy bytes as
/// assembled by the engine, followed by any payload) and then clock in
/// exactly `response.len()` bytes.
///
/// Implementations must not add framing of their own. Chip-select is
/// asserted for the whole command and released afterwards.
///
/// ## Example
///
/// ```ignore
/// impl CommandChannel for MySpi {
///     fn transceive(&mut self, command: &[u8], response: &mut [u8]) -> Result<(), ChannelError> {
///         self.spi_transfer(command, response)
///             .map_err(|_| ChannelError::TransferFailed)
///     }
///
///     fn delay_us(&mut self, us: u32) {
///         std::thread::sleep(std::time::Duration::from_micros(us as u64));
///     }
/// }
/// ```
pub trait CommandChannel {
    /// Send `command` and read `response.len()` bytes back
    ///
    /// An empty `response` means the command has no read phase.
    fn transceive(&mut self, command: &[u8], response: &mut [u8]) -> Result<(), ChannelError>;

    /// Largest frame (command plus response) the channel can move at once
    ///
    /// Page transfers need at least one header plus a full cache-transfer
    /// unit; the engine refuses to start when this is smaller.
    fn max_transfer_len(&self) -> usize {
        usize::MAX
    }

    /// Block for the specified number of microseconds
    fn delay_us(&mut self, us: u32);
}

impl<C: CommandChannel + ?Sized> CommandChannel for &mut C {
    fn transceive(&mut self, command: &[u8], response: &mut [u8]) -> Result<(), ChannelError> {
        (**self).transceive(command, response)
    }

    fn max_transfer_len(&self) -> usize {
        (**self).max_transfer_len()
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

impl CommandChannel for alloc::boxed::Box<dyn CommandChannel + Send> {
    fn transceive(&mut self, command: &[u8], response: &mut [u8]) -> Result<(), ChannelError> {
        (**self).transceive(command, response)
    }

    fn max_transfer_len(&self) -> usize {
        (**self).max_transfer_len()
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}
