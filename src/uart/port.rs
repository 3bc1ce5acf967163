//! Serial port abstraction.
//!
//! This module provides the `UartPort` trait that abstracts the UART the
//! TP-UART coupler is wired to, enabling:
//! - Testability through [`MockUart`](crate::uart::MockUart)
//! - Any HAL serial driver behind a thin adapter
//!
//! ## Example
//!
//! ```rust
//! use knx_tpuart::uart::UartPort;
//! use knx_tpuart::Result;
//!
//! struct LoopbackUart {
//!     last: Option<u8>,
//! }
//!
//! impl UartPort for LoopbackUart {
//!     fn available(&self) -> usize {
//!         usize::from(self.last.is_some())
//!     }
//!
//!     fn read_byte(&mut self) -> Option<u8> {
//!         self.last.take()
//!     }
//!
//!     fn write(&mut self, data: &[u8]) -> Result<()> {
//!         self.last = data.last().copied();
//!         Ok(())
//!     }
//! }
//! ```

use crate::error::Result;

/// Non-blocking byte-level serial port.
///
/// All methods must return immediately; the driver calls them from its poll
/// loop.
pub trait UartPort {
    /// Number of received bytes that can be read without blocking
    fn available(&self) -> usize;

    /// Read one received byte, `None` if nothing is pending
    fn read_byte(&mut self) -> Option<u8>;

    /// Queue `data` for transmission.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the bytes cannot be queued.
    fn write(&mut self, data: &[u8]) -> Result<()>;
}

impl<T: UartPort + ?Sized> UartPort for &mut T {
    fn available(&self) -> usize {
        (**self).available()
    }

    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }
}
