//! Mock UART implementation for testing.
//!
//! [`MockUart`] lets tests feed the bytes a coupler would send and inspect
//! what the driver wrote back, without hardware. It is heapless, so it is
//! available in `no_std` builds and to integration tests without features.
//!
//! ## Example
//!
//! ```rust
//! use knx_tpuart::uart::{MockUart, UartPort};
//!
//! let mut uart = MockUart::new();
//! uart.feed(&[0x03]);
//! assert_eq!(uart.available(), 1);
//! assert_eq!(uart.read_byte(), Some(0x03));
//!
//! uart.write(&[0x01]).unwrap();
//! assert_eq!(uart.written(), &[0x01]);
//! ```

use crate::error::{KnxError, Result};
use crate::uart::port::UartPort;

/// Capacity of the receive queue
pub const MOCK_RX_CAPACITY: usize = 256;
/// Capacity of the transmit log
pub const MOCK_TX_CAPACITY: usize = 512;

/// Mock UART for testing the driver without a coupler.
///
/// This mock allows you to:
/// - Queue bytes that will be returned by `read_byte()`
/// - Inspect bytes written via `write()`
/// - Simulate a failing transmitter
#[derive(Debug, Default)]
pub struct MockUart {
    /// Bytes waiting to be read
    rx: heapless::Deque<u8, MOCK_RX_CAPACITY>,
    /// Everything written so far
    tx: heapless::Vec<u8, MOCK_TX_CAPACITY>,
    /// Reject writes when set
    fail_writes: bool,
}

impl MockUart {
    /// Create an empty mock UART.
    pub const fn new() -> Self {
        Self {
            rx: heapless::Deque::new(),
            tx: heapless::Vec::new(),
            fail_writes: false,
        }
    }

    /// Queue bytes for reading.
    ///
    /// Returns how many bytes were accepted; bytes beyond the receive
    /// capacity are dropped, like an overrun UART FIFO.
    pub fn feed(&mut self, bytes: &[u8]) -> usize {
        let mut accepted = 0;
        for &byte in bytes {
            if self.rx.push_back(byte).is_err() {
                break;
            }
            accepted += 1;
        }
        accepted
    }

    /// All bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.tx
    }

    /// Clear the write history.
    ///
    /// Useful for resetting state between test phases.
    pub fn clear_written(&mut self) {
        self.tx.clear();
    }

    /// Make subsequent writes fail with `WriteFailed`.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl UartPort for MockUart {
    fn available(&self) -> usize {
        self.rx.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(KnxError::write_failed());
        }
        self.tx
            .extend_from_slice(data)
            .map_err(|_| KnxError::write_failed())
    }
}
