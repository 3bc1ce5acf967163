//! Embassy channel adapter for `UartPort`.
//!
//! Embassy UART drivers are async. The usual wiring is a small task that
//! moves bytes between the HAL driver and a pair of
//! `embassy_sync::channel::Channel`s, while the poll loop talks to the
//! channels through [`ChannelUart`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! use embassy_sync::channel::Channel;
//! use knx_tpuart::uart::ChannelUart;
//!
//! static RX: Channel<CriticalSectionRawMutex, u8, 64> = Channel::new();
//! static TX: Channel<CriticalSectionRawMutex, u8, 64> = Channel::new();
//!
//! // rx task: RX.send(byte).await for every byte the HAL receives
//! // tx task: hal.write(&[TX.receive().await]).await
//!
//! let mut uart = ChannelUart::new(&RX, &TX);
//! let outcome = component.poll_with_clock(&mut uart, &EmbassyClock);
//! ```

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

use crate::error::{KnxError, Result};
use crate::uart::port::UartPort;

/// `UartPort` backed by two embassy channels.
///
/// # Type Parameters
///
/// - `M` - Raw mutex guarding the channels
/// - `RX` / `TX` - Channel capacities in bytes
pub struct ChannelUart<'a, M: RawMutex, const RX: usize, const TX: usize> {
    rx: &'a Channel<M, u8, RX>,
    tx: &'a Channel<M, u8, TX>,
}

impl<'a, M: RawMutex, const RX: usize, const TX: usize> ChannelUart<'a, M, RX, TX> {
    /// Wrap a receive and a transmit channel
    pub const fn new(rx: &'a Channel<M, u8, RX>, tx: &'a Channel<M, u8, TX>) -> Self {
        Self { rx, tx }
    }
}

impl<M: RawMutex, const RX: usize, const TX: usize> core::fmt::Debug for ChannelUart<'_, M, RX, TX> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChannelUart")
            .field("rx_pending", &self.rx.len())
            .field("tx_pending", &self.tx.len())
            .finish()
    }
}

impl<M: RawMutex, const RX: usize, const TX: usize> UartPort for ChannelUart<'_, M, RX, TX> {
    fn available(&self) -> usize {
        self.rx.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.try_receive().ok()
    }

    /// All-or-nothing: a frame is never half queued.
    fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.tx.free_capacity() < data.len() {
            return Err(KnxError::write_failed());
        }
        for &byte in data {
            self.tx.try_send(byte).map_err(|_| KnxError::write_failed())?;
        }
        Ok(())
    }
}
