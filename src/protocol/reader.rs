//! TP-UART byte stream reassembly.
//!
//! The coupler forwards every bus byte to the UART. Between frames it also
//! emits single-byte service indications. [`FrameReader`] separates the two
//! and rebuilds complete TP1 frames using the length field of the header.
//!
//! ```text
//!            frame start byte
//!   ┌──────┐ ───────────────▶ ┌────────────┐
//!   │ Idle │                  │ Assembling │ ── 8 + L bytes ──▶ RawFrame
//!   └──────┘ ◀─────────────── └────────────┘
//!             timeout / frame complete
//! ```

use core::ops::Deref;

use crate::error::{KnxError, Result};
use crate::protocol::constants::{
    is_standard_frame_start, DEFAULT_SERIAL_TIMEOUT_MS, HEADER_SIZE, L_DATA_CONFIRM_NEGATIVE,
    L_DATA_CONFIRM_POSITIVE, MAX_FRAME_SIZE, MIN_FRAME_SIZE, U_RESET_INDICATION,
    U_STATE_INDICATION_MASK,
};
use crate::uart::UartPort;

/// Number of service indications kept between drains
pub const INDICATION_QUEUE_SIZE: usize = 4;

/// One reassembled TP1 frame, not yet validated
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawFrame {
    bytes: heapless::Vec<u8, MAX_FRAME_SIZE>,
}

impl RawFrame {
    /// Copy a frame from a slice.
    ///
    /// # Errors
    ///
    /// Returns `BufferTooSmall` if `bytes` is longer than 23 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        heapless::Vec::from_slice(bytes)
            .map(|bytes| Self { bytes })
            .map_err(|_| KnxError::buffer_too_small())
    }

    /// Frame bytes
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Deref for RawFrame {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Reader state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReaderState {
    /// Waiting for a frame start byte
    Idle,
    /// Collecting the bytes of a frame
    Assembling,
}

/// Flags of a `U_State.indication`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CouplerState {
    raw: u8,
}

impl CouplerState {
    /// Raw indication byte
    #[inline(always)]
    pub const fn raw(self) -> u8 {
        self.raw
    }

    /// Slave collision
    pub const fn slave_collision(self) -> bool {
        self.raw & 0x80 != 0
    }

    /// Receive error (checksum, parity or bit error)
    pub const fn receive_error(self) -> bool {
        self.raw & 0x40 != 0
    }

    /// Transmitter error
    pub const fn transmit_error(self) -> bool {
        self.raw & 0x20 != 0
    }

    /// Protocol error (illegal control byte)
    pub const fn protocol_error(self) -> bool {
        self.raw & 0x10 != 0
    }

    /// Temperature warning
    pub const fn temperature_warning(self) -> bool {
        self.raw & 0x08 != 0
    }

    /// True if no error flag is set
    pub const fn is_ok(self) -> bool {
        self.raw & 0xF8 == 0
    }
}

/// Single-byte TP-UART indications seen between frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServiceIndication {
    /// `U_Reset.indication`
    Reset,
    /// `L_Data.confirm` for the last transmitted frame
    DataConfirm {
        /// True if the frame was acknowledged on the bus
        positive: bool,
    },
    /// `U_State.indication`
    State(CouplerState),
}

impl ServiceIndication {
    /// Classify a byte received outside a frame
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            U_RESET_INDICATION => Some(Self::Reset),
            L_DATA_CONFIRM_POSITIVE => Some(Self::DataConfirm { positive: true }),
            L_DATA_CONFIRM_NEGATIVE => Some(Self::DataConfirm { positive: false }),
            b if b & U_STATE_INDICATION_MASK == U_STATE_INDICATION_MASK => {
                Some(Self::State(CouplerState { raw: b }))
            }
            _ => None,
        }
    }
}

/// Reassembles TP1 frames from the UART byte stream.
///
/// # Examples
///
/// ```rust
/// use knx_tpuart::protocol::reader::FrameReader;
/// use knx_tpuart::uart::MockUart;
///
/// let mut uart = MockUart::new();
/// uart.feed(&[0xBC, 0x11, 0x01, 0x0A, 0x03, 0xE1, 0x00, 0x81, 0x3A]);
///
/// let mut reader = FrameReader::new(1000);
/// let frame = reader.poll(&mut uart, 0).unwrap().unwrap();
/// assert_eq!(frame.len(), 9);
/// ```
#[derive(Debug)]
pub struct FrameReader {
    buffer: heapless::Vec<u8, MAX_FRAME_SIZE>,
    state: ReaderState,
    last_byte_ms: u64,
    serial_timeout_ms: u32,
    indications: heapless::Deque<ServiceIndication, INDICATION_QUEUE_SIZE>,
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new(DEFAULT_SERIAL_TIMEOUT_MS)
    }
}

impl FrameReader {
    /// Create a reader with the given inter-byte timeout
    pub const fn new(serial_timeout_ms: u32) -> Self {
        Self {
            buffer: heapless::Vec::new(),
            state: ReaderState::Idle,
            last_byte_ms: 0,
            serial_timeout_ms,
            indications: heapless::Deque::new(),
        }
    }

    /// Current state
    #[inline(always)]
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Bytes of the partial frame collected so far
    #[inline(always)]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Inter-byte timeout in milliseconds
    #[inline(always)]
    pub fn serial_timeout_ms(&self) -> u32 {
        self.serial_timeout_ms
    }

    /// Change the inter-byte timeout. Applies to the partial frame too.
    pub fn set_serial_timeout_ms(&mut self, timeout_ms: u32) {
        self.serial_timeout_ms = timeout_ms;
    }

    /// Drop any partial frame and return to `Idle`
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = ReaderState::Idle;
    }

    /// Take the service indications recorded since the last call
    pub fn drain_indications(&mut self) -> impl Iterator<Item = ServiceIndication> + '_ {
        core::iter::from_fn(move || self.indications.pop_front())
    }

    /// Read available bytes until one frame is complete.
    ///
    /// Bytes after a completed frame stay in the UART for the next call.
    ///
    /// # Errors
    ///
    /// Returns a frame timeout error if a partial frame saw no byte for
    /// longer than the serial timeout and the UART has nothing pending. The
    /// partial frame is discarded and the reader is back in `Idle`. Bytes
    /// already waiting continue the partial frame however late the call is;
    /// the check octet rejects a bad join.
    pub fn poll<U: UartPort + ?Sized>(&mut self, uart: &mut U, now_ms: u64) -> Result<Option<RawFrame>> {
        if self.state == ReaderState::Assembling
            && uart.available() == 0
            && now_ms.saturating_sub(self.last_byte_ms) > u64::from(self.serial_timeout_ms)
        {
            knx_log!(
                warn,
                "Partial frame dropped after {} bytes, {} ms idle",
                self.buffer.len(),
                now_ms.saturating_sub(self.last_byte_ms)
            );
            self.reset();
            return Err(KnxError::frame_timeout());
        }

        while uart.available() > 0 {
            let Some(byte) = uart.read_byte() else {
                break;
            };

            match self.state {
                ReaderState::Idle => self.accept_idle_byte(byte, now_ms),
                ReaderState::Assembling => {
                    self.last_byte_ms = now_ms;
                    if self.buffer.push(byte).is_err() {
                        knx_log!(warn, "Receive buffer overflow, frame dropped");
                        self.reset();
                        continue;
                    }
                    if let Some(frame) = self.take_complete_frame() {
                        return Ok(Some(frame));
                    }
                }
            }
        }

        Ok(None)
    }

    fn accept_idle_byte(&mut self, byte: u8, now_ms: u64) {
        if is_standard_frame_start(byte) {
            self.buffer.clear();
            // Capacity is never zero, the push cannot fail
            let _ = self.buffer.push(byte);
            self.state = ReaderState::Assembling;
            self.last_byte_ms = now_ms;
        } else if let Some(indication) = ServiceIndication::from_byte(byte) {
            knx_log!(debug, "Service indication {:?}", indication);
            if self.indications.is_full() {
                self.indications.pop_front();
            }
            let _ = self.indications.push_back(indication);
        } else {
            knx_log!(trace, "Skipping byte {}", byte);
        }
    }

    fn take_complete_frame(&mut self) -> Option<RawFrame> {
        if self.buffer.len() < HEADER_SIZE {
            return None;
        }

        let expected = MIN_FRAME_SIZE + usize::from(self.buffer[5] & 0x0F);
        if self.buffer.len() < expected {
            return None;
        }

        knx_log!(debug, "Frame complete: {} bytes", expected);
        let frame = RawFrame {
            bytes: core::mem::take(&mut self.buffer),
        };
        self.state = ReaderState::Idle;
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uart::MockUart;

    const SWITCH_ON: [u8; 9] = [0xBC, 0x11, 0x01, 0x0A, 0x03, 0xE1, 0x00, 0x81, 0x3A];

    #[test]
    fn test_complete_frame_in_one_tick() {
        let mut uart = MockUart::new();
        uart.feed(&SWITCH_ON);

        let mut reader = FrameReader::new(1000);
        let frame = reader.poll(&mut uart, 10).unwrap().unwrap();
        assert_eq!(frame.as_bytes(), &SWITCH_ON);
        assert_eq!(reader.state(), ReaderState::Idle);
        assert_eq!(reader.buffered(), 0);
    }

    #[test]
    fn test_frame_split_across_ticks() {
        let mut uart = MockUart::new();
        let mut reader = FrameReader::new(1000);

        uart.feed(&SWITCH_ON[..4]);
        assert!(reader.poll(&mut uart, 0).unwrap().is_none());
        assert_eq!(reader.state(), ReaderState::Assembling);
        assert_eq!(reader.buffered(), 4);

        uart.feed(&SWITCH_ON[4..]);
        let frame = reader.poll(&mut uart, 5).unwrap().unwrap();
        assert_eq!(frame.as_bytes(), &SWITCH_ON);
    }

    #[test]
    fn test_one_frame_per_poll() {
        let mut uart = MockUart::new();
        uart.feed(&SWITCH_ON);
        uart.feed(&SWITCH_ON);

        let mut reader = FrameReader::new(1000);
        assert!(reader.poll(&mut uart, 0).unwrap().is_some());
        assert_eq!(uart.available(), SWITCH_ON.len());
        assert!(reader.poll(&mut uart, 0).unwrap().is_some());
        assert!(reader.poll(&mut uart, 0).unwrap().is_none());
    }

    #[test]
    fn test_garbage_skipped_in_idle() {
        let mut uart = MockUart::new();
        uart.feed(&[0x00, 0x55, 0x3C, 0x10]);
        uart.feed(&SWITCH_ON);

        let mut reader = FrameReader::new(1000);
        let frame = reader.poll(&mut uart, 0).unwrap().unwrap();
        assert_eq!(frame.as_bytes(), &SWITCH_ON);
        assert_eq!(reader.drain_indications().count(), 0);
    }

    #[test]
    fn test_timeout_discards_partial_frame() {
        let mut uart = MockUart::new();
        let mut reader = FrameReader::new(1000);

        uart.feed(&SWITCH_ON[..3]);
        assert!(reader.poll(&mut uart, 0).unwrap().is_none());

        // Exactly the timeout is not yet "longer than"
        assert!(reader.poll(&mut uart, 1000).unwrap().is_none());
        assert_eq!(reader.state(), ReaderState::Assembling);

        let err = reader.poll(&mut uart, 1001).unwrap_err();
        assert!(err.is_frame_timeout());
        assert_eq!(reader.state(), ReaderState::Idle);
        assert_eq!(reader.buffered(), 0);

        uart.feed(&SWITCH_ON);
        let frame = reader.poll(&mut uart, 1002).unwrap().unwrap();
        assert_eq!(frame.as_bytes(), &SWITCH_ON);
    }

    #[test]
    fn test_late_poll_completes_pending_frame() {
        let mut uart = MockUart::new();
        let mut reader = FrameReader::new(1000);

        uart.feed(&SWITCH_ON[..3]);
        assert!(reader.poll(&mut uart, 0).unwrap().is_none());

        // The rest arrived in time but the poll runs late
        uart.feed(&SWITCH_ON[3..]);
        let frame = reader.poll(&mut uart, 1500).unwrap().unwrap();
        assert_eq!(frame.as_bytes(), &SWITCH_ON);
        assert_eq!(reader.drain_indications().count(), 0);
        assert_eq!(reader.state(), ReaderState::Idle);
    }

    #[test]
    fn test_timeout_measured_from_last_byte() {
        let mut uart = MockUart::new();
        let mut reader = FrameReader::new(100);

        uart.feed(&SWITCH_ON[..2]);
        assert!(reader.poll(&mut uart, 0).unwrap().is_none());
        uart.feed(&SWITCH_ON[2..5]);
        assert!(reader.poll(&mut uart, 90).unwrap().is_none());
        uart.feed(&SWITCH_ON[5..]);
        assert!(reader.poll(&mut uart, 180).unwrap().is_some());
    }

    #[test]
    fn test_service_indications() {
        let mut uart = MockUart::new();
        uart.feed(&[U_RESET_INDICATION, L_DATA_CONFIRM_POSITIVE, L_DATA_CONFIRM_NEGATIVE, 0x47]);

        let mut reader = FrameReader::new(1000);
        assert!(reader.poll(&mut uart, 0).unwrap().is_none());

        let mut drained = reader.drain_indications();
        assert_eq!(drained.next(), Some(ServiceIndication::Reset));
        assert_eq!(
            drained.next(),
            Some(ServiceIndication::DataConfirm { positive: true })
        );
        assert_eq!(
            drained.next(),
            Some(ServiceIndication::DataConfirm { positive: false })
        );
        match drained.next() {
            Some(ServiceIndication::State(state)) => {
                assert!(state.receive_error());
                assert!(!state.is_ok());
            }
            other => panic!("unexpected indication: {other:?}"),
        }
        assert_eq!(drained.next(), None);
    }

    #[test]
    fn test_indication_queue_drops_oldest() {
        let mut uart = MockUart::new();
        uart.feed(&[U_RESET_INDICATION, 0x07, 0x07, 0x07, L_DATA_CONFIRM_POSITIVE]);

        let mut reader = FrameReader::new(1000);
        reader.poll(&mut uart, 0).unwrap();

        let drained: heapless::Vec<ServiceIndication, 8> = reader.drain_indications().collect();
        assert_eq!(drained.len(), INDICATION_QUEUE_SIZE);
        assert!(matches!(drained[0], ServiceIndication::State(s) if s.is_ok()));
        assert_eq!(
            drained[3],
            ServiceIndication::DataConfirm { positive: true }
        );
    }

    #[test]
    fn test_buffer_never_exceeds_max_frame() {
        // Longest frame: length field 15
        let mut frame = [0u8; MAX_FRAME_SIZE];
        frame[0] = 0xBC;
        frame[5] = 0xEF;

        let mut uart = MockUart::new();
        uart.feed(&frame);
        uart.feed(&[0xAA; 4]);

        let mut reader = FrameReader::new(1000);
        let raw = reader.poll(&mut uart, 0).unwrap().unwrap();
        assert_eq!(raw.len(), MAX_FRAME_SIZE);
        assert_eq!(uart.available(), 4);
    }

    #[test]
    fn test_raw_frame_from_slice_bounds() {
        assert!(RawFrame::from_slice(&[0u8; MAX_FRAME_SIZE]).is_ok());
        assert!(RawFrame::from_slice(&[0u8; MAX_FRAME_SIZE + 1]).is_err());
    }
}
