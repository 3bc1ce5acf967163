//! Dispatch component: the poll loop tying reader, decoder, filter and
//! application handler together.
//!
//! ```text
//! UART ─▶ FrameReader ─▶ decode ─▶ accepts ─▶ TelegramHandler
//!              │                      │
//!              └─ indications         └─ U_AckInformation
//! ```
//!
//! ## Example
//!
//! ```rust
//! use knx_tpuart::{ComponentConfig, DispatchComponent, PollOutcome, Telegram};
//! use knx_tpuart::uart::MockUart;
//!
//! let config = ComponentConfig::new("1.1.250")
//!     .unwrap()
//!     .with_listen_group_address("1/2/3")
//!     .unwrap();
//!
//! let mut received = 0;
//! let mut knx = DispatchComponent::from_config(&config)
//!     .unwrap()
//!     .with_handler(|telegram: Telegram| {
//!         assert!(telegram.is_group_write());
//!         received += 1;
//!     });
//!
//! let mut uart = MockUart::new();
//! uart.feed(&[0xBC, 0x11, 0x01, 0x0A, 0x03, 0xE1, 0x00, 0x81, 0x3A]);
//! assert_eq!(knx.poll(&mut uart, 0), PollOutcome::Dispatched);
//! drop(knx);
//! assert_eq!(received, 1);
//! ```

use core::fmt;

use crate::addressing::{GroupAddress, IndividualAddress};
use crate::clock::Clock;
use crate::config::{ComponentConfig, ValidatedConfig};
use crate::error::{KnxError, Result};
use crate::protocol::constants::MAX_FRAME_SIZE;
use crate::protocol::filter::{accepts, GroupAddressSet};
use crate::protocol::reader::{CouplerState, FrameReader, RawFrame, ReaderState, ServiceIndication};
use crate::protocol::services::{DataRequest, TpUartRequest};
use crate::protocol::telegram::{decode, GroupData, Telegram, TelegramBuilder};
use crate::uart::UartPort;

/// Receives every accepted telegram.
///
/// Called synchronously from [`DispatchComponent::poll`]; it must not block.
/// Closures taking a [`Telegram`] implement it, and `()` ignores everything.
pub trait TelegramHandler {
    /// Handle one accepted telegram
    fn on_telegram(&mut self, telegram: Telegram);
}

impl<F: FnMut(Telegram)> TelegramHandler for F {
    fn on_telegram(&mut self, telegram: Telegram) {
        self(telegram);
    }
}

impl TelegramHandler for () {
    fn on_telegram(&mut self, _telegram: Telegram) {}
}

// Counters saturate instead of wrapping back to zero
#[inline]
fn bump(counter: &mut u32) {
    *counter = counter.saturating_add(1);
}

/// What a single poll tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollOutcome {
    /// No complete frame this tick
    NoFrame,
    /// A telegram was passed to the handler
    Dispatched,
    /// A valid telegram was not addressed to a listened group
    Filtered,
    /// A frame failed to decode and was dropped
    DecodeFailed,
    /// A partial frame timed out and was dropped
    TimedOut,
}

/// Counters maintained by the poll loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Stats {
    /// Complete frames taken from the reader
    pub frames_received: u32,
    /// Telegrams passed to the handler
    pub dispatched: u32,
    /// Valid telegrams dropped by the address filter
    pub filtered_out: u32,
    /// Frames with a bad check octet
    pub checksum_errors: u32,
    /// Frames shorter than announced
    pub truncated_frames: u32,
    /// Frames with a non-standard control field
    pub invalid_control_fields: u32,
    /// Partial frames abandoned after the serial timeout
    pub timeouts: u32,
    /// `U_Reset.indication` bytes seen
    pub reset_indications: u32,
    /// `U_State.indication` bytes seen
    pub state_indications: u32,
    /// Positive `L_Data.confirm` bytes seen
    pub confirms_positive: u32,
    /// Negative `L_Data.confirm` bytes seen
    pub confirms_negative: u32,
    /// Telegrams handed to the UART
    pub telegrams_sent: u32,
    /// Failed UART writes
    pub write_errors: u32,
}

/// KNX TP-UART dispatch component.
///
/// Owns the listen set, the serial timeout, the device address and the
/// handler. The UART is borrowed per call.
pub struct DispatchComponent<H = ()> {
    reader: FrameReader,
    listen: GroupAddressSet,
    use_address: IndividualAddress,
    acknowledge: bool,
    handler: H,
    stats: Stats,
    coupler_state: Option<CouplerState>,
}

impl DispatchComponent<()> {
    /// Build from a validated configuration, with the no-op handler
    pub fn new(config: ValidatedConfig) -> Self {
        let (use_address, listen, serial_timeout_ms, acknowledge) = config.into_parts();
        knx_log!(
            info,
            "KNX component {} listening to {} group addresses",
            use_address.raw(),
            listen.len()
        );
        Self {
            reader: FrameReader::new(serial_timeout_ms),
            listen,
            use_address,
            acknowledge,
            handler: (),
            stats: Stats::default(),
            coupler_state: None,
        }
    }

    /// Validate `config` and build from it
    pub fn from_config(config: &ComponentConfig) -> Result<Self> {
        Ok(Self::new(config.validate()?))
    }
}

impl<H> DispatchComponent<H> {
    /// Attach the telegram handler
    pub fn with_handler<H2: TelegramHandler>(self, handler: H2) -> DispatchComponent<H2> {
        DispatchComponent {
            reader: self.reader,
            listen: self.listen,
            use_address: self.use_address,
            acknowledge: self.acknowledge,
            handler,
            stats: self.stats,
            coupler_state: self.coupler_state,
        }
    }

    /// Change the partial frame timeout.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSerialTimeout` for zero.
    pub fn set_serial_timeout(&mut self, timeout_ms: u32) -> Result<()> {
        if timeout_ms == 0 {
            return Err(KnxError::invalid_serial_timeout());
        }
        self.reader.set_serial_timeout_ms(timeout_ms);
        Ok(())
    }

    /// Add a group address to the listen set.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAddressFormat` for malformed text and
    /// `TooManyListenAddresses` when the set is full. The set is unchanged on
    /// error.
    pub fn add_listen_group_address(&mut self, address: &str) -> Result<()> {
        let address: GroupAddress = address.trim().parse()?;
        if self.listen.insert(address)? {
            knx_log!(debug, "Listening to group address {}", address.raw());
        }
        Ok(())
    }

    /// Set this device's individual address from `area.line.device`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAddressFormat` for malformed text.
    pub fn set_use_address(&mut self, address: &str) -> Result<()> {
        self.use_address = address.trim().parse()?;
        Ok(())
    }

    /// Enable or disable `U_AckInformation` replies
    pub fn set_acknowledge(&mut self, acknowledge: bool) {
        self.acknowledge = acknowledge;
    }

    /// This device's individual address
    pub fn use_address(&self) -> IndividualAddress {
        self.use_address
    }

    /// Current listen set
    pub fn listen_group_addresses(&self) -> &GroupAddressSet {
        &self.listen
    }

    /// Check if telegrams to `address` would be dispatched
    pub fn is_listening_to(&self, address: GroupAddress) -> bool {
        self.listen.admits(address)
    }

    /// Partial frame timeout
    pub fn serial_timeout_ms(&self) -> u32 {
        self.reader.serial_timeout_ms()
    }

    /// Whether received frames are acknowledged
    pub fn acknowledge(&self) -> bool {
        self.acknowledge
    }

    /// `Idle` or `Assembling`
    pub fn state(&self) -> ReaderState {
        self.reader.state()
    }

    /// Counters since construction
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Last `U_State.indication` received
    pub fn coupler_state(&self) -> Option<CouplerState> {
        self.coupler_state
    }

    /// Handler reference
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Mutable handler reference
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Take the handler back, dropping the component
    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Send `U_Reset.request` and drop any partial frame
    pub fn reset_coupler<U: UartPort + ?Sized>(&mut self, uart: &mut U) -> Result<()> {
        self.reader.reset();
        self.write_request(uart, TpUartRequest::Reset)
    }

    /// Send `U_State.request`; the answer shows up in [`Self::coupler_state`]
    pub fn request_state<U: UartPort + ?Sized>(&mut self, uart: &mut U) -> Result<()> {
        self.write_request(uart, TpUartRequest::State)
    }

    /// Send `A_GroupValue_Write`
    pub fn group_write<U: UartPort + ?Sized>(
        &mut self,
        uart: &mut U,
        address: GroupAddress,
        data: GroupData<'_>,
    ) -> Result<()> {
        let telegram = TelegramBuilder::group_write(self.use_address, address, data).build()?;
        self.send_telegram(uart, &telegram)
    }

    /// Send `A_GroupValue_Response`
    pub fn group_response<U: UartPort + ?Sized>(
        &mut self,
        uart: &mut U,
        address: GroupAddress,
        data: GroupData<'_>,
    ) -> Result<()> {
        let telegram = TelegramBuilder::group_response(self.use_address, address, data).build()?;
        self.send_telegram(uart, &telegram)
    }

    /// Send `A_GroupValue_Read`
    pub fn group_read<U: UartPort + ?Sized>(&mut self, uart: &mut U, address: GroupAddress) -> Result<()> {
        let telegram = TelegramBuilder::group_read(self.use_address, address).build()?;
        self.send_telegram(uart, &telegram)
    }

    /// Frame a telegram as a TP-UART data request and write it.
    ///
    /// Does not wait for `L_Data.confirm`; it is counted on a later poll.
    pub fn send_telegram<U: UartPort + ?Sized>(&mut self, uart: &mut U, telegram: &Telegram) -> Result<()> {
        let mut frame = [0u8; MAX_FRAME_SIZE];
        let len = telegram.encode(&mut frame)?;
        let request = DataRequest::new(&frame[..len])?;

        knx_log!(debug, "Sending {} byte telegram to {}", len, telegram.destination_raw());
        self.write(uart, request.as_bytes())?;
        bump(&mut self.stats.telegrams_sent);
        Ok(())
    }

    fn write_request<U: UartPort + ?Sized>(&mut self, uart: &mut U, request: TpUartRequest) -> Result<()> {
        self.write(uart, &[request.to_byte()])
    }

    fn write<U: UartPort + ?Sized>(&mut self, uart: &mut U, bytes: &[u8]) -> Result<()> {
        uart.write(bytes).inspect_err(|_| {
            bump(&mut self.stats.write_errors);
        })
    }

    fn record_indications(&mut self) {
        for indication in self.reader.drain_indications() {
            match indication {
                ServiceIndication::Reset => {
                    knx_log!(info, "TP-UART reset indication");
                    bump(&mut self.stats.reset_indications);
                }
                ServiceIndication::DataConfirm { positive: true } => {
                    bump(&mut self.stats.confirms_positive);
                }
                ServiceIndication::DataConfirm { positive: false } => {
                    knx_log!(warn, "Telegram not confirmed by the bus");
                    bump(&mut self.stats.confirms_negative);
                }
                ServiceIndication::State(state) => {
                    if !state.is_ok() {
                        knx_log!(warn, "TP-UART state flags {}", state.raw());
                    }
                    bump(&mut self.stats.state_indications);
                    self.coupler_state = Some(state);
                }
            }
        }
    }
}

impl<H: TelegramHandler> DispatchComponent<H> {
    /// Run one poll tick.
    ///
    /// Reads at most one frame, decodes it, filters it and hands it to the
    /// handler. Per-frame failures are logged and counted, never returned.
    pub fn poll<U: UartPort + ?Sized>(&mut self, uart: &mut U, now_ms: u64) -> PollOutcome {
        let outcome = match self.reader.poll(uart, now_ms) {
            Ok(None) => PollOutcome::NoFrame,
            Ok(Some(frame)) => self.handle_frame(uart, &frame),
            Err(err) => {
                knx_log!(warn, "{}", err);
                bump(&mut self.stats.timeouts);
                PollOutcome::TimedOut
            }
        };
        self.record_indications();
        outcome
    }

    /// Run one poll tick reading the time from `clock`
    pub fn poll_with_clock<U: UartPort + ?Sized, C: Clock + ?Sized>(
        &mut self,
        uart: &mut U,
        clock: &C,
    ) -> PollOutcome {
        self.poll(uart, clock.now_ms())
    }

    fn handle_frame<U: UartPort + ?Sized>(&mut self, uart: &mut U, frame: &RawFrame) -> PollOutcome {
        bump(&mut self.stats.frames_received);

        let telegram = match decode(frame) {
            Ok(telegram) => telegram,
            Err(err) => {
                knx_log!(warn, "Dropping frame: {}", err);
                match err {
                    KnxError::Decode(ref e) if e.is_checksum_mismatch() => {
                        bump(&mut self.stats.checksum_errors);
                    }
                    KnxError::Decode(ref e) if e.is_truncated_frame() => {
                        bump(&mut self.stats.truncated_frames);
                    }
                    _ => bump(&mut self.stats.invalid_control_fields),
                }
                return PollOutcome::DecodeFailed;
            }
        };

        let accepted = accepts(&telegram, &self.listen);
        if self.acknowledge {
            // Write failures are counted; the telegram is still processed
            let _ = self.write_request(uart, TpUartRequest::AckInformation { addressed: accepted });
        }

        if !accepted {
            knx_log!(trace, "Ignoring telegram for {}", telegram.destination_raw());
            bump(&mut self.stats.filtered_out);
            return PollOutcome::Filtered;
        }

        knx_log!(debug, "Dispatching telegram for group {}", telegram.destination_raw());
        bump(&mut self.stats.dispatched);
        self.handler.on_telegram(telegram);
        PollOutcome::Dispatched
    }
}

impl<H> fmt::Debug for DispatchComponent<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchComponent")
            .field("use_address", &self.use_address)
            .field("listen", &self.listen)
            .field("serial_timeout_ms", &self.reader.serial_timeout_ms())
            .field("acknowledge", &self.acknowledge)
            .field("state", &self.reader.state())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::protocol::telegram::checksum;
    use crate::uart::MockUart;

    const SWITCH_ON_1_2_3: [u8; 9] = [0xBC, 0x11, 0x01, 0x0A, 0x03, 0xE1, 0x00, 0x81, 0x3A];

    fn component(listen: &[&str]) -> DispatchComponent {
        let mut config = ComponentConfig::new("1.1.250").unwrap();
        for address in listen {
            config = config.with_listen_group_address(address).unwrap();
        }
        DispatchComponent::from_config(&config).unwrap()
    }

    fn frame_to(main: u8, middle: u8, sub: u8) -> heapless::Vec<u8, MAX_FRAME_SIZE> {
        let raw = GroupAddress::new(main, middle, sub).unwrap().raw().to_be_bytes();
        let mut frame: heapless::Vec<u8, MAX_FRAME_SIZE> =
            heapless::Vec::from_slice(&[0xBC, 0x11, 0x01, raw[0], raw[1], 0xE1, 0x00, 0x81]).unwrap();
        let cs = checksum(&frame);
        frame.push(cs).unwrap();
        frame
    }

    #[test]
    fn test_dispatch_listened_address() {
        let mut seen: heapless::Vec<Telegram, 4> = heapless::Vec::new();
        let mut knx = component(&["1/2/3"]).with_handler(|t: Telegram| {
            seen.push(t).unwrap();
        });

        let mut uart = MockUart::new();
        uart.feed(&SWITCH_ON_1_2_3);
        assert_eq!(knx.poll(&mut uart, 0), PollOutcome::Dispatched);
        assert_eq!(knx.stats().dispatched, 1);
        // Addressed acknowledge
        assert_eq!(uart.written(), &[0x11]);
        drop(knx);

        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].short_data(), 1);
    }

    #[test]
    fn test_filtered_address() {
        let mut knx = component(&["1/2/3"]);
        let mut uart = MockUart::new();
        uart.feed(&frame_to(4, 5, 6));

        assert_eq!(knx.poll(&mut uart, 0), PollOutcome::Filtered);
        assert_eq!(knx.stats().filtered_out, 1);
        assert_eq!(uart.written(), &[0x10]);
    }

    #[test]
    fn test_acknowledge_disabled() {
        let mut knx = component(&[]);
        knx.set_acknowledge(false);
        let mut uart = MockUart::new();
        uart.feed(&SWITCH_ON_1_2_3);

        assert_eq!(knx.poll(&mut uart, 0), PollOutcome::Dispatched);
        assert!(uart.written().is_empty());
    }

    #[test]
    fn test_checksum_error_counted() {
        let mut knx = component(&[]);
        let mut frame = SWITCH_ON_1_2_3;
        frame[8] = 0x00;
        let mut uart = MockUart::new();
        uart.feed(&frame);

        assert_eq!(knx.poll(&mut uart, 0), PollOutcome::DecodeFailed);
        assert_eq!(knx.stats().checksum_errors, 1);
        assert_eq!(knx.stats().frames_received, 1);
        assert!(uart.written().is_empty());
    }

    #[test]
    fn test_timeout_counted() {
        let clock = ManualClock::new(0);
        let mut knx = component(&[]);
        let mut uart = MockUart::new();

        uart.feed(&SWITCH_ON_1_2_3[..3]);
        assert_eq!(knx.poll_with_clock(&mut uart, &clock), PollOutcome::NoFrame);
        assert_eq!(knx.state(), ReaderState::Assembling);

        clock.advance(1001);
        assert_eq!(knx.poll_with_clock(&mut uart, &clock), PollOutcome::TimedOut);
        assert_eq!(knx.state(), ReaderState::Idle);
        assert_eq!(knx.stats().timeouts, 1);
    }

    #[test]
    fn test_counters_saturate() {
        let mut knx = component(&[]);
        knx.stats.dispatched = u32::MAX;
        let mut uart = MockUart::new();
        uart.feed(&SWITCH_ON_1_2_3);

        assert_eq!(knx.poll(&mut uart, 0), PollOutcome::Dispatched);
        assert_eq!(knx.stats().dispatched, u32::MAX);
        assert_eq!(knx.stats().frames_received, 1);
    }

    #[test]
    fn test_late_poll_keeps_pending_frame() {
        let mut knx = component(&["1/2/3"]);
        let mut uart = MockUart::new();

        uart.feed(&SWITCH_ON_1_2_3[..3]);
        assert_eq!(knx.poll(&mut uart, 0), PollOutcome::NoFrame);
        uart.feed(&SWITCH_ON_1_2_3[3..]);

        assert_eq!(knx.poll(&mut uart, 1500), PollOutcome::Dispatched);
        let stats = knx.stats();
        assert_eq!(stats.timeouts, 0);
        assert_eq!(stats.reset_indications, 0);
        assert_eq!(knx.coupler_state(), None);
    }

    #[test]
    fn test_setters() {
        let mut knx = component(&[]);
        assert!(knx.is_listening_to(GroupAddress::new(9, 1, 1).unwrap()));

        knx.add_listen_group_address("1/2/3").unwrap();
        assert!(!knx.is_listening_to(GroupAddress::new(9, 1, 1).unwrap()));

        let err = knx.add_listen_group_address("bad-format").unwrap_err();
        assert!(err.is_invalid_address_format());
        assert_eq!(knx.listen_group_addresses().len(), 1);

        assert!(knx.set_serial_timeout(0).is_err());
        knx.set_serial_timeout(50).unwrap();
        assert_eq!(knx.serial_timeout_ms(), 50);

        knx.set_use_address("2.3.4").unwrap();
        assert_eq!(knx.use_address(), IndividualAddress::new(2, 3, 4).unwrap());
        assert!(knx.set_use_address("2/3").is_err());
    }

    #[test]
    fn test_indications_update_stats() {
        let mut knx = component(&[]);
        let mut uart = MockUart::new();
        uart.feed(&[0x03, 0x8B, 0x0B, 0x07]);

        assert_eq!(knx.poll(&mut uart, 0), PollOutcome::NoFrame);
        let stats = knx.stats();
        assert_eq!(stats.reset_indications, 1);
        assert_eq!(stats.confirms_positive, 1);
        assert_eq!(stats.confirms_negative, 1);
        assert_eq!(stats.state_indications, 1);
        assert!(knx.coupler_state().unwrap().is_ok());
    }

    #[test]
    fn test_group_write_framing() {
        let mut knx = component(&[]);
        let mut uart = MockUart::new();
        let target = GroupAddress::new(1, 2, 3).unwrap();

        knx.group_write(&mut uart, target, GroupData::Short(1)).unwrap();

        // Source is this device, 1.1.250
        let telegram = TelegramBuilder::group_write(knx.use_address(), target, GroupData::Short(1))
            .build()
            .unwrap();
        let mut frame = [0u8; MAX_FRAME_SIZE];
        let len = telegram.encode(&mut frame).unwrap();

        let written = uart.written();
        assert_eq!(written.len(), 2 * len);
        for (index, pair) in written.chunks(2).enumerate() {
            let control = if index == len - 1 { 0x40 } else { 0x80 };
            assert_eq!(pair, &[control | index as u8, frame[index]]);
        }
        assert_eq!(frame[1..3], [0x11, 0xFA]);
        assert_eq!(knx.stats().telegrams_sent, 1);
    }

    #[test]
    fn test_coupler_requests() {
        let mut knx = component(&[]);
        let mut uart = MockUart::new();

        uart.feed(&SWITCH_ON_1_2_3[..4]);
        knx.poll(&mut uart, 0);
        knx.reset_coupler(&mut uart).unwrap();
        assert_eq!(knx.state(), ReaderState::Idle);
        knx.request_state(&mut uart).unwrap();
        assert_eq!(uart.written(), &[0x01, 0x02]);
    }

    #[test]
    fn test_write_failure_is_counted() {
        let mut knx = component(&[]);
        let mut uart = MockUart::new();
        uart.set_fail_writes(true);

        assert!(knx.group_read(&mut uart, GroupAddress::new(1, 2, 3).unwrap()).is_err());
        assert_eq!(knx.stats().telegrams_sent, 0);

        // Failed acknowledge does not stop dispatch
        uart.feed(&SWITCH_ON_1_2_3);
        assert_eq!(knx.poll(&mut uart, 0), PollOutcome::Dispatched);
        assert_eq!(knx.stats().write_errors, 2);
    }
}
