//! End-to-end tests for the TP-UART receive path.
//!
//! Bytes are fed into a `MockUart` the way the coupler would deliver them and
//! the dispatch component is polled with a manual clock.

use knx_tpuart::dpt::{Dpt1, Dpt9, DptDecode, DptEncode};
use knx_tpuart::protocol::{checksum, decode, DataRequest, RawFrame, ReaderState};
use knx_tpuart::uart::MockUart;
use knx_tpuart::{
    ComponentConfig, DispatchComponent, GroupAddress, GroupData, IndividualAddress, ManualClock,
    PollOutcome, Telegram, TelegramBuilder,
};

/// Capacity of the collected-telegram buffer used by handlers
const SEEN: usize = 8;

fn ga(main: u8, middle: u8, sub: u8) -> GroupAddress {
    GroupAddress::new(main, middle, sub).unwrap()
}

fn config(listen: &[&str]) -> ComponentConfig {
    listen
        .iter()
        .fold(ComponentConfig::new("1.1.250").unwrap(), |config, address| {
            config.with_listen_group_address(address).unwrap()
        })
}

/// Encode a switch telegram from 1.1.1 to `target`
fn switch_frame(target: GroupAddress, on: bool) -> ([u8; 23], usize) {
    let source = IndividualAddress::new(1, 1, 1).unwrap();
    let telegram = TelegramBuilder::group_write(source, target, GroupData::Short(Dpt1::to_short(on)))
        .build()
        .unwrap();
    let mut frame = [0u8; 23];
    let len = telegram.encode(&mut frame).unwrap();
    (frame, len)
}

#[test]
fn test_listened_group_dispatches_once() {
    let mut seen: Vec<Telegram> = Vec::new();
    let mut knx = DispatchComponent::from_config(&config(&["1/2/3"]))
        .unwrap()
        .with_handler(|t: Telegram| seen.push(t));
    let mut uart = MockUart::new();

    let (frame, len) = switch_frame(ga(1, 2, 3), true);
    uart.feed(&frame[..len]);

    assert_eq!(knx.poll(&mut uart, 10), PollOutcome::Dispatched);
    assert_eq!(knx.poll(&mut uart, 11), PollOutcome::NoFrame);
    drop(knx);

    assert_eq!(seen.len(), 1);
    let telegram = &seen[0];
    assert_eq!(telegram.destination_group(), Some(ga(1, 2, 3)));
    assert_eq!(telegram.source(), IndividualAddress::new(1, 1, 1).unwrap());
    assert!(Dpt1::Switch.decode(telegram.dpt_data()).unwrap());
}

#[test]
fn test_unlisted_group_is_filtered() {
    let mut calls = 0u32;
    let mut knx = DispatchComponent::from_config(&config(&["1/2/3"]))
        .unwrap()
        .with_handler(|_: Telegram| calls += 1);
    let mut uart = MockUart::new();

    let (frame, len) = switch_frame(ga(4, 5, 6), true);
    uart.feed(&frame[..len]);

    assert_eq!(knx.poll(&mut uart, 0), PollOutcome::Filtered);
    assert_eq!(knx.stats().filtered_out, 1);
    // Not-addressed acknowledge
    assert_eq!(uart.written(), &[0x10]);
    drop(knx);
    assert_eq!(calls, 0);
}

#[test]
fn test_empty_listen_set_accepts_everything() {
    let mut knx = DispatchComponent::from_config(&config(&[])).unwrap();
    let mut uart = MockUart::new();

    for target in [ga(0, 0, 1), ga(31, 7, 255), ga(4, 5, 6)] {
        let (frame, len) = switch_frame(target, false);
        uart.feed(&frame[..len]);
        assert_eq!(knx.poll(&mut uart, 0), PollOutcome::Dispatched);
    }
    assert_eq!(knx.stats().dispatched, 3);
}

#[test]
fn test_partial_frame_times_out() {
    let clock = ManualClock::new(5_000);
    let mut calls = 0u32;
    let mut knx = DispatchComponent::from_config(&config(&[]))
        .unwrap()
        .with_handler(|_: Telegram| calls += 1);
    let mut uart = MockUart::new();

    let (frame, len) = switch_frame(ga(1, 2, 3), true);
    uart.feed(&frame[..3]);
    assert_eq!(knx.poll_with_clock(&mut uart, &clock), PollOutcome::NoFrame);
    assert_eq!(knx.state(), ReaderState::Assembling);

    // Exactly at the timeout the frame is still alive
    clock.advance(1_000);
    assert_eq!(knx.poll_with_clock(&mut uart, &clock), PollOutcome::NoFrame);

    clock.advance(1);
    assert_eq!(knx.poll_with_clock(&mut uart, &clock), PollOutcome::TimedOut);
    assert_eq!(knx.state(), ReaderState::Idle);
    assert_eq!(knx.stats().timeouts, 1);

    // The stale prefix is not joined to the next frame
    uart.feed(&frame[..len]);
    assert_eq!(knx.poll_with_clock(&mut uart, &clock), PollOutcome::Dispatched);
    drop(knx);
    assert_eq!(calls, 1);
}

#[test]
fn test_late_poll_dispatches_queued_remainder() {
    let clock = ManualClock::new(0);
    let mut knx = DispatchComponent::from_config(&config(&["1/2/3"])).unwrap();
    let mut uart = MockUart::new();

    // Destination byte 0x03 would read as a reset indication if dropped
    let (frame, len) = switch_frame(ga(1, 2, 3), true);
    assert_eq!(frame[4], 0x03);
    uart.feed(&frame[..3]);
    assert_eq!(knx.poll_with_clock(&mut uart, &clock), PollOutcome::NoFrame);

    uart.feed(&frame[3..len]);
    clock.advance(1_500);
    assert_eq!(knx.poll_with_clock(&mut uart, &clock), PollOutcome::Dispatched);
    assert_eq!(knx.poll_with_clock(&mut uart, &clock), PollOutcome::NoFrame);

    let stats = knx.stats();
    assert_eq!(stats.frames_received, 1);
    assert_eq!(stats.timeouts, 0);
    assert_eq!(stats.reset_indications, 0);
}

#[test]
fn test_corrupted_checksum_is_rejected() {
    let mut calls = 0u32;
    let mut knx = DispatchComponent::from_config(&config(&[]))
        .unwrap()
        .with_handler(|_: Telegram| calls += 1);
    let mut uart = MockUart::new();

    let (mut frame, len) = switch_frame(ga(1, 2, 3), true);
    frame[len - 1] ^= 0x01;
    uart.feed(&frame[..len]);

    assert_eq!(knx.poll(&mut uart, 0), PollOutcome::DecodeFailed);
    assert_eq!(knx.stats().checksum_errors, 1);
    assert!(uart.written().is_empty());

    let err = decode(&RawFrame::from_slice(&frame[..len]).unwrap()).unwrap_err();
    assert!(err.is_checksum_mismatch());
    drop(knx);
    assert_eq!(calls, 0);
}

#[test]
fn test_bad_listen_address_fails_configuration() {
    let result = ComponentConfig::new("1.1.250")
        .and_then(|config| config.with_listen_group_address("bad-format"))
        .and_then(|config| DispatchComponent::from_config(&config));
    assert!(result.unwrap_err().is_invalid_address_format());

    let err = DispatchComponent::from_config(&ComponentConfig::new("1.1").unwrap()).unwrap_err();
    assert!(err.is_invalid_address_format());
}

#[test]
fn test_env_text_configuration() {
    let text = "\
        # living room\n\
        USE_ADDRESS=1.1.42\n\
        LISTEN_GROUP_ADDRESS=1/2/3\n\
        LISTEN_GROUP_ADDRESS=2/0/7\n\
        SERIAL_TIMEOUT=250\n";
    let knx = DispatchComponent::from_config(&ComponentConfig::from_env_text(text).unwrap()).unwrap();

    assert_eq!(knx.use_address(), IndividualAddress::new(1, 1, 42).unwrap());
    assert_eq!(knx.serial_timeout_ms(), 250);
    assert_eq!(knx.listen_group_addresses().as_slice(), &[ga(1, 2, 3), ga(2, 0, 7)]);
}

#[test]
fn test_noise_and_indications_between_frames() {
    let mut knx = DispatchComponent::from_config(&config(&["3/1/0"])).unwrap();
    let mut uart = MockUart::new();

    let (frame, len) = switch_frame(ga(3, 1, 0), true);
    uart.feed(&[0x03, 0x8B, 0x55]);
    uart.feed(&frame[..len]);
    uart.feed(&[0x0B]);

    assert_eq!(knx.poll(&mut uart, 0), PollOutcome::Dispatched);
    assert_eq!(knx.poll(&mut uart, 0), PollOutcome::NoFrame);

    let stats = knx.stats();
    assert_eq!(stats.reset_indications, 1);
    assert_eq!(stats.confirms_positive, 1);
    assert_eq!(stats.confirms_negative, 1);
    assert_eq!(stats.dispatched, 1);
}

#[test]
fn test_payload_telegram_end_to_end() {
    let mut seen: heapless::Vec<f32, SEEN> = heapless::Vec::new();
    let mut knx = DispatchComponent::from_config(&config(&["0/0/10"]))
        .unwrap()
        .with_handler(|t: Telegram| {
            seen.push(Dpt9::Temperature.decode(t.dpt_data()).unwrap()).unwrap();
        });

    let mut value = [0u8; 2];
    Dpt9::Temperature.encode(21.5, &mut value).unwrap();
    let source = IndividualAddress::new(1, 1, 7).unwrap();
    let telegram = TelegramBuilder::group_response(source, ga(0, 0, 10), GroupData::Bytes(&value))
        .build()
        .unwrap();
    let mut frame = [0u8; 23];
    let len = telegram.encode(&mut frame).unwrap();
    assert_eq!(frame[len - 1], checksum(&frame[..len - 1]));

    let mut uart = MockUart::new();
    uart.feed(&frame[..len]);
    assert_eq!(knx.poll(&mut uart, 0), PollOutcome::Dispatched);
    drop(knx);

    assert_eq!(seen.len(), 1);
    assert!((seen[0] - 21.5).abs() < 0.01);
}

#[test]
fn test_decode_matches_encoded_fields() {
    let source = IndividualAddress::new(15, 15, 255).unwrap();
    let telegram = TelegramBuilder::group_write(source, ga(31, 7, 255), GroupData::Bytes(&[1, 2, 3, 4]))
        .hop_count(3)
        .build()
        .unwrap();
    let frame = telegram.to_raw_frame().unwrap();

    let decoded = decode(&frame).unwrap();
    assert_eq!(decoded, telegram);
    assert_eq!(decoded.hop_count(), 3);
    assert_eq!(decoded.payload(), &[1, 2, 3, 4]);
}

#[test]
fn test_outgoing_group_write_framing() {
    let mut knx = DispatchComponent::from_config(&config(&[])).unwrap();
    let mut uart = MockUart::new();

    knx.group_write(&mut uart, ga(1, 2, 3), GroupData::Short(1)).unwrap();

    let expected = TelegramBuilder::group_write(
        IndividualAddress::new(1, 1, 250).unwrap(),
        ga(1, 2, 3),
        GroupData::Short(1),
    )
    .build()
    .unwrap()
    .to_raw_frame()
    .unwrap();
    let request = DataRequest::new(&expected).unwrap();
    assert_eq!(uart.written(), request.as_bytes());
}
