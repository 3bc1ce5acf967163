#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![doc = include_str!("../README.md")]

//! # knx-tpuart
//!
//! KNX TP1 receive path and group services over a TP-UART transceiver.
//!
//! ## Layers
//!
//! - [`protocol::FrameReader`] reassembles frames from UART bytes
//! - [`protocol::decode`] validates and parses them into [`Telegram`]s
//! - [`protocol::accepts`] filters them against the listen set
//! - [`DispatchComponent`] runs the poll loop and calls the application
//!
//! The crate is `no_std` and allocation free. All buffers are `heapless`.

// Macro modules (must be declared before use)
#[macro_use]
pub mod logging;

pub mod addressing;
pub mod clock;
pub mod component;
pub mod config;
pub mod dpt;
pub mod error;
pub mod protocol;
pub mod uart;

#[doc(inline)]
pub use addressing::{GroupAddress, IndividualAddress};
#[doc(inline)]
pub use clock::{Clock, ManualClock};
#[doc(inline)]
pub use component::{DispatchComponent, PollOutcome, Stats, TelegramHandler};
#[doc(inline)]
pub use config::{ComponentConfig, ValidatedConfig};
#[doc(inline)]
pub use dpt::{DptDecode, DptEncode};
#[doc(inline)]
pub use error::{KnxError, Result};
#[doc(inline)]
pub use protocol::{Destination, GroupData, Priority, Telegram, TelegramBuilder};
#[doc(inline)]
pub use uart::UartPort;
