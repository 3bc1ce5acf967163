//! KNX TP1 / TP-UART protocol implementation.
//!
//! This module contains the frame reassembly, telegram decoding, address
//! filtering and host service encoding used by the dispatch component.

pub mod constants;
pub mod fields;
pub mod filter;
pub mod reader;
pub mod services;
pub mod telegram;

pub use constants::Priority;
pub use fields::{Apci, ControlField, Npci, Tpci};
pub use filter::{accepts, GroupAddressSet};
pub use reader::{CouplerState, FrameReader, RawFrame, ReaderState, ServiceIndication};
pub use services::{DataRequest, TpUartRequest};
pub use telegram::{checksum, decode, Destination, GroupData, Telegram, TelegramBuilder};
