//! UART access for the TP-UART coupler.
//!
//! The driver never owns the serial port. Every operation borrows a
//! [`UartPort`] for the duration of the call, so the same port can be shared
//! with other code between polls.

pub mod mock_port;
pub mod port;

#[cfg(feature = "embassy")]
pub mod embassy_adapter;

pub use mock_port::MockUart;
pub use port::UartPort;

#[cfg(feature = "embassy")]
pub use embassy_adapter::ChannelUart;
