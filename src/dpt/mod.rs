//! KNX Datapoint Types (DPT)
//!
//! Codecs between application values and the data bytes carried by group
//! telegrams. Decoders take the slice returned by
//! [`Telegram::dpt_data`](crate::Telegram::dpt_data); encoders write into a
//! caller buffer and return the number of bytes used.
//!
//! ## Supported DPT Families
//!
//! - **DPT 1.xxx** - Boolean (1 bit): switches, buttons, binary sensors
//! - **DPT 3.xxx** - 3-bit controlled: dimming, blind control
//! - **DPT 5.xxx** - 8-bit unsigned: percentages, angles, counters
//! - **DPT 7.xxx** - 16-bit unsigned: pulses, brightness, color temperature
//! - **DPT 9.xxx** - 2-byte float: temperature, illuminance, pressure
//! - **DPT 10.001** - Time of day
//! - **DPT 11.001** - Date
//! - **DPT 14.xxx** - 4-byte IEEE float: power, energy, electrical values
//! - **DPT 16.xxx** - 14 character string
//!
//! Values of 6 bits or less (DPT 1 and 3) travel in the APCI octet; send them
//! with [`GroupData::Short`](crate::GroupData::Short). Everything else goes in
//! the payload with [`GroupData::Bytes`](crate::GroupData::Bytes).
//!
//! ## Usage
//!
//! ```rust
//! use knx_tpuart::dpt::{Dpt1, Dpt9, DptDecode, DptEncode};
//!
//! let mut buf = [0u8; 2];
//! let len = Dpt1::Switch.encode(true, &mut buf).unwrap();
//! assert_eq!(&buf[..len], &[0x01]);
//!
//! let len = Dpt9::Temperature.encode(21.5, &mut buf).unwrap();
//! assert_eq!(&buf[..len], &[0x0C, 0x33]);
//! let temp: f32 = Dpt9::Temperature.decode(&buf).unwrap();
//! assert!((temp - 21.5).abs() < 0.01);
//! ```

use crate::error::{KnxError, Result};

pub mod dpt1;
pub mod dpt10;
pub mod dpt11;
pub mod dpt14;
pub mod dpt16;
pub mod dpt3;
pub mod dpt5;
pub mod dpt7;
pub mod dpt9;

#[doc(inline)]
pub use dpt1::Dpt1;
#[doc(inline)]
pub use dpt10::{Dpt10, TimeOfDay, Weekday};
#[doc(inline)]
pub use dpt11::{Date, Dpt11};
#[doc(inline)]
pub use dpt14::Dpt14;
#[doc(inline)]
pub use dpt16::{Dpt16, Dpt16String, DPT16_LEN};
#[doc(inline)]
pub use dpt3::{ControlCommand, Dpt3, StepCode};
#[doc(inline)]
pub use dpt5::Dpt5;
#[doc(inline)]
pub use dpt7::Dpt7;
#[doc(inline)]
pub use dpt9::Dpt9;

/// Encode a value into KNX data bytes
pub trait DptEncode<T> {
    /// Write `value` into `buf`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// `BufferTooSmall` if `buf` cannot hold the encoding,
    /// `ValueOutOfRange` if the value is not representable.
    fn encode(&self, value: T, buf: &mut [u8]) -> Result<usize>;
}

/// Decode KNX data bytes into a value
pub trait DptDecode<T> {
    /// Decode from the start of `data`; extra bytes are ignored.
    ///
    /// # Errors
    ///
    /// `InvalidData` if `data` is too short or malformed.
    fn decode(&self, data: &[u8]) -> Result<T>;
}

/// Borrow the first `len` bytes of an output buffer
#[inline]
pub(crate) fn output(buf: &mut [u8], len: usize) -> Result<&mut [u8]> {
    buf.get_mut(..len).ok_or_else(KnxError::buffer_too_small)
}

/// Borrow the first `len` bytes of input data
#[inline]
pub(crate) fn input(data: &[u8], len: usize) -> Result<&[u8]> {
    data.get(..len).ok_or_else(KnxError::invalid_dpt_data)
}
