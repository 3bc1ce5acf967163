//! DPT 10.001 - Time of day (3 bytes)
//!
//! ```text
//! byte 0: DDDH HHHH   weekday (0 = none, 1 = Monday), hour 0-23
//! byte 1: 00MM MMMM   minutes 0-59
//! byte 2: 00SS SSSS   seconds 0-59
//! ```

use crate::dpt::{input, output, DptDecode, DptEncode};
use crate::error::{KnxError, Result};

/// Day of week, `None` when the sender did not set one
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Weekday {
    /// No day
    #[default]
    None = 0,
    /// Monday
    Monday = 1,
    /// Tuesday
    Tuesday = 2,
    /// Wednesday
    Wednesday = 3,
    /// Thursday
    Thursday = 4,
    /// Friday
    Friday = 5,
    /// Saturday
    Saturday = 6,
    /// Sunday
    Sunday = 7,
}

impl Weekday {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            1 => Weekday::Monday,
            2 => Weekday::Tuesday,
            3 => Weekday::Wednesday,
            4 => Weekday::Thursday,
            5 => Weekday::Friday,
            6 => Weekday::Saturday,
            7 => Weekday::Sunday,
            _ => Weekday::None,
        }
    }
}

/// Time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeOfDay {
    /// Day of week
    pub weekday: Weekday,
    /// Hour 0-23
    pub hour: u8,
    /// Minute 0-59
    pub minute: u8,
    /// Second 0-59
    pub second: u8,
}

impl TimeOfDay {
    /// Build a time, checking the field ranges.
    ///
    /// # Errors
    ///
    /// `ValueOutOfRange` if a field exceeds its range.
    pub fn new(weekday: Weekday, hour: u8, minute: u8, second: u8) -> Result<Self> {
        if hour > 23 || minute > 59 || second > 59 {
            return Err(KnxError::dpt_value_out_of_range());
        }
        Ok(Self {
            weekday,
            hour,
            minute,
            second,
        })
    }
}

/// DPT 10.001
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dpt10;

impl Dpt10 {
    /// DPT identifier
    pub const fn identifier(&self) -> &'static str {
        "10.001"
    }
}

impl DptEncode<TimeOfDay> for Dpt10 {
    fn encode(&self, value: TimeOfDay, buf: &mut [u8]) -> Result<usize> {
        // Fields are public, so re-check them
        let time = TimeOfDay::new(value.weekday, value.hour, value.minute, value.second)?;
        output(buf, 3)?.copy_from_slice(&[
            ((time.weekday as u8) << 5) | time.hour,
            time.minute,
            time.second,
        ]);
        Ok(3)
    }
}

impl DptDecode<TimeOfDay> for Dpt10 {
    fn decode(&self, data: &[u8]) -> Result<TimeOfDay> {
        let bytes = input(data, 3)?;
        TimeOfDay::new(
            Weekday::from_bits(bytes[0] >> 5),
            bytes[0] & 0x1F,
            bytes[1] & 0x3F,
            bytes[2] & 0x3F,
        )
        .map_err(|_| KnxError::invalid_dpt_data())
    }
}
