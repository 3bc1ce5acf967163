//! DPT 11.001 - Date (3 bytes)
//!
//! ```text
//! byte 0: 000D DDDD   day 1-31
//! byte 1: 0000 MMMM   month 1-12
//! byte 2: 0YYY YYYY   year 0-99; below 90 means 20xx, otherwise 19xx
//! ```

use crate::dpt::{input, output, DptDecode, DptEncode};
use crate::error::{KnxError, Result};

const FIRST_YEAR: u16 = 1990;
const LAST_YEAR: u16 = 2089;

/// Calendar date between 1990 and 2089
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Date {
    /// Full year
    pub year: u16,
    /// Month 1-12
    pub month: u8,
    /// Day 1-31
    pub day: u8,
}

impl Date {
    /// Build a date, checking the field ranges.
    ///
    /// Day validity is not checked against the month length.
    ///
    /// # Errors
    ///
    /// `ValueOutOfRange` if a field exceeds its range.
    pub fn new(year: u16, month: u8, day: u8) -> Result<Self> {
        if !(FIRST_YEAR..=LAST_YEAR).contains(&year)
            || !(1..=12).contains(&month)
            || !(1..=31).contains(&day)
        {
            return Err(KnxError::dpt_value_out_of_range());
        }
        Ok(Self { year, month, day })
    }
}

/// DPT 11.001
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dpt11;

impl Dpt11 {
    /// DPT identifier
    pub const fn identifier(&self) -> &'static str {
        "11.001"
    }
}

impl DptEncode<Date> for Dpt11 {
    fn encode(&self, value: Date, buf: &mut [u8]) -> Result<usize> {
        let date = Date::new(value.year, value.month, value.day)?;
        output(buf, 3)?.copy_from_slice(&[date.day, date.month, (date.year % 100) as u8]);
        Ok(3)
    }
}

impl DptDecode<Date> for Dpt11 {
    fn decode(&self, data: &[u8]) -> Result<Date> {
        let bytes = input(data, 3)?;
        let short_year = u16::from(bytes[2] & 0x7F);
        if short_year > 99 {
            return Err(KnxError::invalid_dpt_data());
        }
        let year = if short_year < 90 { 2000 + short_year } else { 1900 + short_year };

        Date::new(year, bytes[1] & 0x0F, bytes[0] & 0x1F).map_err(|_| KnxError::invalid_dpt_data())
    }
}
