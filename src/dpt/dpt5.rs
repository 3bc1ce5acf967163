//! DPT 5.xxx - 8-bit unsigned value
//!
//! Percentage and angle subtypes scale their range onto 0..=255 with
//! rounding; the others map the byte directly.

use crate::dpt::{input, output, DptDecode, DptEncode};
use crate::error::{KnxError, Result};

/// DPT 5.xxx 8-bit unsigned types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dpt5 {
    /// DPT 5.001 - Percentage (0-100%)
    Percentage,
    /// DPT 5.003 - Angle (0-360°)
    Angle,
    /// DPT 5.004 - Percentage 0-255
    PercentU8,
    /// DPT 5.006 - Tariff (0-254)
    Tariff,
    /// DPT 5.010 - Counter pulses (0-255)
    Counter,
}

impl Dpt5 {
    /// DPT identifier
    pub const fn identifier(&self) -> &'static str {
        match self {
            Dpt5::Percentage => "5.001",
            Dpt5::Angle => "5.003",
            Dpt5::PercentU8 => "5.004",
            Dpt5::Tariff => "5.006",
            Dpt5::Counter => "5.010",
        }
    }

    /// Unit symbol
    pub const fn unit(&self) -> &'static str {
        match self {
            Dpt5::Percentage => "%",
            Dpt5::Angle => "°",
            Dpt5::Counter => "pulses",
            Dpt5::PercentU8 | Dpt5::Tariff => "",
        }
    }

    /// Largest application value
    pub const fn max(&self) -> u16 {
        match self {
            Dpt5::Percentage => 100,
            Dpt5::Angle => 360,
            Dpt5::Tariff => 254,
            Dpt5::PercentU8 | Dpt5::Counter => 255,
        }
    }

    const fn scale(&self) -> Option<u32> {
        match self {
            Dpt5::Percentage | Dpt5::Angle => Some(self.max() as u32),
            _ => None,
        }
    }
}

impl DptEncode<u16> for Dpt5 {
    fn encode(&self, value: u16, buf: &mut [u8]) -> Result<usize> {
        if value > self.max() {
            return Err(KnxError::dpt_value_out_of_range());
        }
        let raw = match self.scale() {
            Some(full) => ((u32::from(value) * 255 + full / 2) / full) as u8,
            None => value as u8,
        };
        output(buf, 1)?[0] = raw;
        Ok(1)
    }
}

impl DptDecode<u16> for Dpt5 {
    fn decode(&self, data: &[u8]) -> Result<u16> {
        let raw = input(data, 1)?[0];
        let value = match self.scale() {
            Some(full) => ((u32::from(raw) * full + 127) / 255) as u16,
            None => u16::from(raw),
        };
        if value > self.max() {
            return Err(KnxError::invalid_dpt_data());
        }
        Ok(value)
    }
}
