//! DPT 7.xxx - 16-bit unsigned value, big-endian

use crate::dpt::{input, output, DptDecode, DptEncode};
use crate::error::Result;

/// DPT 7.xxx 16-bit unsigned types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dpt7 {
    /// DPT 7.001 - Pulses
    Pulses,
    /// DPT 7.002 - Time period (ms)
    TimePeriodMs,
    /// DPT 7.005 - Time period (s)
    TimePeriodSec,
    /// DPT 7.011 - Length (mm)
    LengthMm,
    /// DPT 7.012 - Current (mA)
    CurrentMa,
    /// DPT 7.013 - Brightness (lux)
    Brightness,
    /// DPT 7.600 - Color temperature (K)
    ColorTemperature,
}

impl Dpt7 {
    /// DPT identifier
    pub const fn identifier(&self) -> &'static str {
        match self {
            Dpt7::Pulses => "7.001",
            Dpt7::TimePeriodMs => "7.002",
            Dpt7::TimePeriodSec => "7.005",
            Dpt7::LengthMm => "7.011",
            Dpt7::CurrentMa => "7.012",
            Dpt7::Brightness => "7.013",
            Dpt7::ColorTemperature => "7.600",
        }
    }

    /// Unit symbol
    pub const fn unit(&self) -> &'static str {
        match self {
            Dpt7::Pulses => "pulses",
            Dpt7::TimePeriodMs => "ms",
            Dpt7::TimePeriodSec => "s",
            Dpt7::LengthMm => "mm",
            Dpt7::CurrentMa => "mA",
            Dpt7::Brightness => "lux",
            Dpt7::ColorTemperature => "K",
        }
    }
}

impl DptEncode<u16> for Dpt7 {
    fn encode(&self, value: u16, buf: &mut [u8]) -> Result<usize> {
        output(buf, 2)?.copy_from_slice(&value.to_be_bytes());
        Ok(2)
    }
}

impl DptDecode<u16> for Dpt7 {
    fn decode(&self, data: &[u8]) -> Result<u16> {
        let bytes = input(data, 2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }
}
