//! DPT 14.xxx - 4-byte IEEE 754 float, big-endian

use crate::dpt::{input, output, DptDecode, DptEncode};
use crate::error::{KnxError, Result};

/// DPT 14.xxx 4-byte float types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dpt14 {
    /// DPT 14.019 - Electric current (A)
    ElectricCurrent,
    /// DPT 14.027 - Electric potential (V)
    ElectricPotential,
    /// DPT 14.033 - Frequency (Hz)
    Frequency,
    /// DPT 14.056 - Power (W)
    Power,
    /// DPT 14.068 - Temperature (°C)
    Temperature,
    /// DPT 14.076 - Volume (m³)
    Volume,
}

impl Dpt14 {
    /// DPT identifier
    pub const fn identifier(&self) -> &'static str {
        match self {
            Dpt14::ElectricCurrent => "14.019",
            Dpt14::ElectricPotential => "14.027",
            Dpt14::Frequency => "14.033",
            Dpt14::Power => "14.056",
            Dpt14::Temperature => "14.068",
            Dpt14::Volume => "14.076",
        }
    }

    /// Unit symbol
    pub const fn unit(&self) -> &'static str {
        match self {
            Dpt14::ElectricCurrent => "A",
            Dpt14::ElectricPotential => "V",
            Dpt14::Frequency => "Hz",
            Dpt14::Power => "W",
            Dpt14::Temperature => "°C",
            Dpt14::Volume => "m³",
        }
    }
}

impl DptEncode<f32> for Dpt14 {
    fn encode(&self, value: f32, buf: &mut [u8]) -> Result<usize> {
        if value.is_nan() {
            return Err(KnxError::dpt_value_out_of_range());
        }
        output(buf, 4)?.copy_from_slice(&value.to_be_bytes());
        Ok(4)
    }
}

impl DptDecode<f32> for Dpt14 {
    fn decode(&self, data: &[u8]) -> Result<f32> {
        let bytes = input(data, 4)?;
        Ok(f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}
