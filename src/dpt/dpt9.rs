//! DPT 9.xxx - 2-byte float
//!
//! ```text
//! MEEE EMMM MMMM MMMM
//! value = 0.01 * M * 2^E
//! ```
//!
//! `M` is a 12-bit two's complement mantissa whose sign is bit 15, `E` an
//! unsigned 4-bit exponent. The representable range is -671 088.64 to
//! 670 760.96. `0x7FFF` is reserved for invalid data.

use crate::dpt::{input, output, DptDecode, DptEncode};
use crate::error::{KnxError, Result};

const INVALID_DATA: u16 = 0x7FFF;
const MANTISSA_MIN: f32 = -2048.0;
const MANTISSA_MAX: f32 = 2047.0;

/// DPT 9.xxx 2-byte float types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dpt9 {
    /// DPT 9.001 - Temperature (°C)
    Temperature,
    /// DPT 9.002 - Temperature difference (K)
    TemperatureDifference,
    /// DPT 9.004 - Illuminance (lux)
    Illuminance,
    /// DPT 9.005 - Wind speed (m/s)
    WindSpeed,
    /// DPT 9.006 - Pressure (Pa)
    Pressure,
    /// DPT 9.007 - Humidity (%)
    Humidity,
    /// DPT 9.008 - Air quality (ppm)
    AirQuality,
    /// DPT 9.020 - Voltage (mV)
    Voltage,
    /// DPT 9.024 - Power (kW)
    Power,
}

impl Dpt9 {
    /// DPT identifier
    pub const fn identifier(&self) -> &'static str {
        match self {
            Dpt9::Temperature => "9.001",
            Dpt9::TemperatureDifference => "9.002",
            Dpt9::Illuminance => "9.004",
            Dpt9::WindSpeed => "9.005",
            Dpt9::Pressure => "9.006",
            Dpt9::Humidity => "9.007",
            Dpt9::AirQuality => "9.008",
            Dpt9::Voltage => "9.020",
            Dpt9::Power => "9.024",
        }
    }

    /// Unit symbol
    pub const fn unit(&self) -> &'static str {
        match self {
            Dpt9::Temperature => "°C",
            Dpt9::TemperatureDifference => "K",
            Dpt9::Illuminance => "lux",
            Dpt9::WindSpeed => "m/s",
            Dpt9::Pressure => "Pa",
            Dpt9::Humidity => "%",
            Dpt9::AirQuality => "ppm",
            Dpt9::Voltage => "mV",
            Dpt9::Power => "kW",
        }
    }
}

// Round half away from zero; f32::round is not in core
#[inline]
fn round(value: f32) -> f32 {
    if value >= 0.0 {
        ((value + 0.5) as i32) as f32
    } else {
        ((value - 0.5) as i32) as f32
    }
}

impl DptEncode<f32> for Dpt9 {
    fn encode(&self, value: f32, buf: &mut [u8]) -> Result<usize> {
        if !value.is_finite() {
            return Err(KnxError::dpt_value_out_of_range());
        }

        let mut exponent = 0u16;
        let mut mantissa = round(value * 100.0);
        while !(MANTISSA_MIN..=MANTISSA_MAX).contains(&mantissa) {
            if exponent == 15 {
                return Err(KnxError::dpt_value_out_of_range());
            }
            exponent += 1;
            mantissa = round(value * 100.0 / (1u32 << exponent) as f32);
        }

        let mantissa = mantissa as i16;
        let sign = u16::from(mantissa < 0) << 15;
        let bits = sign | (exponent << 11) | (mantissa as u16 & 0x07FF);
        if bits == INVALID_DATA {
            return Err(KnxError::dpt_value_out_of_range());
        }

        output(buf, 2)?.copy_from_slice(&bits.to_be_bytes());
        Ok(2)
    }
}

impl DptDecode<f32> for Dpt9 {
    fn decode(&self, data: &[u8]) -> Result<f32> {
        let bytes = input(data, 2)?;
        let bits = u16::from_be_bytes([bytes[0], bytes[1]]);
        if bits == INVALID_DATA {
            return Err(KnxError::invalid_dpt_data());
        }

        let exponent = (bits >> 11) & 0x0F;
        let mut mantissa = i32::from(bits & 0x07FF);
        if bits & 0x8000 != 0 {
            mantissa -= 2048;
        }

        Ok(0.01 * (mantissa << exponent) as f32)
    }
}
