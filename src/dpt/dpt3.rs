//! DPT 3.xxx - 3-bit controlled (4 bits)
//!
//! ```text
//! bit  3     2..0
//!    [ C ][ stepcode ]
//! ```
//!
//! `C` is the direction (increase / down when set). A stepcode of 0 is a
//! break; otherwise the range is split into `2^(stepcode-1)` intervals.

use crate::dpt::{input, output, DptDecode, DptEncode};
use crate::error::{KnxError, Result};

/// DPT 3.xxx types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dpt3 {
    /// DPT 3.007 - Dimming control
    Dimming,
    /// DPT 3.008 - Blind control
    Blind,
}

/// Step size
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StepCode {
    /// Stop the running movement
    Break = 0,
    /// 1 interval (100%)
    Intervals1 = 1,
    /// 2 intervals (50%)
    Intervals2 = 2,
    /// 4 intervals (25%)
    Intervals4 = 3,
    /// 8 intervals
    Intervals8 = 4,
    /// 16 intervals
    Intervals16 = 5,
    /// 32 intervals
    Intervals32 = 6,
    /// 64 intervals
    Intervals64 = 7,
}

impl StepCode {
    /// Parse the low three bits
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => StepCode::Break,
            1 => StepCode::Intervals1,
            2 => StepCode::Intervals2,
            3 => StepCode::Intervals4,
            4 => StepCode::Intervals8,
            5 => StepCode::Intervals16,
            6 => StepCode::Intervals32,
            _ => StepCode::Intervals64,
        }
    }

    /// Parse a stepcode number.
    ///
    /// # Errors
    ///
    /// `ValueOutOfRange` for values above 7.
    pub fn from_u8(value: u8) -> Result<Self> {
        if value > 7 {
            return Err(KnxError::dpt_value_out_of_range());
        }
        Ok(Self::from_bits(value))
    }

    /// Number of intervals, 0 for a break
    pub const fn intervals(self) -> u8 {
        match self {
            StepCode::Break => 0,
            other => 1 << (other as u8 - 1),
        }
    }
}

/// Decoded DPT 3 value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlCommand {
    /// Direction bit: increase for dimming, down for blinds
    pub control: bool,
    /// Step size
    pub stepcode: StepCode,
}

impl ControlCommand {
    /// Build a command
    pub const fn new(control: bool, stepcode: StepCode) -> Self {
        Self { control, stepcode }
    }

    /// Stop command
    pub const fn stop() -> Self {
        Self::new(false, StepCode::Break)
    }

    /// Short data value for the APCI octet
    pub const fn to_short(self) -> u8 {
        ((self.control as u8) << 3) | self.stepcode as u8
    }

    /// Check if this stops the movement
    pub const fn is_break(self) -> bool {
        matches!(self.stepcode, StepCode::Break)
    }
}

impl Dpt3 {
    /// DPT identifier
    pub const fn identifier(&self) -> &'static str {
        match self {
            Dpt3::Dimming => "3.007",
            Dpt3::Blind => "3.008",
        }
    }

    /// Labels for the direction bit `(clear, set)`
    pub const fn control_labels(&self) -> (&'static str, &'static str) {
        match self {
            Dpt3::Dimming => ("decrease", "increase"),
            Dpt3::Blind => ("up", "down"),
        }
    }
}

impl DptEncode<ControlCommand> for Dpt3 {
    fn encode(&self, value: ControlCommand, buf: &mut [u8]) -> Result<usize> {
        output(buf, 1)?[0] = value.to_short();
        Ok(1)
    }
}

impl DptDecode<ControlCommand> for Dpt3 {
    fn decode(&self, data: &[u8]) -> Result<ControlCommand> {
        let byte = input(data, 1)?[0];
        Ok(ControlCommand::new(byte & 0x08 != 0, StepCode::from_bits(byte)))
    }
}
