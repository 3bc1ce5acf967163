//! DPT 16.xxx - Character string (14 bytes)
//!
//! Shorter strings are padded with NUL. 16.000 allows ASCII only, 16.001
//! ISO 8859-1, which maps one-to-one onto the first 256 code points.

use crate::dpt::{input, output, DptDecode, DptEncode};
use crate::error::{KnxError, Result};

/// Encoded length
pub const DPT16_LEN: usize = 14;

/// Decoded text; Latin-1 characters above 0x7F take two UTF-8 bytes
pub type Dpt16String = heapless::String<{ 2 * DPT16_LEN }>;

/// DPT 16.xxx string types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dpt16 {
    /// DPT 16.000 - ASCII
    Ascii,
    /// DPT 16.001 - ISO 8859-1
    Latin1,
}

impl Dpt16 {
    /// DPT identifier
    pub const fn identifier(&self) -> &'static str {
        match self {
            Dpt16::Ascii => "16.000",
            Dpt16::Latin1 => "16.001",
        }
    }

    const fn max_char(&self) -> u32 {
        match self {
            Dpt16::Ascii => 0x7F,
            Dpt16::Latin1 => 0xFF,
        }
    }
}

impl DptEncode<&str> for Dpt16 {
    fn encode(&self, value: &str, buf: &mut [u8]) -> Result<usize> {
        let out = output(buf, DPT16_LEN)?;
        out.fill(0);

        let mut len = 0;
        for ch in value.chars() {
            let code = u32::from(ch);
            if code > self.max_char() || code == 0 || len == DPT16_LEN {
                return Err(KnxError::dpt_value_out_of_range());
            }
            out[len] = code as u8;
            len += 1;
        }
        Ok(DPT16_LEN)
    }
}

impl DptDecode<Dpt16String> for Dpt16 {
    fn decode(&self, data: &[u8]) -> Result<Dpt16String> {
        let bytes = input(data, DPT16_LEN)?;
        let mut text = Dpt16String::new();
        for &byte in bytes.iter().take_while(|&&b| b != 0) {
            if u32::from(byte) > self.max_char() {
                return Err(KnxError::invalid_dpt_data());
            }
            text.push(char::from(byte))
                .map_err(|_| KnxError::invalid_dpt_data())?;
        }
        Ok(text)
    }
}
