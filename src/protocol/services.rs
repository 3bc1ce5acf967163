//! TP-UART host services.
//!
//! Requests from the host to the coupler are single bytes, except for data
//! transmission: every byte of an outgoing frame is preceded by a control
//! byte carrying its index.
//!
//! ```text
//! Host                            Coupler
//!   |------- U_Reset.req 0x01 ------>|
//!   |<------ U_Reset.ind 0x03 -------|
//!   |                                |
//!   |--- 0x80 b0  0x81 b1 ... ------>|  U_L_DataStart / Continue
//!   |--- 0x40|n  checksum ---------->|  U_L_DataEnd
//!   |<------ L_Data.con 0x8B --------|
//!   |                                |
//!   |<------ frame bytes ... --------|
//!   |------- U_AckInfo 0x11 -------->|  (addressed)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use knx_tpuart::protocol::services::DataRequest;
//!
//! let frame = [0xBC, 0x11, 0x01, 0x0A, 0x03, 0xE1, 0x00, 0x81, 0x3A];
//! let request = DataRequest::new(&frame).unwrap();
//! assert_eq!(&request.as_bytes()[..4], &[0x80, 0xBC, 0x81, 0x11]);
//! assert_eq!(&request.as_bytes()[16..], &[0x48, 0x3A]);
//! ```

use crate::error::{KnxError, Result};
use crate::protocol::constants::{
    MAX_FRAME_SIZE, U_ACK_ADDRESSED, U_ACK_NOT_ADDRESSED, U_L_DATA_END, U_L_DATA_START_CONTINUE,
    U_RESET_REQUEST, U_STATE_REQUEST,
};

/// Largest framed data request: one control byte per frame byte
pub const MAX_DATA_REQUEST_SIZE: usize = 2 * MAX_FRAME_SIZE;

/// Single-byte host requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TpUartRequest {
    /// `U_Reset.request`
    Reset,
    /// `U_State.request`
    State,
    /// `U_AckInformation` for the frame being received
    AckInformation {
        /// The frame was addressed to this device
        addressed: bool,
    },
}

impl TpUartRequest {
    /// Encode the request byte
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::Reset => U_RESET_REQUEST,
            Self::State => U_STATE_REQUEST,
            Self::AckInformation { addressed: true } => U_ACK_ADDRESSED,
            Self::AckInformation { addressed: false } => U_ACK_NOT_ADDRESSED,
        }
    }
}

/// A frame wrapped in `U_L_DataStart` / `Continue` / `End` control bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    bytes: heapless::Vec<u8, MAX_DATA_REQUEST_SIZE>,
}

impl DataRequest {
    /// Frame `frame` for transmission.
    ///
    /// # Errors
    ///
    /// Returns `PayloadTooLarge` for an empty frame or one longer than 23
    /// bytes.
    pub fn new(frame: &[u8]) -> Result<Self> {
        if frame.is_empty() || frame.len() > MAX_FRAME_SIZE {
            return Err(KnxError::payload_too_large());
        }

        let last = frame.len() - 1;
        let mut bytes = heapless::Vec::new();
        for (index, &byte) in frame.iter().enumerate() {
            let control = if index == last {
                U_L_DATA_END | index as u8
            } else {
                U_L_DATA_START_CONTINUE | index as u8
            };
            bytes
                .extend_from_slice(&[control, byte])
                .map_err(|_| KnxError::buffer_too_small())?;
        }

        Ok(Self { bytes })
    }

    /// Bytes to write to the UART
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Write the request into `buf`, returning its length
    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        let len = self.bytes.len();
        buf.get_mut(..len)
            .ok_or_else(KnxError::buffer_too_small)?
            .copy_from_slice(&self.bytes);
        Ok(len)
    }
}
