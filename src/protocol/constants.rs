//! KNX TP1 frame constants and TP-UART service codes.

/// Header length of a standard TP1 frame (control, source, destination, NPCI)
pub const HEADER_SIZE: usize = 6;

/// Smallest standard frame: header + TPCI + check octet (length field 0)
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + 2;

/// Largest value of the 4-bit length field
pub const MAX_LENGTH_FIELD: u8 = 15;

/// Largest standard frame: header + 16 TPDU bytes + check octet
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_LENGTH_FIELD as usize + 2;

/// Application payload bytes after the TPCI/APCI octets
pub const MAX_PAYLOAD_SIZE: usize = MAX_LENGTH_FIELD as usize - 1;

/// Default serial timeout for abandoning a partial frame
pub const DEFAULT_SERIAL_TIMEOUT_MS: u32 = 1000;

/// Hop count used for telegrams sent by this device
pub const DEFAULT_HOP_COUNT: u8 = 6;

/// Capacity of the listen group address set
pub const MAX_LISTEN_GROUP_ADDRESSES: usize = 16;

// =============================================================================
// TP-UART services
// =============================================================================

/// `U_Reset.request` (host → coupler)
pub const U_RESET_REQUEST: u8 = 0x01;
/// `U_State.request` (host → coupler)
pub const U_STATE_REQUEST: u8 = 0x02;
/// `U_AckInformation` with the addressed flag cleared
pub const U_ACK_NOT_ADDRESSED: u8 = 0x10;
/// `U_AckInformation` with the addressed flag set
pub const U_ACK_ADDRESSED: u8 = 0x11;
/// `U_L_DataStart` / `U_L_DataContinue`, OR-ed with the byte index
pub const U_L_DATA_START_CONTINUE: u8 = 0x80;
/// `U_L_DataEnd`, OR-ed with the index of the check octet
pub const U_L_DATA_END: u8 = 0x40;

/// `U_Reset.indication` (coupler → host)
pub const U_RESET_INDICATION: u8 = 0x03;
/// `L_Data.confirm` positive
pub const L_DATA_CONFIRM_POSITIVE: u8 = 0x8B;
/// `L_Data.confirm` negative
pub const L_DATA_CONFIRM_NEGATIVE: u8 = 0x0B;
/// Mask / value pair identifying `U_State.indication`
pub const U_STATE_INDICATION_MASK: u8 = 0x07;

/// Returns true if `byte` is the control field of a standard data frame.
///
/// Repeat flag and priority bits are ignored.
#[inline(always)]
pub const fn is_standard_frame_start(byte: u8) -> bool {
    (byte | 0b0010_1100) == 0b1011_1100
}

// =============================================================================
// KNX Priority
// =============================================================================

/// KNX message priority levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Priority {
    /// System priority
    System = 0b00,
    /// Normal priority
    Normal = 0b01,
    /// Urgent (alarm) priority
    Urgent = 0b10,
    /// Low priority (default for group communication)
    Low = 0b11,
}

impl Priority {
    /// Convert the two priority bits to Priority
    pub const fn from_u8(value: u8) -> Self {
        match value & 0b11 {
            0b00 => Self::System,
            0b01 => Self::Normal,
            0b10 => Self::Urgent,
            _ => Self::Low,
        }
    }

    /// Convert Priority to its two-bit encoding
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Low
    }
}
