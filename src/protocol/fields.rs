//! Bit-level fields of a TP1 standard data frame.
//!
//! ```text
//! ┌─────────┬────────┬────────┬──────┬─────────────────────┬───────┐
//! │ Control │ Source │ Dest   │ NPCI │ TPDU (length + 1)   │ Check │
//! │ 1 byte  │ 2 bytes│ 2 bytes│ 1    │ TPCI, APCI, data... │ 1     │
//! └─────────┴────────┴────────┴──────┴─────────────────────┴───────┘
//! ```

use crate::protocol::constants::Priority;

/// Control field of a TP1 frame
///
/// ```text
/// Bit 7-6: Frame type (10 = standard data frame)
/// Bit 5: Repeat (0 = repeated, 1 = first transmission)
/// Bit 4: Always 1
/// Bit 3-2: Priority (00=system, 01=normal, 10=urgent, 11=low)
/// Bit 1-0: Always 0
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlField {
    raw: u8,
}

impl From<u8> for ControlField {
    #[inline(always)]
    fn from(raw: u8) -> Self {
        Self { raw }
    }
}

impl From<ControlField> for u8 {
    #[inline(always)]
    fn from(ctrl: ControlField) -> u8 {
        ctrl.raw
    }
}

impl ControlField {
    /// Create a standard data frame control field
    pub const fn new(priority: Priority, repeated: bool) -> Self {
        let mut raw = 0b1001_0000 | (priority.to_u8() << 2);
        if !repeated {
            raw |= 0x20;
        }
        Self { raw }
    }

    /// Get raw byte value
    #[inline(always)]
    pub const fn raw(self) -> u8 {
        self.raw
    }

    /// Check if this is a standard data frame
    #[inline(always)]
    pub const fn is_standard_frame(self) -> bool {
        crate::protocol::constants::is_standard_frame_start(self.raw)
    }

    /// Check if the frame is a repetition of an earlier transmission
    #[inline(always)]
    pub const fn is_repeated(self) -> bool {
        (self.raw & 0x20) == 0
    }

    /// Get priority
    #[inline(always)]
    pub const fn priority(self) -> Priority {
        Priority::from_u8((self.raw >> 2) & 0x03)
    }
}

impl Default for ControlField {
    #[inline]
    fn default() -> Self {
        // Standard frame, not repeated, low priority
        Self { raw: 0xBC }
    }
}

/// Network protocol control information (frame byte 5)
///
/// ```text
/// Bit 7: Destination address type (0=individual, 1=group)
/// Bit 6-4: Hop count (0-7)
/// Bit 3-0: Length of the TPDU minus one
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Npci {
    raw: u8,
}

impl From<u8> for Npci {
    #[inline(always)]
    fn from(raw: u8) -> Self {
        Self { raw }
    }
}

impl Npci {
    /// Create an NPCI octet
    pub const fn new(is_group: bool, hop_count: u8, length: u8) -> Self {
        let mut raw = ((hop_count & 0x07) << 4) | (length & 0x0F);
        if is_group {
            raw |= 0x80;
        }
        Self { raw }
    }

    /// Get raw byte value
    #[inline(always)]
    pub const fn raw(self) -> u8 {
        self.raw
    }

    /// Check if destination is group address (true) or individual (false)
    #[inline(always)]
    pub const fn is_group_address(self) -> bool {
        (self.raw & 0x80) != 0
    }

    /// Get hop count (0-7)
    #[inline(always)]
    pub const fn hop_count(self) -> u8 {
        (self.raw >> 4) & 0x07
    }

    /// Get the length field (0-15)
    #[inline(always)]
    pub const fn length(self) -> u8 {
        self.raw & 0x0F
    }
}

/// TPCI (Transport Layer Protocol Control Information)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tpci {
    /// Unnumbered Data Packet (UDP), used by group communication
    UnnumberedData,
    /// Numbered Data Packet (NDP) with sequence number
    NumberedData {
        /// Sequence number (0-15)
        sequence: u8,
    },
    /// Unnumbered Control Packet (UCP), connect / disconnect
    UnnumberedControl {
        /// Control code (0 = connect, 1 = disconnect)
        control: u8,
    },
    /// Numbered Control Packet (NCP), ack / nak
    NumberedControl {
        /// Sequence number (0-15)
        sequence: u8,
        /// Control code (2 = ack, 3 = nak)
        control: u8,
    },
}

impl Tpci {
    /// Parse TPCI from the first TPDU byte
    pub const fn from_byte(byte: u8) -> Self {
        let sequence = (byte >> 2) & 0x0F;
        let control = byte & 0x03;
        match byte >> 6 {
            0b00 => Self::UnnumberedData,
            0b01 => Self::NumberedData { sequence },
            0b10 => Self::UnnumberedControl { control },
            _ => Self::NumberedControl { sequence, control },
        }
    }

    /// Encode the TPCI bits of the first TPDU byte.
    ///
    /// For data packets the two low bits belong to the APCI and are left
    /// clear.
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::UnnumberedData => 0x00,
            Self::NumberedData { sequence } => 0x40 | ((sequence & 0x0F) << 2),
            Self::UnnumberedControl { control } => 0x80 | (control & 0x03),
            Self::NumberedControl { sequence, control } => {
                0xC0 | ((sequence & 0x0F) << 2) | (control & 0x03)
            }
        }
    }

    /// Check if this is a data packet
    pub const fn is_data(self) -> bool {
        matches!(self, Self::UnnumberedData | Self::NumberedData { .. })
    }
}

/// APCI (Application Layer Protocol Control Information)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Apci {
    /// Group Value Read (`A_GroupValue_Read`)
    GroupValueRead,
    /// Group Value Response (`A_GroupValue_Response`)
    GroupValueResponse,
    /// Group Value Write (`A_GroupValue_Write`)
    GroupValueWrite,
    /// Individual Address Write
    IndividualAddressWrite,
    /// Individual Address Read
    IndividualAddressRead,
    /// Individual Address Response
    IndividualAddressResponse,
    /// ADC Read
    AdcRead,
    /// ADC Response
    AdcResponse,
    /// Memory Read
    MemoryRead,
    /// Memory Response
    MemoryResponse,
    /// Memory Write
    MemoryWrite,
    /// Device Descriptor Read
    DeviceDescriptorRead,
    /// Device Descriptor Response
    DeviceDescriptorResponse,
    /// Any other 4-bit APCI code
    Unknown(u16),
}

impl Apci {
    /// Parse APCI from the first two TPDU bytes
    ///
    /// The 4-bit APCI code spans both bytes:
    /// - byte1 (TPCI byte): bits 1-0 contain APCI bits 9-8
    /// - byte2 (APCI byte): bits 7-6 contain APCI bits 7-6
    ///
    /// Bits 5-0 of byte2 carry the short data and are ignored here.
    pub const fn from_bytes(byte1: u8, byte2: u8) -> Self {
        let apci = ((byte1 as u16 & 0x03) << 8) | (byte2 as u16 & 0xC0);

        match apci {
            0x000 => Self::GroupValueRead,
            0x040 => Self::GroupValueResponse,
            0x080 => Self::GroupValueWrite,
            0x0C0 => Self::IndividualAddressWrite,
            0x100 => Self::IndividualAddressRead,
            0x140 => Self::IndividualAddressResponse,
            0x180 => Self::AdcRead,
            0x1C0 => Self::AdcResponse,
            0x200 => Self::MemoryRead,
            0x240 => Self::MemoryResponse,
            0x280 => Self::MemoryWrite,
            0x300 => Self::DeviceDescriptorRead,
            0x340 => Self::DeviceDescriptorResponse,
            _ => Self::Unknown(apci),
        }
    }

    /// Convert APCI to its 10-bit value (short data bits clear)
    pub const fn to_u16(self) -> u16 {
        match self {
            Self::GroupValueRead => 0x000,
            Self::GroupValueResponse => 0x040,
            Self::GroupValueWrite => 0x080,
            Self::IndividualAddressWrite => 0x0C0,
            Self::IndividualAddressRead => 0x100,
            Self::IndividualAddressResponse => 0x140,
            Self::AdcRead => 0x180,
            Self::AdcResponse => 0x1C0,
            Self::MemoryRead => 0x200,
            Self::MemoryResponse => 0x240,
            Self::MemoryWrite => 0x280,
            Self::DeviceDescriptorRead => 0x300,
            Self::DeviceDescriptorResponse => 0x340,
            Self::Unknown(val) => val & 0x3C0,
        }
    }

    /// Bits contributed to the TPCI byte
    #[inline(always)]
    pub const fn high_bits(self) -> u8 {
        ((self.to_u16() >> 8) & 0x03) as u8
    }

    /// Bits contributed to the APCI byte
    #[inline(always)]
    pub const fn low_bits(self) -> u8 {
        (self.to_u16() & 0xC0) as u8
    }

    /// Check if this is one of the three group value services
    pub const fn is_group_value(self) -> bool {
        matches!(
            self,
            Self::GroupValueRead | Self::GroupValueResponse | Self::GroupValueWrite
        )
    }
}

/// Extract the 6-bit short data carried in the APCI byte
pub const fn extract_6bit_value(apci_byte: u8) -> u8 {
    apci_byte & 0x3F
}
