//! KNX telegram decoding and encoding.
//!
//! A [`Telegram`] is the decoded form of one TP1 standard data frame. Decoding
//! validates the length field, the check octet and the control field, then
//! copies the payload inline so the telegram owns all of its data.
//!
//! ## Example
//!
//! ```rust
//! use knx_tpuart::protocol::telegram::{GroupData, Telegram, TelegramBuilder};
//! use knx_tpuart::{GroupAddress, IndividualAddress};
//!
//! let source = IndividualAddress::new(1, 1, 1).unwrap();
//! let target = GroupAddress::new(1, 2, 3).unwrap();
//! let telegram = TelegramBuilder::group_write(source, target, GroupData::Short(1))
//!     .build()
//!     .unwrap();
//!
//! let mut frame = [0u8; 23];
//! let len = telegram.encode(&mut frame).unwrap();
//! assert_eq!(&frame[..len], &[0xBC, 0x11, 0x01, 0x0A, 0x03, 0xE1, 0x00, 0x81, 0x3A]);
//!
//! let decoded = Telegram::decode(&frame[..len]).unwrap();
//! assert_eq!(decoded, telegram);
//! ```

use crate::addressing::{GroupAddress, IndividualAddress};
use crate::error::{KnxError, Result};
use crate::protocol::constants::{
    Priority, DEFAULT_HOP_COUNT, HEADER_SIZE, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE, MIN_FRAME_SIZE,
};
use crate::protocol::fields::{extract_6bit_value, Apci, ControlField, Npci, Tpci};
use crate::protocol::reader::RawFrame;

/// APCI bits carried in the TPCI octet of a data packet
const APCI_HIGH_MASK: u8 = 0x03;

/// Compute the TP1 check octet: `0xFF` XOR every byte.
#[inline]
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0xFF, |acc, byte| acc ^ byte)
}

/// Decode a reassembled frame.
#[inline]
pub fn decode(frame: &RawFrame) -> Result<Telegram> {
    Telegram::decode(frame.as_bytes())
}

/// Destination of a telegram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Destination {
    /// Group (multicast) address
    Group(GroupAddress),
    /// Individual device address
    Individual(IndividualAddress),
}

impl Destination {
    /// Raw 16-bit value as carried on the bus
    pub fn raw(self) -> u16 {
        match self {
            Self::Group(ga) => ga.raw(),
            Self::Individual(ia) => ia.raw(),
        }
    }

    /// Check if this is a group address
    pub const fn is_group(self) -> bool {
        matches!(self, Self::Group(_))
    }
}

impl From<GroupAddress> for Destination {
    fn from(ga: GroupAddress) -> Self {
        Self::Group(ga)
    }
}

impl From<IndividualAddress> for Destination {
    fn from(ia: IndividualAddress) -> Self {
        Self::Individual(ia)
    }
}

/// A decoded KNX telegram.
///
/// Immutable once built. Create one with [`Telegram::decode`] or
/// [`TelegramBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Telegram {
    control: ControlField,
    source: IndividualAddress,
    destination: Destination,
    hop_count: u8,
    // First TPDU octet with the APCI bits cleared
    tpci_octet: u8,
    apci: Option<Apci>,
    short_data: u8,
    payload: heapless::Vec<u8, MAX_PAYLOAD_SIZE>,
    checksum: u8,
}

impl Telegram {
    /// Decode a TP1 standard data frame.
    ///
    /// Only the first `8 + length` bytes are examined; anything after the
    /// check octet is ignored.
    ///
    /// # Errors
    ///
    /// - `TruncatedFrame` if the slice is shorter than 8 bytes or than the
    ///   length field announces
    /// - `ChecksumMismatch` if the check octet does not match
    /// - `InvalidControlField` if the control byte is not a standard data frame
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_FRAME_SIZE {
            return Err(KnxError::truncated_frame());
        }

        let npci = Npci::from(bytes[5]);
        let frame_len = MIN_FRAME_SIZE + usize::from(npci.length());
        let frame = bytes.get(..frame_len).ok_or_else(KnxError::truncated_frame)?;

        let (body, check) = frame.split_at(frame_len - 1);
        let check = check[0];
        if checksum(body) != check {
            return Err(KnxError::checksum_mismatch());
        }

        let control = ControlField::from(body[0]);
        if !control.is_standard_frame() {
            return Err(KnxError::invalid_control_field());
        }

        let source = IndividualAddress::from(u16::from_be_bytes([body[1], body[2]]));
        let destination_raw = u16::from_be_bytes([body[3], body[4]]);
        let destination = if npci.is_group_address() {
            Destination::Group(GroupAddress::from(destination_raw))
        } else {
            Destination::Individual(IndividualAddress::from(destination_raw))
        };

        // TPDU holds length + 1 bytes: TPCI, then APCI and data
        let tpdu = &body[HEADER_SIZE..];
        let (tpci_octet, apci, short_data, data) = match tpdu.get(1) {
            Some(&apci_byte) => (
                tpdu[0] & !APCI_HIGH_MASK,
                Some(Apci::from_bytes(tpdu[0], apci_byte)),
                extract_6bit_value(apci_byte),
                &tpdu[2..],
            ),
            None => (tpdu[0], None, 0, &tpdu[..0]),
        };
        let payload =
            heapless::Vec::from_slice(data).map_err(|_| KnxError::truncated_frame())?;

        Ok(Self {
            control,
            source,
            destination,
            hop_count: npci.hop_count(),
            tpci_octet,
            apci,
            short_data,
            payload,
            checksum: check,
        })
    }

    /// Encode the telegram as a TP1 frame, check octet included.
    ///
    /// Returns the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let len = self.frame_len();
        if buf.len() < len {
            return Err(KnxError::buffer_too_small());
        }

        buf[0] = self.control.raw();
        buf[1..3].copy_from_slice(&self.source.raw().to_be_bytes());
        buf[3..5].copy_from_slice(&self.destination.raw().to_be_bytes());
        buf[5] = Npci::new(self.destination.is_group(), self.hop_count, self.length_field()).raw();
        buf[6] = self.tpci_octet;

        if let Some(apci) = self.apci {
            buf[6] |= apci.high_bits();
            buf[7] = apci.low_bits() | (self.short_data & 0x3F);
            buf[8..8 + self.payload.len()].copy_from_slice(&self.payload);
        }

        buf[len - 1] = checksum(&buf[..len - 1]);
        Ok(len)
    }

    /// Encode into a [`RawFrame`].
    pub fn to_raw_frame(&self) -> Result<RawFrame> {
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buf)?;
        RawFrame::from_slice(&buf[..len])
    }

    /// Total frame length in bytes, check octet included
    #[inline]
    pub fn frame_len(&self) -> usize {
        MIN_FRAME_SIZE + usize::from(self.length_field())
    }

    fn length_field(&self) -> u8 {
        match self.apci {
            Some(_) => 1 + self.payload.len() as u8,
            None => 0,
        }
    }

    /// Raw control byte
    #[inline(always)]
    pub fn control_byte(&self) -> u8 {
        self.control.raw()
    }

    /// Control field
    #[inline(always)]
    pub fn control(&self) -> ControlField {
        self.control
    }

    /// Message priority
    #[inline(always)]
    pub fn priority(&self) -> Priority {
        self.control.priority()
    }

    /// Whether the frame is a bus repetition
    #[inline(always)]
    pub fn is_repeated(&self) -> bool {
        self.control.is_repeated()
    }

    /// Source individual address
    #[inline(always)]
    pub fn source(&self) -> IndividualAddress {
        self.source
    }

    /// Destination address
    #[inline(always)]
    pub fn destination(&self) -> Destination {
        self.destination
    }

    /// Raw 16-bit destination
    #[inline(always)]
    pub fn destination_raw(&self) -> u16 {
        self.destination.raw()
    }

    /// Get destination as group address (if applicable)
    #[inline]
    pub fn destination_group(&self) -> Option<GroupAddress> {
        match self.destination {
            Destination::Group(ga) => Some(ga),
            Destination::Individual(_) => None,
        }
    }

    /// Get destination as individual address (if applicable)
    #[inline]
    pub fn destination_individual(&self) -> Option<IndividualAddress> {
        match self.destination {
            Destination::Individual(ia) => Some(ia),
            Destination::Group(_) => None,
        }
    }

    /// Hop (routing) counter, 0-7
    #[inline(always)]
    pub fn hop_count(&self) -> u8 {
        self.hop_count
    }

    /// Transport control information
    #[inline(always)]
    pub fn tpci(&self) -> Tpci {
        Tpci::from_byte(self.tpci_octet)
    }

    /// Application service, absent when the TPDU is a bare TPCI octet
    #[inline(always)]
    pub fn apci(&self) -> Option<Apci> {
        self.apci
    }

    /// The 6 data bits of the APCI octet
    #[inline(always)]
    pub fn short_data(&self) -> u8 {
        self.short_data
    }

    /// Payload bytes following the APCI octet (0-14 bytes)
    #[inline(always)]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Check octet as received (or computed when built)
    #[inline(always)]
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Datapoint value bytes.
    ///
    /// Values of 6 bits or less travel in the APCI octet and have no payload;
    /// for those this returns the short data as a single byte.
    pub fn dpt_data(&self) -> &[u8] {
        if self.payload.is_empty() {
            core::slice::from_ref(&self.short_data)
        } else {
            &self.payload
        }
    }

    /// Check if this is a group value write
    #[inline(always)]
    pub fn is_group_write(&self) -> bool {
        matches!(self.apci, Some(Apci::GroupValueWrite))
    }

    /// Check if this is a group value read
    #[inline(always)]
    pub fn is_group_read(&self) -> bool {
        matches!(self.apci, Some(Apci::GroupValueRead))
    }

    /// Check if this is a group value response
    #[inline(always)]
    pub fn is_group_response(&self) -> bool {
        matches!(self.apci, Some(Apci::GroupValueResponse))
    }
}

/// Value carried by an outgoing group telegram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupData<'a> {
    /// Up to 6 bits packed into the APCI octet (DPT 1, 2, 3)
    Short(u8),
    /// Up to 14 bytes following the APCI octet
    Bytes(&'a [u8]),
}

/// Builder for outgoing telegrams.
///
/// # Examples
///
/// ```rust
/// use knx_tpuart::protocol::telegram::TelegramBuilder;
/// use knx_tpuart::{GroupAddress, IndividualAddress, Priority};
///
/// let source = IndividualAddress::new(1, 1, 250).unwrap();
/// let target = GroupAddress::new(0, 0, 1).unwrap();
/// let telegram = TelegramBuilder::group_read(source, target)
///     .priority(Priority::Normal)
///     .build()
///     .unwrap();
/// assert!(telegram.is_group_read());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TelegramBuilder<'a> {
    source: IndividualAddress,
    destination: Destination,
    priority: Priority,
    repeated: bool,
    hop_count: u8,
    apci: Apci,
    data: GroupData<'a>,
}

impl<'a> TelegramBuilder<'a> {
    /// Start a telegram for any destination and service
    pub fn new(source: IndividualAddress, destination: impl Into<Destination>, apci: Apci) -> Self {
        Self {
            source,
            destination: destination.into(),
            priority: Priority::Low,
            repeated: false,
            hop_count: DEFAULT_HOP_COUNT,
            apci,
            data: GroupData::Short(0),
        }
    }

    /// `A_GroupValue_Write` to `target`
    pub fn group_write(source: IndividualAddress, target: GroupAddress, data: GroupData<'a>) -> Self {
        Self::new(source, target, Apci::GroupValueWrite).data(data)
    }

    /// `A_GroupValue_Response` to `target`
    pub fn group_response(
        source: IndividualAddress,
        target: GroupAddress,
        data: GroupData<'a>,
    ) -> Self {
        Self::new(source, target, Apci::GroupValueResponse).data(data)
    }

    /// `A_GroupValue_Read` of `target`
    pub fn group_read(source: IndividualAddress, target: GroupAddress) -> Self {
        Self::new(source, target, Apci::GroupValueRead)
    }

    /// Set the value
    #[must_use]
    pub fn data(mut self, data: GroupData<'a>) -> Self {
        self.data = data;
        self
    }

    /// Set the priority (default low)
    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the hop count (default 6, clamped to 7)
    #[must_use]
    pub fn hop_count(mut self, hop_count: u8) -> Self {
        self.hop_count = hop_count.min(7);
        self
    }

    /// Mark the telegram as a repetition
    #[must_use]
    pub fn repeated(mut self, repeated: bool) -> Self {
        self.repeated = repeated;
        self
    }

    /// Build the telegram and compute its check octet.
    ///
    /// # Errors
    ///
    /// - `PayloadTooLarge` if byte data exceeds 14 bytes
    /// - `ValueOutOfRange` if short data does not fit in 6 bits
    pub fn build(self) -> Result<Telegram> {
        let (short_data, payload) = match self.data {
            GroupData::Short(value) if value > 0x3F => {
                return Err(KnxError::dpt_value_out_of_range());
            }
            GroupData::Short(value) => (value, heapless::Vec::new()),
            GroupData::Bytes(bytes) => (
                0,
                heapless::Vec::from_slice(bytes).map_err(|_| KnxError::payload_too_large())?,
            ),
        };

        let mut telegram = Telegram {
            control: ControlField::new(self.priority, self.repeated),
            source: self.source,
            destination: self.destination,
            hop_count: self.hop_count,
            tpci_octet: Tpci::UnnumberedData.to_byte(),
            apci: Some(self.apci),
            short_data,
            payload,
            checksum: 0,
        };

        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = telegram.encode(&mut buf)?;
        telegram.checksum = buf[len - 1];
        Ok(telegram)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Group write 1.1.1 -> 1/2/3, switch on
    const SWITCH_ON: [u8; 9] = [0xBC, 0x11, 0x01, 0x0A, 0x03, 0xE1, 0x00, 0x81, 0x3A];

    fn with_checksum(mut frame: heapless::Vec<u8, MAX_FRAME_SIZE>) -> heapless::Vec<u8, MAX_FRAME_SIZE> {
        let cs = checksum(&frame);
        frame.push(cs).unwrap();
        frame
    }

    #[test]
    fn test_checksum() {
        assert_eq!(checksum(&SWITCH_ON[..8]), 0x3A);
        assert_eq!(checksum(&[]), 0xFF);
    }

    #[test]
    fn test_decode_group_write_short() {
        let telegram = Telegram::decode(&SWITCH_ON).unwrap();
        assert_eq!(telegram.control_byte(), 0xBC);
        assert_eq!(telegram.source(), IndividualAddress::new(1, 1, 1).unwrap());
        assert_eq!(
            telegram.destination_group(),
            Some(GroupAddress::new(1, 2, 3).unwrap())
        );
        assert_eq!(telegram.hop_count(), 6);
        assert_eq!(telegram.tpci(), Tpci::UnnumberedData);
        assert!(telegram.is_group_write());
        assert_eq!(telegram.short_data(), 1);
        assert!(telegram.payload().is_empty());
        assert_eq!(telegram.dpt_data(), &[1]);
        assert_eq!(telegram.checksum(), 0x3A);
        assert_eq!(telegram.priority(), Priority::Low);
        assert!(!telegram.is_repeated());
    }

    #[test]
    fn test_decode_with_payload() {
        // Group response 1.1.5 -> 4/5/6 with a 2-byte float (21.5 °C = 0x0C33)
        let frame = with_checksum(
            heapless::Vec::from_slice(&[0xBC, 0x11, 0x05, 0x25, 0x06, 0xE3, 0x00, 0x40, 0x0C, 0x33])
                .unwrap(),
        );
        let telegram = Telegram::decode(&frame).unwrap();
        assert!(telegram.is_group_response());
        assert_eq!(telegram.payload(), &[0x0C, 0x33]);
        assert_eq!(telegram.dpt_data(), &[0x0C, 0x33]);
    }

    #[test]
    fn test_decode_bare_tpci() {
        // T_Connect to individual address 1.1.2, length field 0
        let frame = with_checksum(
            heapless::Vec::from_slice(&[0xB0, 0x11, 0x01, 0x11, 0x02, 0x60, 0x80]).unwrap(),
        );
        let telegram = Telegram::decode(&frame).unwrap();
        assert_eq!(telegram.apci(), None);
        assert_eq!(telegram.tpci(), Tpci::UnnumberedControl { control: 0 });
        assert_eq!(
            telegram.destination_individual(),
            Some(IndividualAddress::new(1, 1, 2).unwrap())
        );
        assert_eq!(telegram.priority(), Priority::System);
    }

    #[test]
    fn test_reencode_keeps_tpci_octet() {
        // T_Connect with sequence bits set, and a data packet with TPCI 0x04
        let connect = [0xB0, 0x11, 0x01, 0x11, 0x02, 0x60, 0x84, 0xA8];
        let data = with_checksum(
            heapless::Vec::from_slice(&[0xBC, 0x11, 0x01, 0x0A, 0x03, 0xE1, 0x04, 0x81]).unwrap(),
        );

        for frame in [connect.as_slice(), data.as_slice()] {
            let telegram = Telegram::decode(frame).unwrap();
            let mut buf = [0u8; MAX_FRAME_SIZE];
            let len = telegram.encode(&mut buf).unwrap();
            assert_eq!(&buf[..len], frame);
            assert_eq!(buf[len - 1], telegram.checksum());
        }

        let telegram = Telegram::decode(&data).unwrap();
        assert!(telegram.is_group_write());
        assert_eq!(telegram.short_data(), 1);
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        let mut frame = SWITCH_ON;
        frame[8] ^= 0x01;
        assert!(Telegram::decode(&frame).unwrap_err().is_checksum_mismatch());

        let mut frame = SWITCH_ON;
        frame[4] = 0x04;
        assert!(Telegram::decode(&frame).unwrap_err().is_checksum_mismatch());
    }

    #[test]
    fn test_decode_truncated() {
        assert!(Telegram::decode(&SWITCH_ON[..7]).unwrap_err().is_truncated_frame());
        assert!(Telegram::decode(&[]).unwrap_err().is_truncated_frame());

        // Length field claims 3 TPDU bytes more than present
        let mut frame = SWITCH_ON;
        frame[5] = 0xE4;
        assert!(Telegram::decode(&frame).unwrap_err().is_truncated_frame());
    }

    #[test]
    fn test_decode_invalid_control_field() {
        // Extended frame control byte with a valid check octet
        let frame = with_checksum(
            heapless::Vec::from_slice(&[0x3C, 0x11, 0x01, 0x0A, 0x03, 0xE1, 0x00, 0x81]).unwrap(),
        );
        let err = Telegram::decode(&frame).unwrap_err();
        assert!(matches!(err, KnxError::Decode(ref e) if e.is_invalid_control_field()));
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let mut bytes = [0u8; 12];
        bytes[..9].copy_from_slice(&SWITCH_ON);
        bytes[9..].copy_from_slice(&[0xBC, 0x11, 0x01]);
        let telegram = Telegram::decode(&bytes).unwrap();
        assert_eq!(telegram.frame_len(), 9);
    }

    #[test]
    fn test_encode_reproduces_frames() {
        let repeated_read = with_checksum(
            heapless::Vec::from_slice(&[0x9C, 0x12, 0x05, 0x2E, 0x07, 0xD1, 0x00, 0x00]).unwrap(),
        );
        let longest = with_checksum(
            heapless::Vec::from_slice(&[
                0xB4, 0xFF, 0xFF, 0xFF, 0xFF, 0xEF, 0x00, 0x80, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11,
                12, 13, 14,
            ])
            .unwrap(),
        );
        assert_eq!(longest.len(), MAX_FRAME_SIZE);

        for frame in [&SWITCH_ON[..], repeated_read.as_slice(), longest.as_slice()] {
            let telegram = Telegram::decode(frame).unwrap();
            let mut buf = [0u8; MAX_FRAME_SIZE];
            let len = telegram.encode(&mut buf).unwrap();
            assert_eq!(&buf[..len], frame);
        }
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let telegram = Telegram::decode(&SWITCH_ON).unwrap();
        let mut buf = [0u8; 8];
        let err = telegram.encode(&mut buf).unwrap_err();
        assert!(matches!(err, KnxError::Transport(ref e) if e.is_buffer_too_small()));
    }

    #[test]
    fn test_builder_group_write_short() {
        let source = IndividualAddress::new(1, 1, 1).unwrap();
        let target = GroupAddress::new(1, 2, 3).unwrap();
        let telegram = TelegramBuilder::group_write(source, target, GroupData::Short(1))
            .build()
            .unwrap();
        assert_eq!(telegram, Telegram::decode(&SWITCH_ON).unwrap());
    }

    #[test]
    fn test_builder_group_write_bytes() {
        let source = IndividualAddress::new(1, 1, 1).unwrap();
        let target = GroupAddress::new(1, 2, 3).unwrap();
        let telegram = TelegramBuilder::group_write(source, target, GroupData::Bytes(&[0x0C, 0x33]))
            .priority(Priority::Normal)
            .hop_count(9)
            .build()
            .unwrap();

        assert_eq!(telegram.control_byte(), 0xB4);
        assert_eq!(telegram.hop_count(), 7);
        assert_eq!(telegram.payload(), &[0x0C, 0x33]);
        assert_eq!(telegram.frame_len(), 11);

        let raw = telegram.to_raw_frame().unwrap();
        assert_eq!(raw.as_bytes()[5], 0xF3);
        assert_eq!(decode(&raw).unwrap(), telegram);
    }

    #[test]
    fn test_builder_group_read() {
        let source = IndividualAddress::new(1, 1, 1).unwrap();
        let target = GroupAddress::new(1, 2, 3).unwrap();
        let telegram = TelegramBuilder::group_read(source, target).build().unwrap();
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = telegram.encode(&mut buf).unwrap();
        assert_eq!(&buf[5..8], &[0xE1, 0x00, 0x00]);
        assert_eq!(len, 9);
    }

    #[test]
    fn test_builder_rejects_oversized_data() {
        let source = IndividualAddress::new(1, 1, 1).unwrap();
        let target = GroupAddress::new(1, 2, 3).unwrap();

        let err = TelegramBuilder::group_write(source, target, GroupData::Short(0x40))
            .build()
            .unwrap_err();
        assert!(matches!(err, KnxError::Dpt(ref e) if e.is_out_of_range()));

        let err = TelegramBuilder::group_write(source, target, GroupData::Bytes(&[0; 15]))
            .build()
            .unwrap_err();
        assert!(matches!(err, KnxError::Transport(_)));
    }
}
