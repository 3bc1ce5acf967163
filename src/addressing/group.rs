//! KNX Group Address implementation.
//!
//! Group addresses represent logical groupings of devices for functional control.
//! Two formats are supported:
//! - 2-level: Main/Sub (e.g., 1/234)
//! - 3-level: Main/Middle/Sub (e.g., 1/2/3) - most common
//!
//! Internally stored as 16 bits:
//! - Main: 5 bits (0-31)
//! - Middle: 3 bits (0-7)
//! - Sub: 8 bits (0-255)

use crate::addressing::split_components;
use crate::error::{KnxError, Result};
use core::fmt;

/// KNX Group Address
///
/// Used for logical grouping of devices and functions. The listen set of the
/// dispatch component holds these.
///
/// # Examples
///
/// ```
/// use knx_tpuart::GroupAddress;
///
/// let addr = GroupAddress::new(1, 2, 3).unwrap();
/// assert_eq!(u16::from(addr), 0x0A03);
///
/// let addr: GroupAddress = "1/2/3".parse().unwrap();
/// assert_eq!(addr.sub(), 3);
///
/// assert!("bad-format".parse::<GroupAddress>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct GroupAddress {
    raw: u16,
}

impl GroupAddress {
    /// Maximum main group value (5 bits)
    pub const MAX_MAIN: u8 = 31;
    /// Maximum middle group value (3 bits)
    pub const MAX_MIDDLE: u8 = 7;
    /// Maximum sub value for 2-level format (11 bits)
    pub const MAX_SUB_2LEVEL: u16 = 2047;

    /// Broadcast group address 0/0/0
    pub const BROADCAST: Self = Self { raw: 0 };

    /// Create a new 3-level Group Address (Main/Middle/Sub).
    ///
    /// # Errors
    ///
    /// Returns an out-of-range addressing error if main > 31 or middle > 7.
    pub fn new(main: u8, middle: u8, sub: u8) -> Result<Self> {
        if main > Self::MAX_MAIN || middle > Self::MAX_MIDDLE {
            return Err(KnxError::address_out_of_range());
        }

        let raw = (u16::from(main) << 11) | (u16::from(middle) << 8) | u16::from(sub);
        Ok(Self { raw })
    }

    /// Create a new 2-level Group Address (Main/Sub).
    ///
    /// # Errors
    ///
    /// Returns an out-of-range addressing error if main > 31 or sub > 2047.
    pub fn new_2level(main: u8, sub: u16) -> Result<Self> {
        if main > Self::MAX_MAIN || sub > Self::MAX_SUB_2LEVEL {
            return Err(KnxError::address_out_of_range());
        }

        Ok(Self {
            raw: (u16::from(main) << 11) | sub,
        })
    }

    /// Get the raw u16 representation of the address.
    #[inline(always)]
    pub const fn raw(self) -> u16 {
        self.raw
    }

    /// Get the main group component (0-31).
    #[inline(always)]
    pub const fn main(self) -> u8 {
        ((self.raw >> 11) & 0x1F) as u8
    }

    /// Get the middle group component for 3-level format (0-7).
    #[inline(always)]
    pub const fn middle(self) -> u8 {
        ((self.raw >> 8) & 0x07) as u8
    }

    /// Get the sub group component for 3-level format (0-255).
    #[inline(always)]
    pub const fn sub(self) -> u8 {
        (self.raw & 0xFF) as u8
    }

    /// Get the sub group component for 2-level format (0-2047).
    #[inline(always)]
    pub const fn sub_2level(self) -> u16 {
        self.raw & 0x07FF
    }

    /// Format as 3-level string without allocation.
    pub fn to_heapless(&self) -> heapless::String<16> {
        use core::fmt::Write;
        let mut s = heapless::String::new();
        // 9 characters at most ("31/7/255"), always fits
        let _ = write!(s, "{self}");
        s
    }
}

impl From<u16> for GroupAddress {
    #[inline(always)]
    fn from(raw: u16) -> Self {
        Self { raw }
    }
}

impl From<GroupAddress> for u16 {
    #[inline(always)]
    fn from(addr: GroupAddress) -> u16 {
        addr.raw
    }
}

impl fmt::Display for GroupAddress {
    /// Format as 3-level address by default
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.main(), self.middle(), self.sub())
    }
}

impl core::str::FromStr for GroupAddress {
    type Err = KnxError;

    /// Parse `main/middle/sub` or `main/sub`.
    ///
    /// Any text that is not a valid group address, including out-of-range
    /// components, is reported as an invalid address format.
    fn from_str(s: &str) -> Result<Self> {
        let (parts, count) = split_components(s, '/')?;
        let main = u8::try_from(parts[0]).map_err(|_| KnxError::invalid_address_format())?;

        let parsed = if count == 3 {
            let middle = u8::try_from(parts[1]).map_err(|_| KnxError::invalid_address_format())?;
            let sub = u8::try_from(parts[2]).map_err(|_| KnxError::invalid_address_format())?;
            Self::new(main, middle, sub)
        } else {
            Self::new_2level(main, parts[1])
        };

        parsed.map_err(|_| KnxError::invalid_address_format())
    }
}
