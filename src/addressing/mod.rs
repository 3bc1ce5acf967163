//! KNX addressing system.
//!
//! KNX uses two types of addresses:
//! - Individual addresses for physical devices (Area.Line.Device)
//! - Group addresses for logical grouping (Main/Middle/Sub or Main/Sub)
//!
//! Both are 16-bit values on the wire. The textual forms are parsed once, at
//! configuration time, and the rest of the driver only compares raw values.

pub mod group;
pub mod individual;

pub use group::GroupAddress;
pub use individual::IndividualAddress;

use crate::error::{KnxError, Result};

/// Split an address string into two or three decimal components.
///
/// Returns the components and how many were present. Empty components,
/// signs, whitespace and more than three parts are rejected.
pub(crate) fn split_components(text: &str, separator: char) -> Result<([u16; 3], usize)> {
    let mut parts = [0u16; 3];
    let mut count = 0;

    for part in text.split(separator) {
        if count == parts.len() {
            return Err(KnxError::invalid_address_format());
        }
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(KnxError::invalid_address_format());
        }
        parts[count] = part
            .parse::<u16>()
            .map_err(|_| KnxError::invalid_address_format())?;
        count += 1;
    }

    if count < 2 {
        return Err(KnxError::invalid_address_format());
    }

    Ok((parts, count))
}
