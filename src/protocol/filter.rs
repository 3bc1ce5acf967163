//! Group address filtering.
//!
//! The listen set is kept sorted so membership is a binary search. It only
//! grows; addresses are added at configuration time.

use crate::addressing::GroupAddress;
use crate::error::{KnxError, Result};
use crate::protocol::constants::MAX_LISTEN_GROUP_ADDRESSES;
use crate::protocol::telegram::{Destination, Telegram};

/// Sorted, bounded set of group addresses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GroupAddressSet {
    addresses: heapless::Vec<GroupAddress, MAX_LISTEN_GROUP_ADDRESSES>,
}

impl GroupAddressSet {
    /// Create an empty set
    pub const fn new() -> Self {
        Self {
            addresses: heapless::Vec::new(),
        }
    }

    /// Insert an address, keeping the set sorted.
    ///
    /// Returns `false` if the address was already present.
    ///
    /// # Errors
    ///
    /// Returns `TooManyListenAddresses` when a new address does not fit.
    pub fn insert(&mut self, address: GroupAddress) -> Result<bool> {
        match self.addresses.binary_search(&address) {
            Ok(_) => Ok(false),
            Err(index) => self
                .addresses
                .insert(index, address)
                .map(|()| true)
                .map_err(|_| KnxError::too_many_listen_addresses()),
        }
    }

    /// Membership test
    #[inline]
    pub fn contains(&self, address: GroupAddress) -> bool {
        self.addresses.binary_search(&address).is_ok()
    }

    /// Check if telegrams to `address` pass the filter.
    ///
    /// An empty set admits every group address.
    #[inline]
    pub fn admits(&self, address: GroupAddress) -> bool {
        self.is_empty() || self.contains(address)
    }

    /// Number of addresses
    #[inline]
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// True if no address was added
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Addresses in ascending order
    pub fn as_slice(&self) -> &[GroupAddress] {
        &self.addresses
    }

    /// Iterate in ascending order
    pub fn iter(&self) -> core::slice::Iter<'_, GroupAddress> {
        self.addresses.iter()
    }
}

impl<'a> IntoIterator for &'a GroupAddressSet {
    type Item = &'a GroupAddress;
    type IntoIter = core::slice::Iter<'a, GroupAddress>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Decide whether a telegram is delivered to the application.
///
/// An empty set accepts every group telegram. Telegrams addressed to an
/// individual address are never accepted.
pub fn accepts(telegram: &Telegram, set: &GroupAddressSet) -> bool {
    match telegram.destination() {
        Destination::Group(ga) => set.admits(ga),
        Destination::Individual(_) => false,
    }
}
