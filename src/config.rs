//! Component configuration.
//!
//! [`ComponentConfig`] holds the configuration exactly as written by the
//! user: address strings, a timeout and a flag. [`ComponentConfig::validate`]
//! is a pure function turning it into a [`ValidatedConfig`] with parsed
//! addresses, which is what the dispatch component is built from.
//!
//! With the `serde` feature the struct deserialises from the usual keys:
//!
//! ```yaml
//! use_address: 1.1.250
//! listen_group_address:
//!   - 1/2/3
//!   - 1/2/4
//! serial_timeout: 1000
//! ```
//!
//! It can also be read from `KEY=VALUE` lines, which is convenient for a
//! configuration text embedded in firmware:
//!
//! ```rust
//! use knx_tpuart::config::ComponentConfig;
//!
//! const CONFIG: &str = r"
//! USE_ADDRESS=1.1.250
//! LISTEN_GROUP_ADDRESS=1/2/3
//! LISTEN_GROUP_ADDRESS=1/2/4
//! SERIAL_TIMEOUT=500
//! ";
//!
//! let validated = ComponentConfig::from_env_text(CONFIG).unwrap().validate().unwrap();
//! assert_eq!(validated.listen_group_addresses().len(), 2);
//! assert_eq!(validated.serial_timeout_ms(), 500);
//! ```

use crate::addressing::{GroupAddress, IndividualAddress};
use crate::error::{KnxError, Result};
use crate::protocol::constants::DEFAULT_SERIAL_TIMEOUT_MS;
use crate::protocol::filter::GroupAddressSet;

/// Longest accepted address string ("15.15.255", "31/7/255" fit easily)
pub const MAX_ADDRESS_TEXT_LEN: usize = 16;

/// Listen entries a configuration can hold before validation.
///
/// Larger than the listen set so duplicates are tolerated; validation
/// rejects more than 16 distinct addresses.
pub const MAX_CONFIG_LISTEN_ENTRIES: usize = 32;

/// Address string as written in the configuration
pub type AddressText = heapless::String<MAX_ADDRESS_TEXT_LEN>;

fn default_serial_timeout() -> u32 {
    DEFAULT_SERIAL_TIMEOUT_MS
}

fn default_acknowledge() -> bool {
    true
}

/// Unvalidated configuration inputs
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentConfig {
    /// This device's individual address, `area.line.device`
    pub use_address: AddressText,
    /// Group addresses to dispatch; empty means all
    #[cfg_attr(feature = "serde", serde(default))]
    pub listen_group_address: heapless::Vec<AddressText, MAX_CONFIG_LISTEN_ENTRIES>,
    /// Partial frame timeout in milliseconds
    #[cfg_attr(feature = "serde", serde(default = "default_serial_timeout"))]
    pub serial_timeout: u32,
    /// Answer received frames with `U_AckInformation`
    #[cfg_attr(feature = "serde", serde(default = "default_acknowledge"))]
    pub acknowledge: bool,
}

impl ComponentConfig {
    /// Configuration with defaults for everything but the device address.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAddressFormat` if the text does not fit.
    pub fn new(use_address: &str) -> Result<Self> {
        Ok(Self {
            use_address: address_text(use_address)?,
            listen_group_address: heapless::Vec::new(),
            serial_timeout: default_serial_timeout(),
            acknowledge: default_acknowledge(),
        })
    }

    /// Append a listen group address string.
    ///
    /// The text is checked when the configuration is validated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAddressFormat` if the text does not fit and
    /// `TooManyListenAddresses` if the entry list is full.
    pub fn with_listen_group_address(mut self, address: &str) -> Result<Self> {
        self.push_listen_group_address(address)?;
        Ok(self)
    }

    /// Set the serial timeout in milliseconds
    #[must_use]
    pub fn with_serial_timeout(mut self, timeout_ms: u32) -> Self {
        self.serial_timeout = timeout_ms;
        self
    }

    /// Enable or disable `U_AckInformation` replies
    #[must_use]
    pub fn with_acknowledge(mut self, acknowledge: bool) -> Self {
        self.acknowledge = acknowledge;
        self
    }

    fn push_listen_group_address(&mut self, address: &str) -> Result<()> {
        let text = address_text(address)?;
        self.listen_group_address
            .push(text)
            .map_err(|_| KnxError::too_many_listen_addresses())
    }

    /// Read `KEY=VALUE` lines.
    ///
    /// Keys: `USE_ADDRESS` (required), `LISTEN_GROUP_ADDRESS` (repeatable),
    /// `SERIAL_TIMEOUT`, `ACKNOWLEDGE` (`true`/`false`). Blank lines and
    /// lines starting with `#` are skipped, unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// - `InvalidAddressFormat` if `USE_ADDRESS` is missing or too long
    /// - `InvalidSerialTimeout` if `SERIAL_TIMEOUT` is not a number
    pub fn from_env_text(text: &str) -> Result<Self> {
        let mut use_address = None;
        let mut config_timeout = None;
        let mut acknowledge = None;
        let mut listen: heapless::Vec<&str, MAX_CONFIG_LISTEN_ENTRIES> = heapless::Vec::new();

        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "USE_ADDRESS" => use_address = Some(value),
                "LISTEN_GROUP_ADDRESS" => listen
                    .push(value)
                    .map_err(|_| KnxError::too_many_listen_addresses())?,
                "SERIAL_TIMEOUT" => {
                    config_timeout =
                        Some(value.parse::<u32>().map_err(|_| KnxError::invalid_serial_timeout())?);
                }
                "ACKNOWLEDGE" => acknowledge = Some(value.eq_ignore_ascii_case("true")),
                _ => {}
            }
        }

        let mut config = Self::new(use_address.ok_or_else(KnxError::invalid_address_format)?)?;
        for address in listen {
            config.push_listen_group_address(address)?;
        }
        if let Some(timeout_ms) = config_timeout {
            config.serial_timeout = timeout_ms;
        }
        if let Some(acknowledge) = acknowledge {
            config.acknowledge = acknowledge;
        }
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// - `InvalidAddressFormat` for a malformed `use_address` or listen entry
    /// - `TooManyListenAddresses` for more than 16 distinct listen addresses
    /// - `InvalidSerialTimeout` for a zero timeout
    pub fn validate(&self) -> Result<ValidatedConfig> {
        validate(self)
    }
}

fn address_text(text: &str) -> Result<AddressText> {
    let mut out = AddressText::new();
    out.push_str(text.trim())
        .map_err(|_| KnxError::invalid_address_format())?;
    Ok(out)
}

/// Validate `config` into the form the dispatch component consumes.
///
/// Pure: no I/O, no logging.
pub fn validate(config: &ComponentConfig) -> Result<ValidatedConfig> {
    let use_address: IndividualAddress = config.use_address.parse()?;

    let mut listen = GroupAddressSet::new();
    for text in &config.listen_group_address {
        let address: GroupAddress = text.parse()?;
        listen.insert(address)?;
    }

    if config.serial_timeout == 0 {
        return Err(KnxError::invalid_serial_timeout());
    }

    Ok(ValidatedConfig {
        use_address,
        listen,
        serial_timeout_ms: config.serial_timeout,
        acknowledge: config.acknowledge,
    })
}

/// Configuration with every address parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    use_address: IndividualAddress,
    listen: GroupAddressSet,
    serial_timeout_ms: u32,
    acknowledge: bool,
}

impl ValidatedConfig {
    /// This device's individual address
    pub fn use_address(&self) -> IndividualAddress {
        self.use_address
    }

    /// Sorted listen set
    pub fn listen_group_addresses(&self) -> &GroupAddressSet {
        &self.listen
    }

    /// Partial frame timeout
    pub fn serial_timeout_ms(&self) -> u32 {
        self.serial_timeout_ms
    }

    /// Whether received frames are acknowledged
    pub fn acknowledge(&self) -> bool {
        self.acknowledge
    }

    pub(crate) fn into_parts(self) -> (IndividualAddress, GroupAddressSet, u32, bool) {
        (
            self.use_address,
            self.listen,
            self.serial_timeout_ms,
            self.acknowledge,
        )
    }
}
