//! Error types for KNX TP-UART operations following M-ERRORS-CANONICAL-STRUCTS guideline.
//!
//! Every error belongs to a category (`Frame`, `Decode`, `Addressing`, ...)
//! carrying a private kind, a captured backtrace when `std` is enabled, and
//! `is_*` helpers for callers that need to branch on the cause.

use core::fmt;

#[cfg(feature = "std")]
use std::backtrace::Backtrace;

/// Result type alias for KNX operations.
pub type Result<T> = core::result::Result<T, KnxError>;

// =============================================================================
// Error Kind Enums (Internal)
// =============================================================================

/// Frame reassembly error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum FrameErrorKind {
    Timeout,
}

/// Telegram decode error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum DecodeErrorKind {
    ChecksumMismatch,
    TruncatedFrame,
    InvalidControlField,
}

/// Addressing error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum AddressingErrorKind {
    InvalidAddressFormat,
    OutOfRange,
}

/// Configuration error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum ConfigErrorKind {
    TooManyListenAddresses,
    InvalidSerialTimeout,
}

/// Transport error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum TransportErrorKind {
    WriteFailed,
    BufferTooSmall,
    PayloadTooLarge,
}

/// DPT error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum DptErrorKind {
    InvalidData,
    ValueOutOfRange,
}

// =============================================================================
// Main Error Type
// =============================================================================

/// KNX driver error types.
///
/// This is the main error type returned by all fallible operations of the
/// crate. Runtime per-frame errors (`Frame`, `Decode`) are recovered inside
/// the dispatch loop; `Addressing` and `Config` errors reject a configuration.
#[derive(Debug)]
pub enum KnxError {
    /// Partial frame abandoned by the reader
    Frame(FrameError),
    /// Frame rejected while decoding a telegram
    Decode(DecodeError),
    /// Malformed or out-of-range address
    Addressing(AddressingError),
    /// Configuration rejected
    Config(ConfigError),
    /// UART write or buffer errors
    Transport(TransportError),
    /// Datapoint Type errors (encoding, decoding)
    Dpt(DptError),
}

// =============================================================================
// Structured Error Types
// =============================================================================

macro_rules! error_struct {
    ($(#[$doc:meta])* $name:ident, $kind:ty) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name {
            kind: $kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace,
        }

        impl $name {
            pub(crate) fn new(kind: $kind) -> Self {
                Self {
                    kind,
                    #[cfg(feature = "std")]
                    backtrace: Backtrace::capture(),
                }
            }

            /// Backtrace captured where the error was raised
            #[cfg(feature = "std")]
            pub fn backtrace(&self) -> &Backtrace {
                &self.backtrace
            }
        }
    };
}

error_struct!(
    /// Frame reassembly error with optional backtrace
    FrameError,
    FrameErrorKind
);
error_struct!(
    /// Telegram decode error with optional backtrace
    DecodeError,
    DecodeErrorKind
);
error_struct!(
    /// Addressing error with optional backtrace
    AddressingError,
    AddressingErrorKind
);
error_struct!(
    /// Configuration error with optional backtrace
    ConfigError,
    ConfigErrorKind
);
error_struct!(
    /// Transport error with optional backtrace
    TransportError,
    TransportErrorKind
);
error_struct!(
    /// DPT error with optional backtrace
    DptError,
    DptErrorKind
);

impl FrameError {
    /// Check if a partial frame timed out
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, FrameErrorKind::Timeout)
    }
}

impl DecodeError {
    /// Check if the check octet did not match
    pub fn is_checksum_mismatch(&self) -> bool {
        matches!(self.kind, DecodeErrorKind::ChecksumMismatch)
    }

    /// Check if the frame was shorter than announced
    pub fn is_truncated_frame(&self) -> bool {
        matches!(self.kind, DecodeErrorKind::TruncatedFrame)
    }

    /// Check if the control field was not a standard data frame
    pub fn is_invalid_control_field(&self) -> bool {
        matches!(self.kind, DecodeErrorKind::InvalidControlField)
    }
}

impl AddressingError {
    /// Check if the address text could not be parsed
    pub fn is_invalid_format(&self) -> bool {
        matches!(self.kind, AddressingErrorKind::InvalidAddressFormat)
    }

    /// Check if address is out of range
    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind, AddressingErrorKind::OutOfRange)
    }
}

impl ConfigError {
    /// Check if the listen address set overflowed
    pub fn is_too_many_listen_addresses(&self) -> bool {
        matches!(self.kind, ConfigErrorKind::TooManyListenAddresses)
    }

    /// Check if the serial timeout was rejected
    pub fn is_invalid_serial_timeout(&self) -> bool {
        matches!(self.kind, ConfigErrorKind::InvalidSerialTimeout)
    }
}

impl TransportError {
    /// Check if the UART refused the write
    pub fn is_write_failed(&self) -> bool {
        matches!(self.kind, TransportErrorKind::WriteFailed)
    }

    /// Check if buffer is too small
    pub fn is_buffer_too_small(&self) -> bool {
        matches!(self.kind, TransportErrorKind::BufferTooSmall)
    }
}

impl DptError {
    /// Check if value is out of range
    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind, DptErrorKind::ValueOutOfRange)
    }
}

// =============================================================================
// Convenience Constructors for KnxError
// =============================================================================

impl KnxError {
    // Frame errors
    pub(crate) fn frame_timeout() -> Self {
        Self::Frame(FrameError::new(FrameErrorKind::Timeout))
    }

    // Decode errors
    pub(crate) fn checksum_mismatch() -> Self {
        Self::Decode(DecodeError::new(DecodeErrorKind::ChecksumMismatch))
    }

    pub(crate) fn truncated_frame() -> Self {
        Self::Decode(DecodeError::new(DecodeErrorKind::TruncatedFrame))
    }

    pub(crate) fn invalid_control_field() -> Self {
        Self::Decode(DecodeError::new(DecodeErrorKind::InvalidControlField))
    }

    // Addressing errors
    pub(crate) fn invalid_address_format() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::InvalidAddressFormat))
    }

    pub(crate) fn address_out_of_range() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::OutOfRange))
    }

    // Configuration errors
    pub(crate) fn too_many_listen_addresses() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::TooManyListenAddresses))
    }

    pub(crate) fn invalid_serial_timeout() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::InvalidSerialTimeout))
    }

    // Transport errors
    pub(crate) fn write_failed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::WriteFailed))
    }

    pub(crate) fn buffer_too_small() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::BufferTooSmall))
    }

    pub(crate) fn payload_too_large() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::PayloadTooLarge))
    }

    // DPT errors
    pub(crate) fn invalid_dpt_data() -> Self {
        Self::Dpt(DptError::new(DptErrorKind::InvalidData))
    }

    pub(crate) fn dpt_value_out_of_range() -> Self {
        Self::Dpt(DptError::new(DptErrorKind::ValueOutOfRange))
    }

    // Queries spanning the categories, used by callers and tests
    /// A partial frame was abandoned after the serial timeout
    pub fn is_frame_timeout(&self) -> bool {
        matches!(self, Self::Frame(e) if e.is_timeout())
    }

    /// The frame check octet did not match
    pub fn is_checksum_mismatch(&self) -> bool {
        matches!(self, Self::Decode(e) if e.is_checksum_mismatch())
    }

    /// The frame was shorter than the minimum or than its length field
    pub fn is_truncated_frame(&self) -> bool {
        matches!(self, Self::Decode(e) if e.is_truncated_frame())
    }

    /// An address string could not be parsed
    pub fn is_invalid_address_format(&self) -> bool {
        matches!(self, Self::Addressing(e) if e.is_invalid_format())
    }
}

// =============================================================================
// Display Implementation
// =============================================================================

impl fmt::Display for KnxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnxError::Frame(e) => write!(f, "Frame error: {:?}", e.kind),
            KnxError::Decode(e) => write!(f, "Decode error: {:?}", e.kind),
            KnxError::Addressing(e) => write!(f, "Addressing error: {:?}", e.kind),
            KnxError::Config(e) => write!(f, "Configuration error: {:?}", e.kind),
            KnxError::Transport(e) => write!(f, "Transport error: {:?}", e.kind),
            KnxError::Dpt(e) => write!(f, "DPT error: {:?}", e.kind),
        }
    }
}

// Backtraces can't be formatted by defmt, so only the kind goes over the wire
#[cfg(feature = "defmt")]
impl defmt::Format for KnxError {
    fn format(&self, f: defmt::Formatter<'_>) {
        match self {
            KnxError::Frame(e) => defmt::write!(f, "Frame error: {}", e.kind),
            KnxError::Decode(e) => defmt::write!(f, "Decode error: {}", e.kind),
            KnxError::Addressing(e) => defmt::write!(f, "Addressing error: {}", e.kind),
            KnxError::Config(e) => defmt::write!(f, "Configuration error: {}", e.kind),
            KnxError::Transport(e) => defmt::write!(f, "Transport error: {}", e.kind),
            KnxError::Dpt(e) => defmt::write!(f, "DPT error: {}", e.kind),
        }
    }
}

// Implement std::error::Error for std-based applications
#[cfg(feature = "std")]
impl std::error::Error for KnxError {}
