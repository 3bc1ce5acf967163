//! Unified Logging Macros for knx-tpuart
//!
//! This module provides a unified logging interface that automatically
//! selects between `log::` and `defmt::` based on the active feature flags.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::knx_log;
//!
//! knx_log!(info, "Dispatching telegram for {}", addr);
//! knx_log!(debug, "Frame complete: {} bytes", n);
//! knx_log!(warn, "Partial frame dropped after {} ms", elapsed);
//! knx_log!(trace, "Skipping byte {}", byte);
//! ```
//!
//! # Feature Flags
//!
//! - `log` - Uses `log::` crate (host builds, USB serial debugging)
//! - `defmt` - Uses `defmt::` (more efficient for embedded)
//! - neither - arguments are type-checked and nothing is emitted
//!
//! Format strings stick to `{}` and `{:?}` so both back-ends accept them.

/// Unified logging macro - automatically selects log:: or defmt:: based on features
#[macro_export]
#[cfg(feature = "log")]
macro_rules! knx_log {
    (info, $($arg:tt)*) => { log::info!($($arg)*) };
    (debug, $($arg:tt)*) => { log::debug!($($arg)*) };
    (warn, $($arg:tt)*) => { log::warn!($($arg)*) };
    (error, $($arg:tt)*) => { log::error!($($arg)*) };
    (trace, $($arg:tt)*) => { log::trace!($($arg)*) };
}

#[macro_export]
#[cfg(all(feature = "defmt", not(feature = "log")))]
macro_rules! knx_log {
    (info, $($arg:tt)*) => { defmt::info!($($arg)*) };
    (debug, $($arg:tt)*) => { defmt::debug!($($arg)*) };
    (warn, $($arg:tt)*) => { defmt::warn!($($arg)*) };
    (error, $($arg:tt)*) => { defmt::error!($($arg)*) };
    (trace, $($arg:tt)*) => { defmt::trace!($($arg)*) };
}

#[macro_export]
#[cfg(not(any(feature = "defmt", feature = "log")))]
macro_rules! knx_log {
    ($level:ident, $($arg:tt)*) => {{
        if false {
            let _ = core::format_args!($($arg)*);
        }
    }};
}
