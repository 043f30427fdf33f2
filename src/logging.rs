//! Logging abstraction
//!
//! Unified logging macros that work across targets:
//! - Embedded (`embedded` feature): defmt over RTT
//! - Host (`std` feature): the `log` facade
//! - Neither: arguments are type-checked and discarded
//!
//! Format strings must stay within the subset both backends accept
//! (`{}` and `{:?}` placeholders).

/// Log informational message
macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "embedded")]
        ::defmt::info!($($arg)*);

        #[cfg(all(not(feature = "embedded"), feature = "std"))]
        ::log::info!($($arg)*);

        #[cfg(not(any(feature = "embedded", feature = "std")))]
        {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

/// Log warning message
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "embedded")]
        ::defmt::warn!($($arg)*);

        #[cfg(all(not(feature = "embedded"), feature = "std"))]
        ::log::warn!($($arg)*);

        #[cfg(not(any(feature = "embedded", feature = "std")))]
        {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

/// Log error message
macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "embedded")]
        ::defmt::error!($($arg)*);

        #[cfg(all(not(feature = "embedded"), feature = "std"))]
        ::log::error!($($arg)*);

        #[cfg(not(any(feature = "embedded", feature = "std")))]
        {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

/// Log debug message
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "embedded")]
        ::defmt::debug!($($arg)*);

        #[cfg(all(not(feature = "embedded"), feature = "std"))]
        ::log::debug!($($arg)*);

        #[cfg(not(any(feature = "embedded", feature = "std")))]
        {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}
