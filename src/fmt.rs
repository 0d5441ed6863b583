//! Logging macros
//!
//! Forward to `defmt` on the device and to the `log` facade on the host.
//! Without either feature the macros expand to nothing.

#![allow(unused_macros)]

macro_rules! trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "embedded")]
        defmt::trace!($($arg)*);
        #[cfg(all(feature = "std", not(feature = "embedded")))]
        log::trace!($($arg)*);
    }};
}

macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "embedded")]
        defmt::debug!($($arg)*);
        #[cfg(all(feature = "std", not(feature = "embedded")))]
        log::debug!($($arg)*);
    }};
}

macro_rules! info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "embedded")]
        defmt::info!($($arg)*);
        #[cfg(all(feature = "std", not(feature = "embedded")))]
        log::info!($($arg)*);
    }};
}

macro_rules! warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "embedded")]
        defmt::warn!($($arg)*);
        #[cfg(all(feature = "std", not(feature = "embedded")))]
        log::warn!($($arg)*);
    }};
}
