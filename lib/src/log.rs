// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Logging macros
//!
//! These forward to `tracing` when the `log` feature is enabled and expand to nothing otherwise.
//! Code in this crate must log through these macros rather than through `tracing` directly.

macro_rules! trace {
    ($($args:tt)*) => {
        #[cfg(feature = "log")]
        {
            ::__tracing_do_not_use_directly::trace!($($args)*);
        }
    };
}

macro_rules! debug {
    ($($args:tt)*) => {
        #[cfg(feature = "log")]
        {
            ::__tracing_do_not_use_directly::debug!($($args)*);
        }
    };
}

macro_rules! info {
    ($($args:tt)*) => {
        #[cfg(feature = "log")]
        {
            ::__tracing_do_not_use_directly::info!($($args)*);
        }
    };
}

macro_rules! warning {
    ($($args:tt)*) => {
        #[cfg(feature = "log")]
        {
            ::__tracing_do_not_use_directly::warn!($($args)*);
        }
    };
}

pub(crate) use debug;
pub(crate) use info;
pub(crate) use trace;
pub(crate) use warning;
