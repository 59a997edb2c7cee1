//! Logging shims. Forward to the `log` crate when the feature is enabled and
//! compile to nothing otherwise.

macro_rules! info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log")]
        {
            ::log::info!($($arg)*);
        }
        #[cfg(not(feature = "log"))]
        {
            if false {
                let _ = format_args!($($arg)*);
            }
        }
    }};
}

macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log")]
        {
            ::log::debug!($($arg)*);
        }
        #[cfg(not(feature = "log"))]
        {
            if false {
                let _ = format_args!($($arg)*);
            }
        }
    }};
}
