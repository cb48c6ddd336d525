//! Logging macros that optionally forward to the `log` crate.
//!
//! Without the `logging` feature the arguments are only borrowed, so call
//! sites cost nothing and don't trigger unused-variable warnings.

macro_rules! emit {
    ($level:ident, $fmt:literal $(, $($arg:expr),* $(,)?)?) => {
        #[cfg(feature = "logging")]
        ::log::$level!(target: "mosquito_nr", $fmt $(, $($arg),*)?);
        #[cfg(not(feature = "logging"))]
        { $($(let _ = &$arg;)*)? }
    };
}

macro_rules! ldebug {
    ($($tokens:tt)*) => { emit!(debug, $($tokens)*) };
}

macro_rules! ltrace {
    ($($tokens:tt)*) => { emit!(trace, $($tokens)*) };
}

macro_rules! lwarn {
    ($($tokens:tt)*) => { emit!(warn, $($tokens)*) };
}
