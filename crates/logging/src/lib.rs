//! ClaimCraft Logging
//!
//! `tracing-subscriber` setup shared by the binary and integration tests.
//! `RUST_LOG` always wins; otherwise everything logs at `info` and the
//! `claimcraft` crates log at the chosen [`LogLevel`].

use std::fmt;

use tracing_subscriber::{fmt as fmt_layer, prelude::*, EnvFilter};

pub use tracing_subscriber::util::TryInitError;

/// Verbosity of the `claimcraft` crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_directive(level: LogLevel) -> String {
    format!("info,claimcraft={}", level)
}

fn filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(level)))
}

/// Install the global subscriber.
///
/// Panics if one is already installed; use [`try_init`] where that can
/// happen (tests).
pub fn init(level: LogLevel) {
    tracing_subscriber::registry()
        .with(fmt_layer::layer())
        .with(filter(level))
        .init();
}

/// Install the global subscriber unless one already exists.
pub fn try_init(level: LogLevel) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(fmt_layer::layer())
        .with(filter(level))
        .try_init()
}
