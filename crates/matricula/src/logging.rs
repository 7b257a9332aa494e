//! Diagnostics for the store and the CLI.
//!
//! Everything under the `matricula` target is filtered by [`Verbosity`]
//! unless `RUST_LOG` is set. Output goes to stderr; stdout is reserved for
//! command results such as `list --json`.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const TARGET: &str = "matricula";

/// How much the binary reports about what the store is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only (`-q`).
    Quiet,
    /// Creates, updates, deletes and regenerated artifacts.
    #[default]
    Normal,
    /// Also file reads and writes (`-v`).
    Verbose,
    /// Everything (`-vv`).
    Trace,
}

impl Verbosity {
    /// Most detailed level that is still shown.
    #[must_use]
    pub fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[must_use]
    pub fn directive(self) -> String {
        format!("{TARGET}={}", self.level())
    }
}

/// Install the global subscriber. Later calls are no-ops.
///
/// ```no_run
/// use matricula::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

/// Warnings and errors only, captured by the test harness.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
