//! Diagnostics setup for clients.
//!
//! The library only emits `tracing` events. A client calls [`init`] once to
//! print them on stderr, filtered by `STICKY_LOG` when set.

use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

pub const LOG_ENV: &str = "STICKY_LOG";

/// Default filter directive: warnings only, or everything from this crate
/// when `verbose` is set.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "warn,joplin_sticky=debug"
    } else {
        "warn"
    }
}

/// Installs the global subscriber. Calling it twice is harmless.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
