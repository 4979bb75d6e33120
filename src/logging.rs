//! Logging setup for the solver executables.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// The level filter comes from `RUST_LOG` and defaults to `info`.
/// Diagnostics go to stderr; stdout carries nothing but the output
/// document.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
