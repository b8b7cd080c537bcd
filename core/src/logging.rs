//! Tracing setup for hosts embedding the engine.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a compact subscriber at INFO, overridable with RUST_LOG.
pub fn init() -> bool {
    init_with_level("info")
}

/// Install a compact subscriber with `default_level` unless RUST_LOG says
/// otherwise. Returns false when a subscriber is already installed, which
/// happens when the host app initializes more than once.
pub fn init_with_level(default_level: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init()
        .is_ok()
}

/// Route logs into the test harness output.
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
